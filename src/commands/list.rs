use serde::Serialize;

use crate::scenarios::catalog;

#[derive(Debug, Serialize)]
pub struct ListResult {
    pub scenarios: Vec<ScenarioSummary>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub description: String,
    pub tracker: Option<String>,
}

pub fn cmd_list() -> ListResult {
    let scenarios = catalog()
        .into_iter()
        .map(|s| ScenarioSummary {
            id: s.id.to_string(),
            description: s.description.to_string(),
            tracker: s.tracker.map(str::to_string),
        })
        .collect();
    ListResult { scenarios }
}

pub fn format_list_human(result: &ListResult) -> String {
    let id_width = result
        .scenarios
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0)
        .max(2);

    let mut lines = Vec::new();
    lines.push(format!("{:<id_width$}  {:<10}  DESCRIPTION", "ID", "TRACKER"));
    for scenario in &result.scenarios {
        lines.push(format!(
            "{:<id_width$}  {:<10}  {}",
            scenario.id,
            scenario.tracker.as_deref().unwrap_or("-"),
            scenario.description
        ));
    }
    lines.join("\n")
}
