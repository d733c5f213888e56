/// Result structs for command output. Commands return these instead of printing
/// directly; main.rs formats them as human-readable or JSON based on --json.
mod exec;
mod list;
mod run;

pub use exec::*;
pub use list::*;
pub use run::*;
