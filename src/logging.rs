//! Tracing setup. Logs go to stderr so `--json` output on stdout stays clean.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins when set; otherwise `-v` flags pick the level.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "stemcell_smoke=warn",
        1 => "stemcell_smoke=info",
        2 => "stemcell_smoke=debug",
        _ => "stemcell_smoke=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_directive(0), "stemcell_smoke=warn");
        assert_eq!(default_directive(2), "stemcell_smoke=debug");
        assert_eq!(default_directive(9), "stemcell_smoke=trace");
    }
}
