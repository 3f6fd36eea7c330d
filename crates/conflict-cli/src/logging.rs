//! Logging setup using the tracing ecosystem.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CRATES: [&str; 5] = [
    "conflict",
    "conflict_core",
    "conflict_db",
    "conflict_export",
    "conflict_fetch",
];

/// Default filter directives: `level` for every workspace crate.
pub fn default_directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber. Logs go to stderr so results on stdout
/// stay pipeable.
///
/// Precedence: `RUST_LOG`, then the configured filter, then
/// [`default_directives`].
pub fn init_logging(verbose: bool, configured: Option<&str>) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        configured
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(default_directives(level)))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose);

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let directives = default_directives("info");
        assert!(directives.starts_with("conflict=info,"));
        assert!(directives.contains("conflict_db=info"));
        assert_eq!(directives.split(',').count(), CRATES.len());
    }
}
