//! Diagnostic logging setup.
//!
//! Styled output for the operator goes through [`crate::output`]; this only
//! configures `tracing`, which writes to stderr.

use tracing_subscriber::EnvFilter;

/// Default filter for a given verbosity.
pub fn default_filter(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "off",
        (false, 0) => "error",
        (false, 1) => "rewind_migrate=debug,rewind_sqlite=debug,rewind_cli=debug,warn",
        (false, _) => "rewind_migrate=trace,rewind_sqlite=trace,rewind_cli=trace,info",
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the flags.
pub fn init(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose > 1)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(3, true), "off");
        assert_eq!(default_filter(0, false), "error");
        assert!(default_filter(1, false).contains("rewind_migrate=debug"));
        assert!(default_filter(2, false).contains("rewind_sqlite=trace"));
    }
}
