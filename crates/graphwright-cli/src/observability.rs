// Logging initialization for the command line binary.
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<(), TryInitError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    // Logs go to stderr so SDL and JSON output can be piped.
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_the_existing_subscriber() {
        let _ = init_tracing("warn");
        let err = init_tracing("debug").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
