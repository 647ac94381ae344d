//! Log output for the command line tool

use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "LCM_GEN_LOG";

/// Filter level for a `-v` count, falling back to the configured level
pub fn level_for(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install a stderr fmt subscriber.
///
/// `LCM_GEN_LOG` wins over `default_level`. Calling this more than once is
/// harmless; later calls leave the first subscriber in place.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
