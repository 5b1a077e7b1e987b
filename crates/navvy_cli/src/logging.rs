use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "NAVVY_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs a stderr subscriber so logs never interleave with streamed stdout.
pub fn init() {
    let filter =
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
