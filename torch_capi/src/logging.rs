use crate::error::CapiError;

/// Environment variable holding the `env_logger` filter for this library.
pub const LOG_ENV: &str = "TCAPI_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs `env_logger` as the process logger. Host processes that already
/// install their own `log` backend should skip this.
pub fn init_logging() -> Result<(), CapiError> {
    let env = env_logger::Env::new().filter_or(LOG_ENV, DEFAULT_FILTER);
    env_logger::Builder::from_env(env)
        .try_init()
        .map_err(|err| CapiError::Logging(err.to_string()))
}
