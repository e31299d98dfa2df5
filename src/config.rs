/// Application-level constants
pub const APP_NAME: &str = "consultsim";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend base URL when `CONSULTSIM_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Per-request timeout when `CONSULTSIM_API_TIMEOUT_SECS` is not set.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 60;

pub const API_URL_ENV: &str = "CONSULTSIM_API_URL";
pub const API_TIMEOUT_ENV: &str = "CONSULTSIM_API_TIMEOUT_SECS";

/// Trainee identifier sent to the case store; defaults to "trainee".
pub const CALLER_ENV: &str = "CONSULTSIM_CALLER";

pub fn default_log_filter() -> String {
    format!("{APP_NAME}=info")
}

pub fn caller_id() -> String {
    std::env::var(CALLER_ENV).unwrap_or_else(|_| "trainee".to_string())
}
