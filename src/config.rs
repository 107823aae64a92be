use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "HealthMate";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default gateway base URL (the development backend).
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:5000";

/// Number dialed by the device handoff after a delivered alert.
pub const EMERGENCY_NUMBER: &str = "112";

/// Deadline for a single geolocation fix during SOS dispatch.
pub const GEOLOCATION_DEADLINE: Duration = Duration::from_secs(10);

/// How long the "Alert Sent" confirmation stays on screen before the
/// dispatcher hands off to the device dialer.
pub const DIAL_HANDOFF_DELAY: Duration = Duration::from_millis(1500);

/// Connect timeout for the gateway HTTP client.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for gateway calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "healthmate_core=info".to_string()
}
