//! Engine configuration loaded from environment variables.

use std::time::Duration;

/// Engine configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `GATEWAY_SECRET` — HMAC secret for payment callback verification
///   (default: `"dev-secret"`, override in production)
/// - `STORE_CALL_TIMEOUT_MS` — per-item deadline for inventory writes
///   (default: `5000`)
/// - `CURRENCY` — ISO currency code passed to the gateway (default: `"USD"`)
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub gateway_secret: String,
    pub call_timeout: Duration,
    pub currency: String,
}

impl EngineConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            gateway_secret: std::env::var("GATEWAY_SECRET")
                .unwrap_or_else(|_| "dev-secret".to_string()),
            call_timeout: std::env::var("STORE_CALL_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(5000)),
            currency: std::env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string()),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gateway_secret: "dev-secret".to_string(),
            call_timeout: Duration::from_millis(5000),
            currency: "USD".to_string(),
        }
    }
}
