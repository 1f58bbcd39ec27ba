//! Transmission configuration.
//!
//! Hostname verification is on unless `danger_accept_invalid_hostnames`
//! is set explicitly.

use apx_core::ConfigurationError;

/// `Subject` header sent with every message unless overridden.
pub const DEFAULT_SUBJECT: &str = "AS2 message from APX";

/// Configuration for the AS2 client.
#[derive(Debug, Clone)]
pub struct As2Config {
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds, receipt included.
    pub timeout_secs: u64,
    /// Value of the `Subject` header.
    pub subject: String,
    /// Accept TLS certificates whose names do not match the endpoint host.
    /// The chain is still verified.
    pub danger_accept_invalid_hostnames: bool,
}

impl Default for As2Config {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            timeout_secs: 60,
            subject: DEFAULT_SUBJECT.to_string(),
            danger_accept_invalid_hostnames: false,
        }
    }
}

impl As2Config {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `APX_AS2_CONNECT_TIMEOUT_SECS` (default: 10)
    /// - `APX_AS2_TIMEOUT_SECS` (default: 60)
    /// - `APX_AS2_SUBJECT` (default: `AS2 message from APX`)
    /// - `APX_AS2_DANGER_ACCEPT_INVALID_HOSTNAMES` (default: false)
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();
        Ok(Self {
            connect_timeout_secs: env_parse(
                "APX_AS2_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            timeout_secs: env_parse("APX_AS2_TIMEOUT_SECS", defaults.timeout_secs)?,
            subject: std::env::var("APX_AS2_SUBJECT").unwrap_or(defaults.subject),
            danger_accept_invalid_hostnames: env_flag(
                "APX_AS2_DANGER_ACCEPT_INVALID_HOSTNAMES",
                defaults.danger_accept_invalid_hostnames,
            )?,
        })
    }

    /// Short timeouts for talking to a local mock endpoint.
    pub fn local_mock() -> Self {
        Self {
            connect_timeout_secs: 2,
            timeout_secs: 5,
            ..Self::default()
        }
    }
}

fn env_parse(var: &str, default: u64) -> Result<u64, ConfigurationError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigurationError::InvalidValue {
            name: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn env_flag(var: &str, default: bool) -> Result<bool, ConfigurationError> {
    match std::env::var(var) {
        Ok(raw) => parse_flag(&raw).ok_or(ConfigurationError::InvalidValue {
            name: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
