//! Endpoint resolution configuration.
//!
//! Defaults point at the production SML. Override via environment
//! variables or explicit construction for test networks.

use apx_core::ConfigurationError;
use url::Url;

/// Production SML zone.
pub const DEFAULT_SML_ROOT: &str = "sml.peppolcentral.org";

/// Configuration for SMP lookups.
#[derive(Debug, Clone)]
pub struct SmpConfig {
    /// DNS zone under which participant hostnames are published.
    pub sml_root: String,
    /// Send lookups to this SMP base URL instead of the SML-derived host.
    /// The derived path is kept.
    pub smp_override: Option<Url>,
    /// TCP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SmpConfig {
    fn default() -> Self {
        Self {
            sml_root: DEFAULT_SML_ROOT.to_string(),
            smp_override: None,
            connect_timeout_secs: 10,
            timeout_secs: 30,
        }
    }
}

impl SmpConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `APX_SML_ROOT` (default: `sml.peppolcentral.org`)
    /// - `APX_SMP_OVERRIDE` (optional base URL)
    /// - `APX_SMP_CONNECT_TIMEOUT_SECS` (default: 10)
    /// - `APX_SMP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let defaults = Self::default();
        let smp_override = match std::env::var("APX_SMP_OVERRIDE") {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(Url::parse(raw.trim()).map_err(|e| ConfigurationError::InvalidUrl {
                    name: "APX_SMP_OVERRIDE".into(),
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };
        Ok(Self {
            sml_root: std::env::var("APX_SML_ROOT").unwrap_or(defaults.sml_root),
            smp_override,
            connect_timeout_secs: env_secs(
                "APX_SMP_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            timeout_secs: env_secs("APX_SMP_TIMEOUT_SECS", defaults.timeout_secs)?,
        })
    }

    /// Configuration sending every lookup to a local mock SMP.
    pub fn local_mock(base_url: &str) -> Result<Self, ConfigurationError> {
        let url = Url::parse(base_url).map_err(|e| ConfigurationError::InvalidUrl {
            name: "smp_override".into(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            smp_override: Some(url),
            connect_timeout_secs: 2,
            timeout_secs: 5,
            ..Self::default()
        })
    }
}

fn env_secs(var: &str, default: u64) -> Result<u64, ConfigurationError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigurationError::InvalidValue {
            name: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
