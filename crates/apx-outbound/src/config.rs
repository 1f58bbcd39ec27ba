//! Combined configuration for an [`OutboundSender`](crate::OutboundSender).

use apx_as2::{As2Config, KeystoreConfig};
use apx_core::ConfigurationError;
use apx_smp::SmpConfig;

/// Settings for SMP lookups, AS2 delivery and the sender keystore.
#[derive(Debug, Clone)]
pub struct OutboundConfig {
    pub smp: SmpConfig,
    pub as2: As2Config,
    pub keystore: KeystoreConfig,
}

impl OutboundConfig {
    /// Read all three sections from `APX_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Ok(Self {
            smp: SmpConfig::from_env()?,
            as2: As2Config::from_env()?,
            keystore: KeystoreConfig::from_env()?,
        })
    }
}
