//! Outbound error type.

use apx_as2::{KeystoreError, SigningError, TransmissionError};
use apx_core::{ConfigurationError, IdentifierError};
use apx_smp::ResolutionError;
use thiserror::Error;

/// Any failure of the resolve, sign, send pipeline.
///
/// Each stage keeps its own error so callers can branch by kind.
#[derive(Error, Debug)]
pub enum OutboundError {
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("keystore: {0}")]
    Keystore(#[from] KeystoreError),

    /// Sender or recipient system identifier is missing or malformed.
    #[error("identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("resolution: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("signing: {0}")]
    Signing(#[from] SigningError),

    #[error("transmission: {0}")]
    Transmission(#[from] TransmissionError),
}
