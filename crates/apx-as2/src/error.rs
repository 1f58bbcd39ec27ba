//! Error types for secure transmission.
//!
//! Each stage of a transmission fails with its own type so that callers
//! can tell a local signing problem from a remote rejection, and a remote
//! rejection from an unreachable endpoint.

use std::borrow::Cow;
use std::path::PathBuf;

use apx_core::{ConfigurationError, IdentifierError, TransmissionId};
use thiserror::Error;

/// The sender key material could not be loaded.
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// A PEM file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PEM blob does not decode to the expected object.
    #[error("invalid {what} PEM: {source}")]
    Pem {
        what: &'static str,
        #[source]
        source: openssl::error::ErrorStack,
    },

    /// The private key does not belong to the certificate.
    #[error("private key does not match the certificate public key")]
    KeyMismatch,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// The S/MIME envelope could not be built.
#[derive(Error, Debug)]
pub enum SigningError {
    /// The declared payload type is not a syntactically valid MIME type.
    #[error("invalid MIME type {value:?}: {reason}")]
    InvalidMimeType { value: String, reason: String },

    /// The signing operation failed (key/algorithm mismatch, provider error).
    #[error("S/MIME signing failed: {0}")]
    Crypto(#[source] openssl::error::ErrorStack),

    /// The signed output does not have the expected MIME layout.
    #[error("signed envelope is malformed: {0}")]
    Layout(String),
}

/// A signed envelope did not verify.
#[derive(Error, Debug)]
pub enum VerificationError {
    /// The envelope could not be read back as S/MIME.
    #[error("envelope is not readable S/MIME: {0}")]
    Unreadable(#[source] openssl::error::ErrorStack),

    /// The envelope carries no detached content.
    #[error("envelope has no signed content")]
    MissingContent,

    /// The signature does not match the content or the certificate.
    #[error("signature verification failed: {0}")]
    BadSignature(#[source] openssl::error::ErrorStack),
}

/// A success response body is not a usable disposition notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedReceiptError {
    /// The declared `Content-Type` does not parse.
    #[error("invalid receipt content type {value:?}: {reason}")]
    InvalidContentType { value: String, reason: String },

    /// The body does not parse as MIME.
    #[error("receipt is not parseable MIME: {0}")]
    Mime(String),

    /// The MIME tree is not a disposition notification report.
    #[error("expected {expected}, found {found}")]
    UnexpectedStructure {
        expected: &'static str,
        found: String,
    },

    /// The report lacks a required part.
    #[error("receipt has no {0} part")]
    MissingPart(&'static str),
}

/// A transmission failed.
///
/// Outcomes a remote endpoint can legitimately produce are modelled in
/// [`TransmissionOutcome`](crate::TransmissionOutcome); this type carries
/// them once the caller asks for a `Result`, plus local failures that
/// never reached the wire.
#[derive(Error, Debug)]
pub enum TransmissionError {
    /// Sender or recipient system identifier could not be derived.
    #[error("system identifier: {0}")]
    Identifier(#[from] IdentifierError),

    /// A header value cannot be sent on the wire.
    #[error("invalid {name} header value: {reason}")]
    InvalidHeader { name: &'static str, reason: String },

    /// The endpoint could not be reached (connection refused, host
    /// unreachable).
    #[error("transmission {transmission_id}: {endpoint} is unreachable: {source}")]
    Connectivity {
        transmission_id: TransmissionId,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Any other transport failure (TLS, timeout, protocol error).
    #[error("transmission {transmission_id}: POST to {endpoint} failed: {source}")]
    Transport {
        transmission_id: TransmissionId,
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error(
        "transmission {transmission_id} rejected with {status}: {}",
        String::from_utf8_lossy(.body)
    )]
    Rejected {
        transmission_id: TransmissionId,
        status: u16,
        /// Response body exactly as received.
        body: Vec<u8>,
    },

    /// Success status without a usable receipt.
    #[error("transmission {transmission_id}: protocol violation: {reason}")]
    ProtocolViolation {
        transmission_id: TransmissionId,
        reason: String,
    },

    /// The response body could not be read after the status arrived.
    #[error("transmission {transmission_id}: failed to read {status} response body: {source}")]
    ResponseBody {
        transmission_id: TransmissionId,
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    /// The receipt body does not parse.
    #[error("transmission {transmission_id}: malformed receipt: {source}")]
    MalformedReceipt {
        transmission_id: TransmissionId,
        #[source]
        source: MalformedReceiptError,
    },

    /// The HTTP client could not be built.
    #[error("failed to initialise AS2 HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TransmissionError {
    /// Rejection body decoded for display; invalid UTF-8 is replaced.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Rejected { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }

    /// Correlation id of the attempt, when one was generated.
    pub fn transmission_id(&self) -> Option<&TransmissionId> {
        match self {
            Self::Connectivity { transmission_id, .. }
            | Self::Transport { transmission_id, .. }
            | Self::Rejected { transmission_id, .. }
            | Self::ProtocolViolation { transmission_id, .. }
            | Self::ResponseBody { transmission_id, .. }
            | Self::MalformedReceipt { transmission_id, .. } => Some(transmission_id),
            Self::Identifier(_) | Self::InvalidHeader { .. } | Self::Client(_) => None,
        }
    }
}
