//! Error types for endpoint resolution.
//!
//! Network failures, SMP status failures and metadata that does not parse
//! are distinct variants so callers can pick different retry policies.
//! Nothing here is logged-and-swallowed: every failure reaches the caller.

use apx_core::{ConfigurationError, IdentifierError, ProcessId};

/// Resolution failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// The lookup request never produced a response (DNS, connect, TLS,
    /// timeout, body read).
    #[error("SMP lookup {url} failed: {source}")]
    Lookup {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The SMP answered with a non-success status.
    #[error("SMP lookup {url} returned {status}: {body}")]
    LookupStatus { url: String, status: u16, body: String },

    /// The SMP answered with a non-success status and its body could not
    /// be read.
    #[error("SMP lookup {url} returned {status}; reading the body failed: {source}")]
    LookupStatusBody {
        url: String,
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    /// The metadata document is unusable.
    #[error("malformed service metadata from {url}: {source}")]
    MalformedMetadata {
        url: String,
        #[source]
        source: MalformedMetadataError,
    },

    /// No process in the metadata matches the requested process id.
    #[error("service metadata from {url} has no process {process}")]
    NoMatchingProcess { url: String, process: ProcessId },

    /// The endpoint certificate does not yield a usable common name.
    #[error("endpoint certificate from {url} is unusable: {source}")]
    Certificate {
        url: String,
        #[source]
        source: IdentifierError,
    },

    /// Invalid lookup configuration or identifiers.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The HTTP client could not be built.
    #[error("failed to initialise SMP HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// The metadata XML does not have the expected structure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedMetadataError {
    /// Not well-formed XML.
    #[error("XML does not parse: {0}")]
    Xml(String),

    /// The document element is not `SignedServiceMetadata` or `ServiceMetadata`.
    #[error("unexpected document element {{{namespace}}}{name}")]
    UnexpectedRoot { namespace: String, name: String },

    /// A required element is absent.
    #[error("missing element {element} in {parent}")]
    MissingElement {
        element: &'static str,
        parent: &'static str,
    },

    /// A required attribute is absent.
    #[error("missing attribute {attribute} on {element}")]
    MissingAttribute {
        attribute: &'static str,
        element: &'static str,
    },

    /// The SMP answered with a redirect to another SMP.
    #[error("service metadata redirects to {0}")]
    Redirect(String),

    /// A list that must be non-empty is empty.
    #[error("{0} is empty")]
    Empty(&'static str),

    /// An element carries an unusable value.
    #[error("invalid {element}: {reason}")]
    InvalidValue {
        element: &'static str,
        reason: String,
    },
}
