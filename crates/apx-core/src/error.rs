//! # Error Types
//!
//! Errors raised before any network I/O takes place: malformed caller
//! identifiers, invalid configuration values, and AS2 system identifiers
//! that cannot be derived from a certificate.

use thiserror::Error;

use crate::identity::IdentifierKind;

/// A required identifier or configuration value is missing or invalid.
///
/// Always raised before any I/O is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The scheme part of an identifier is empty.
    #[error("{kind} identifier has an empty scheme")]
    EmptyScheme {
        /// Which identifier family was being built.
        kind: IdentifierKind,
    },

    /// The value part of an identifier is empty.
    #[error("{kind} identifier has an empty value")]
    EmptyValue {
        /// Which identifier family was being built.
        kind: IdentifierKind,
    },

    /// The `scheme::value` form could not be split.
    #[error("{kind} identifier {input:?} is not of the form scheme::value")]
    MissingSeparator {
        /// Which identifier family was being parsed.
        kind: IdentifierKind,
        /// The raw input.
        input: String,
    },

    /// A URL-valued setting does not parse.
    #[error("invalid URL for {name}: {reason}")]
    InvalidUrl {
        /// Setting or environment variable name.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// A numeric or boolean setting does not parse.
    #[error("invalid value {value:?} for {name}")]
    InvalidValue {
        /// Setting or environment variable name.
        name: String,
        /// The rejected raw value.
        value: String,
    },

    /// A mandatory setting is absent.
    #[error("{0} is required")]
    Missing(String),
}

/// An AS2 system identifier could not be derived.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The certificate subject carries no common name.
    #[error("certificate subject has no common name")]
    MissingCommonName,

    /// The certificate could not be decoded.
    #[error("certificate could not be decoded: {0}")]
    UnreadableCertificate(String),

    /// The common name does not follow the system identifier grammar.
    #[error("common name {common_name:?} is not a valid AS2 system identifier: {reason}")]
    Malformed {
        /// The rejected common name.
        common_name: String,
        /// What rule it breaks.
        reason: &'static str,
    },
}
