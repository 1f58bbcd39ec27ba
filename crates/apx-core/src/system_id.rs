//! # AS2 System Identifier
//!
//! The identity carried in the `AS2-From` / `AS2-To` headers. On the PEPPOL
//! network it is the subject common name of the access point certificate,
//! e.g. `APP_1000000001`.
//!
//! ## Grammar
//!
//! - starts with `APP_`
//! - followed by at least one ASCII letter, digit, `_` or `-`
//! - at most 128 characters in total (RFC 4130 §6.2 limit)
//!
//! Construction is fail-fast: a transmission cannot be built without a
//! validated identifier for both ends.

use std::fmt;
use std::str::FromStr;

use openssl::x509::X509Ref;
use serde::{Deserialize, Serialize};

use crate::certificate;
use crate::error::IdentifierError;

const PREFIX: &str = "APP_";
const MAX_LEN: usize = 128;

/// A validated AS2 system identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SystemIdentifier(String);

impl SystemIdentifier {
    /// Validate a common name against the identifier grammar.
    pub fn from_common_name(common_name: &str) -> Result<Self, IdentifierError> {
        let malformed = |reason| IdentifierError::Malformed {
            common_name: common_name.to_string(),
            reason,
        };

        if common_name.is_empty() {
            return Err(IdentifierError::MissingCommonName);
        }
        if common_name.len() > MAX_LEN {
            return Err(malformed("longer than 128 characters"));
        }
        let suffix = common_name
            .strip_prefix(PREFIX)
            .ok_or_else(|| malformed("missing APP_ prefix"))?;
        if suffix.is_empty() {
            return Err(malformed("nothing follows the APP_ prefix"));
        }
        if !suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(malformed("contains characters outside [A-Za-z0-9_-]"));
        }
        Ok(Self(common_name.to_string()))
    }

    /// Derive the identifier from a certificate's subject common name.
    pub fn from_certificate(certificate: &X509Ref) -> Result<Self, IdentifierError> {
        Self::from_common_name(&certificate::common_name(certificate)?)
    }

    /// Derive the identifier from a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self, IdentifierError> {
        Self::from_common_name(&certificate::common_name_from_der(der)?)
    }

    /// The identifier as it appears in `AS2-From` / `AS2-To`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SystemIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_common_name(s)
    }
}

impl TryFrom<String> for SystemIdentifier {
    type Error = IdentifierError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_common_name(&s)
    }
}

impl From<SystemIdentifier> for String {
    fn from(id: SystemIdentifier) -> String {
        id.0
    }
}
