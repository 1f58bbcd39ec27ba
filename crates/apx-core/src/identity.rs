//! # Identifier Newtypes
//!
//! Participant, document type and process identifiers are all a
//! `scheme` + `value` pair. They are distinct types so a document type can
//! never be passed where a participant is expected.
//!
//! The wire form is `scheme::value`. Parsing splits at the FIRST `::`
//! because document type values routinely contain `::` themselves
//! (`urn:...:Invoice-2::Invoice##...::2.0`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigurationError;

/// Default participant identifier scheme on the PEPPOL network.
pub const PARTICIPANT_SCHEME: &str = "iso6523-actorid-upis";

/// Default document type identifier scheme.
pub const DOCUMENT_TYPE_SCHEME: &str = "busdox-docid-qns";

/// Default process identifier scheme.
pub const PROCESS_SCHEME: &str = "cenbii-procid-ubl";

const SEPARATOR: &str = "::";

/// Identifier family, used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// [`ParticipantId`].
    Participant,
    /// [`DocumentTypeId`].
    DocumentType,
    /// [`ProcessId`].
    Process,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Participant => "participant",
            Self::DocumentType => "document type",
            Self::Process => "process",
        })
    }
}

macro_rules! scheme_value_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "String", try_from = "String")]
        pub struct $name {
            scheme: String,
            value: String,
        }

        impl $name {
            /// Build an identifier from its two parts.
            ///
            /// Surrounding whitespace is trimmed; an empty part is rejected.
            pub fn new(
                scheme: impl Into<String>,
                value: impl Into<String>,
            ) -> Result<Self, ConfigurationError> {
                let scheme = scheme.into().trim().to_string();
                let value = value.into().trim().to_string();
                if scheme.is_empty() {
                    return Err(ConfigurationError::EmptyScheme { kind: $kind });
                }
                if value.is_empty() {
                    return Err(ConfigurationError::EmptyValue { kind: $kind });
                }
                Ok(Self { scheme, value })
            }

            /// The identifier scheme.
            pub fn scheme(&self) -> &str {
                &self.scheme
            }

            /// The identifier value, exactly as supplied.
            pub fn value(&self) -> &str {
                &self.value
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}{}", self.scheme, SEPARATOR, self.value)
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (scheme, value) = s.split_once(SEPARATOR).ok_or_else(|| {
                    ConfigurationError::MissingSeparator {
                        kind: $kind,
                        input: s.to_string(),
                    }
                })?;
                Self::new(scheme, value)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigurationError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }
    };
}

scheme_value_identifier!(
    /// Logical sender or recipient identity, e.g.
    /// `iso6523-actorid-upis::9908:810017902`.
    ///
    /// Equality covers scheme and value as supplied. Only the SML lookup
    /// hash lower-cases the value, see [`ParticipantId::lookup_value`].
    ParticipantId,
    IdentifierKind::Participant
);

scheme_value_identifier!(
    /// Kind of business document being exchanged.
    DocumentTypeId,
    IdentifierKind::DocumentType
);

scheme_value_identifier!(
    /// Business process the document belongs to.
    ProcessId,
    IdentifierKind::Process
);

impl ParticipantId {
    /// Participant in the default `iso6523-actorid-upis` scheme.
    pub fn with_default_scheme(value: impl Into<String>) -> Result<Self, ConfigurationError> {
        Self::new(PARTICIPANT_SCHEME, value)
    }

    /// The value as it enters the SML hostname hash: lower-cased.
    pub fn lookup_value(&self) -> String {
        self.value.to_lowercase()
    }
}

/// Correlation id of a single transmission attempt.
///
/// Random 128-bit (v4) token, fresh per send; doubles as the AS2
/// `Message-ID`. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransmissionId(pub Uuid);

impl TransmissionId {
    /// Generate a new random transmission identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransmissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim_matches(|c| c == '<' || c == '>')).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn participant_parses_wire_form() {
        let p: ParticipantId = "iso6523-actorid-upis::9908:810017902".parse().unwrap();
        assert_eq!(p.scheme(), "iso6523-actorid-upis");
        assert_eq!(p.value(), "9908:810017902");
        assert_eq!(p.to_string(), "iso6523-actorid-upis::9908:810017902");
    }

    #[test]
    fn document_type_splits_at_first_separator() {
        let raw = "busdox-docid-qns::urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:www.cenbii.eu:transaction:biicoretrdm010:ver1.0::2.0";
        let d: DocumentTypeId = raw.parse().unwrap();
        assert_eq!(d.scheme(), "busdox-docid-qns");
        assert!(d.value().ends_with("::2.0"));
        assert_eq!(d.to_string(), raw);
    }

    #[test]
    fn missing_separator_is_rejected() {
        let err = "9908:810017902".parse::<ParticipantId>().unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::MissingSeparator { kind: IdentifierKind::Participant, .. }
        ));
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert_eq!(
            ProcessId::new(" ", "x").unwrap_err(),
            ConfigurationError::EmptyScheme { kind: IdentifierKind::Process }
        );
        assert_eq!(
            ProcessId::new("cenbii-procid-ubl", "").unwrap_err(),
            ConfigurationError::EmptyValue { kind: IdentifierKind::Process }
        );
    }

    #[test]
    fn equality_is_case_sensitive_but_lookup_value_is_not() {
        let lower = ParticipantId::with_default_scheme("9908:abc").unwrap();
        let upper = ParticipantId::with_default_scheme("9908:ABC").unwrap();
        assert_ne!(lower, upper);
        assert_eq!(lower.lookup_value(), upper.lookup_value());
    }

    #[test]
    fn serde_uses_wire_form() {
        let p = ParticipantId::with_default_scheme("9908:810017902").unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"iso6523-actorid-upis::9908:810017902\"");
        let back: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<ParticipantId>("\"no-separator\"").is_err());
    }

    #[test]
    fn transmission_ids_are_unique() {
        let ids: HashSet<TransmissionId> = (0..1000).map(|_| TransmissionId::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn transmission_id_parses_angle_bracketed_form() {
        let id = TransmissionId::new();
        let parsed: TransmissionId = format!("<{id}>").parse().unwrap();
        assert_eq!(parsed, id);
    }
}
