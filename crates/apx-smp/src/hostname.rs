//! # SML Hostname Derivation
//!
//! Maps a participant identifier onto the DNS name of its SMP:
//!
//! ```text
//! "B-" + lowerhex(md5(latin1(lowercase(value)))) + "." + scheme + "." + sml_root
//! ```
//!
//! Resolution is purely algorithmic; no directory table is consulted.
//! Every access point on the network computes the same name, so the hash
//! input must stay byte-for-byte identical: lower-cased value, encoded as
//! ISO-8859-1 (characters above U+00FF become `?`), MD5, two lowercase hex
//! digits per byte.

use apx_core::{DocumentTypeId, ParticipantId};
use md5::{Digest, Md5};

/// Prefix of every SML-derived hostname.
const HOSTNAME_PREFIX: &str = "B-";

/// Derive the SMP hostname for `participant` under `sml_root`.
pub fn compute_lookup_hostname(sml_root: &str, participant: &ParticipantId) -> String {
    format!(
        "{HOSTNAME_PREFIX}{}.{}.{}",
        md5_hex(&participant.lookup_value()),
        participant.scheme(),
        sml_root
    )
}

/// Path of the signed service metadata resource on the SMP.
///
/// Both identifiers are form-encoded in their `scheme::value` wire form.
pub fn lookup_path(participant: &ParticipantId, document_type: &DocumentTypeId) -> String {
    format!(
        "/{}/services/{}",
        form_encode(&participant.to_string()),
        form_encode(&document_type.to_string())
    )
}

/// Lowercase hex MD5 of the ISO-8859-1 encoding of `value`.
pub fn md5_hex(value: &str) -> String {
    Md5::digest(latin1_bytes(value))
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn latin1_bytes(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn form_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
