//! # Certificate Helpers
//!
//! Subject common-name extraction and fingerprinting for the X.509
//! certificates that name AS2 senders and receivers.

use openssl::nid::Nid;
use openssl::x509::{X509Ref, X509};
use sha2::{Digest, Sha256};

use crate::error::IdentifierError;

/// Read the first subject common name of a certificate.
pub fn common_name(certificate: &X509Ref) -> Result<String, IdentifierError> {
    let entry = certificate
        .subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .ok_or(IdentifierError::MissingCommonName)?;
    let cn = entry
        .data()
        .as_utf8()
        .map_err(|e| IdentifierError::UnreadableCertificate(e.to_string()))?;
    Ok(cn.to_string())
}

/// Read the first subject common name of a DER-encoded certificate.
pub fn common_name_from_der(der: &[u8]) -> Result<String, IdentifierError> {
    let certificate =
        X509::from_der(der).map_err(|e| IdentifierError::UnreadableCertificate(e.to_string()))?;
    common_name(&certificate)
}

/// SHA-256 fingerprint of DER bytes as colon-separated upper-case hex.
pub fn certificate_fingerprint(der: &[u8]) -> String {
    Sha256::digest(der)
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Throwaway key material for tests in this and downstream crates.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::error::ErrorStack;
    use openssl::hash::MessageDigest;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::x509::{X509Builder, X509NameBuilder, X509};

    /// Generate an RSA key and a self-signed certificate. `common_name`
    /// of `None` leaves the subject without a CN.
    pub fn self_signed(common_name: Option<&str>) -> Result<(PKey<Private>, X509), ErrorStack> {
        let key = PKey::from_rsa(Rsa::generate(2048)?)?;

        let mut name = X509NameBuilder::new()?;
        name.append_entry_by_text("C", "NO")?;
        name.append_entry_by_text("O", "Test Access Point")?;
        if let Some(cn) = common_name {
            name.append_entry_by_text("CN", cn)?;
        }
        let name = name.build();

        let mut builder = X509Builder::new()?;
        builder.set_version(2)?;
        let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
        builder.set_serial_number(&serial)?;
        builder.set_subject_name(&name)?;
        builder.set_issuer_name(&name)?;
        builder.set_pubkey(&key)?;
        let not_before = Asn1Time::days_from_now(0)?;
        let not_after = Asn1Time::days_from_now(30)?;
        builder.set_not_before(&not_before)?;
        builder.set_not_after(&not_after)?;
        builder.sign(&key, MessageDigest::sha256())?;

        Ok((key, builder.build()))
    }
}
