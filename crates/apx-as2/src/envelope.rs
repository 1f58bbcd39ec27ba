//! # S/MIME Envelope
//!
//! Wraps a payload in a `multipart/signed` container with a detached
//! PKCS#7 signature made with the sender key.
//!
//! ```text
//! Content-Type: multipart/signed; protocol="application/x-pkcs7-signature"; micalg=...; boundary=...
//!
//! --boundary
//! Content-Type: application/xml            <- signed part
//! Content-Transfer-Encoding: binary
//!
//! <payload bytes>
//! --boundary
//! Content-Type: application/x-pkcs7-signature; name="smime.p7s"
//! ...
//! ```
//!
//! The outer `Content-Type` travels as the HTTP header; [`SignedEnvelope`]
//! keeps it apart from the body bytes. Boundaries and signing time differ
//! on every call, so two envelopes for the same payload never compare
//! equal byte for byte.

use mailparse::MailHeaderMap;
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{HasPrivate, PKeyRef};
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509Ref, X509};

use crate::error::{SigningError, VerificationError};
use crate::keystore::SenderKeystore;

/// Declared type of PEPPOL business document payloads.
pub const PAYLOAD_MIME_TYPE: &str = "application/xml";

/// Signed multipart body plus the content type that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    mime_bytes: Vec<u8>,
    content_type: String,
}

impl SignedEnvelope {
    /// Body bytes to POST.
    pub fn mime_bytes(&self) -> &[u8] {
        &self.mime_bytes
    }

    /// `multipart/signed; ...` value for the `Content-Type` header.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Split into body bytes and `Content-Type` value.
    pub fn into_parts(self) -> (Vec<u8>, String) {
        (self.mime_bytes, self.content_type)
    }

    /// Check the detached signature against `certificate`.
    ///
    /// Only the signature is checked, not the certificate chain. Returns
    /// the signed MIME part (headers and payload) on success.
    pub fn verify(&self, certificate: &X509Ref) -> Result<Vec<u8>, VerificationError> {
        let mut message = format!(
            "MIME-Version: 1.0\r\nContent-Type: {}\r\n\r\n",
            self.content_type
        )
        .into_bytes();
        message.extend_from_slice(&self.mime_bytes);

        let (pkcs7, content) = Pkcs7::from_smime(&message).map_err(VerificationError::Unreadable)?;
        let content = content.ok_or(VerificationError::MissingContent)?;

        let mut signers = Stack::<X509>::new().map_err(VerificationError::Unreadable)?;
        signers
            .push(certificate.to_owned())
            .map_err(VerificationError::Unreadable)?;
        let store = X509StoreBuilder::new()
            .map_err(VerificationError::Unreadable)?
            .build();

        pkcs7
            .verify(
                &signers,
                &store,
                Some(&content),
                None,
                Pkcs7Flags::NOINTERN | Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
            )
            .map_err(VerificationError::BadSignature)?;
        Ok(content)
    }
}

/// Sign `payload`, declared as `declared_mime_type`, with the sender key.
///
/// Fails with [`SigningError::InvalidMimeType`] before any cryptography
/// when the declared type does not parse.
pub fn sign<T: HasPrivate>(
    payload: &[u8],
    declared_mime_type: &str,
    private_key: &PKeyRef<T>,
    certificate: &X509Ref,
) -> Result<SignedEnvelope, SigningError> {
    let declared: mime::Mime =
        declared_mime_type
            .parse()
            .map_err(|e: mime::FromStrError| SigningError::InvalidMimeType {
                value: declared_mime_type.to_string(),
                reason: e.to_string(),
            })?;

    let mut part = format!("Content-Type: {declared}\r\nContent-Transfer-Encoding: binary\r\n\r\n")
        .into_bytes();
    part.extend_from_slice(payload);

    let flags = Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY;
    let extra_certs = Stack::<X509>::new().map_err(SigningError::Crypto)?;
    let pkcs7 = Pkcs7::sign(certificate, private_key, &extra_certs, &part, flags)
        .map_err(SigningError::Crypto)?;
    let smime = pkcs7.to_smime(&part, flags).map_err(SigningError::Crypto)?;

    let (headers, body_start) =
        mailparse::parse_headers(&smime).map_err(|e| SigningError::Layout(e.to_string()))?;
    let content_type = headers
        .get_first_value("Content-Type")
        .ok_or_else(|| SigningError::Layout("no Content-Type header".into()))?;
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/signed")
    {
        return Err(SigningError::Layout(format!(
            "expected multipart/signed, got {content_type}"
        )));
    }

    Ok(SignedEnvelope {
        mime_bytes: smime[body_start..].to_vec(),
        content_type,
    })
}

/// Sign with the key material of `keystore`.
pub fn sign_with(
    keystore: &dyn SenderKeystore,
    payload: &[u8],
    declared_mime_type: &str,
) -> Result<SignedEnvelope, SigningError> {
    sign(
        payload,
        declared_mime_type,
        keystore.private_key(),
        keystore.certificate(),
    )
}
