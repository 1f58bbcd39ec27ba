//! # Sender Key Material
//!
//! The transmission side never owns key storage. It asks a
//! [`SenderKeystore`] for the sender's private key and certificate and
//! only ever reads them.
//!
//! [`PemKeystore`] is the stock implementation: an RSA (or EC) private key
//! and an X.509 certificate loaded from PEM, checked to belong together.

use std::fmt;
use std::path::{Path, PathBuf};

use apx_core::{common_name, ConfigurationError, IdentifierError, SystemIdentifier};
use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509};

use crate::error::KeystoreError;

/// Read-only source of the sender identity.
pub trait SenderKeystore: Send + Sync {
    fn private_key(&self) -> &PKeyRef<Private>;

    fn certificate(&self) -> &X509Ref;

    /// AS2 system identifier taken from the certificate common name.
    fn system_identifier(&self) -> Result<SystemIdentifier, IdentifierError> {
        SystemIdentifier::from_certificate(self.certificate())
    }
}

/// Locations of the PEM files backing a [`PemKeystore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystoreConfig {
    /// PEM file holding the RSA private key.
    pub private_key_path: PathBuf,
    /// PEM file holding the matching X.509 certificate.
    pub certificate_path: PathBuf,
}

impl KeystoreConfig {
    /// Read `APX_KEY_PEM` and `APX_CERT_PEM`. Both are required.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigurationError::Missing(name.to_string()))
        };
        Ok(Self {
            private_key_path: var("APX_KEY_PEM")?.into(),
            certificate_path: var("APX_CERT_PEM")?.into(),
        })
    }
}

/// Private key and certificate held in memory.
pub struct PemKeystore {
    key: PKey<Private>,
    certificate: X509,
}

impl PemKeystore {
    /// Pair a key with its certificate.
    pub fn new(key: PKey<Private>, certificate: X509) -> Result<Self, KeystoreError> {
        let public = certificate.public_key().map_err(|source| KeystoreError::Pem {
            what: "certificate public key",
            source,
        })?;
        if !public.public_eq(&*key) {
            return Err(KeystoreError::KeyMismatch);
        }
        Ok(Self { key, certificate })
    }

    /// Parse PEM-encoded key and certificate.
    pub fn from_pem(key_pem: &[u8], certificate_pem: &[u8]) -> Result<Self, KeystoreError> {
        let key = PKey::private_key_from_pem(key_pem).map_err(|source| KeystoreError::Pem {
            what: "private key",
            source,
        })?;
        let certificate = X509::from_pem(certificate_pem).map_err(|source| KeystoreError::Pem {
            what: "certificate",
            source,
        })?;
        Self::new(key, certificate)
    }

    /// Read both PEM files named by `config`.
    pub fn load(config: &KeystoreConfig) -> Result<Self, KeystoreError> {
        let key_pem = read(&config.private_key_path)?;
        let certificate_pem = read(&config.certificate_path)?;
        let keystore = Self::from_pem(&key_pem, &certificate_pem)?;
        tracing::debug!(
            certificate = %config.certificate_path.display(),
            "Loaded sender key material"
        );
        Ok(keystore)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, KeystoreError> {
    std::fs::read(path).map_err(|source| KeystoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl SenderKeystore for PemKeystore {
    fn private_key(&self) -> &PKeyRef<Private> {
        &self.key
    }

    fn certificate(&self) -> &X509Ref {
        &self.certificate
    }
}

// Never print key material.
impl fmt::Debug for PemKeystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PemKeystore")
            .field(
                "subject",
                &common_name(&self.certificate).unwrap_or_else(|_| "<no CN>".into()),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apx_core::certificate::test_support::self_signed;
    use std::io::Write;

    #[test]
    fn accepts_matching_pair() {
        let (key, cert) = self_signed(Some("APP_1000000001")).unwrap();
        let ks = PemKeystore::new(key, cert).unwrap();
        assert_eq!(ks.system_identifier().unwrap().as_str(), "APP_1000000001");
    }

    #[test]
    fn rejects_foreign_key() {
        let (_, cert) = self_signed(Some("APP_1000000001")).unwrap();
        let (other_key, _) = self_signed(Some("APP_1000000002")).unwrap();
        assert!(matches!(
            PemKeystore::new(other_key, cert),
            Err(KeystoreError::KeyMismatch)
        ));
    }

    #[test]
    fn loads_from_pem_files() {
        let (key, cert) = self_signed(Some("APP_1000000001")).unwrap();
        let mut key_file = tempfile::NamedTempFile::new().unwrap();
        key_file.write_all(&key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        let mut cert_file = tempfile::NamedTempFile::new().unwrap();
        cert_file.write_all(&cert.to_pem().unwrap()).unwrap();

        let ks = PemKeystore::load(&KeystoreConfig {
            private_key_path: key_file.path().to_path_buf(),
            certificate_path: cert_file.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(ks.certificate().to_der().unwrap(), cert.to_der().unwrap());
        assert!(format!("{ks:?}").contains("APP_1000000001"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PemKeystore::load(&KeystoreConfig {
            private_key_path: "/nonexistent/key.pem".into(),
            certificate_path: "/nonexistent/cert.pem".into(),
        })
        .unwrap_err();
        assert!(matches!(err, KeystoreError::Io { .. }));
    }

    #[test]
    fn garbage_pem_is_rejected() {
        let err = PemKeystore::from_pem(b"not a key", b"not a cert").unwrap_err();
        assert!(matches!(err, KeystoreError::Pem { what: "private key", .. }));
    }
}
