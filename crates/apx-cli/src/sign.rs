//! # Sign Subcommand
//!
//! Wraps a document in a detached-signature S/MIME envelope, exactly as
//! `apx send` would put it on the wire, and writes it out as a
//! self-contained MIME entity.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use apx_as2::{sign_with, KeystoreConfig, PemKeystore, SignedEnvelope, PAYLOAD_MIME_TYPE};

/// Arguments for `apx sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Document to sign.
    pub input: PathBuf,

    /// Output file. Defaults to `<input>.p7m.eml`.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// PEM private key. Falls back to `APX_KEY_PEM`.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// PEM certificate. Falls back to `APX_CERT_PEM`.
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// MIME type declared for the signed part.
    #[arg(long, default_value = PAYLOAD_MIME_TYPE)]
    pub content_type: String,
}

/// Execute the sign subcommand.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let keystore = PemKeystore::load(&keystore_config(args.key.as_ref(), args.cert.as_ref())?)
        .context("failed to load sender key material")?;
    let payload = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let envelope = sign_with(&keystore, &payload, &args.content_type)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("p7m.eml"));
    std::fs::write(&output, render(&envelope))
        .with_context(|| format!("failed to write {}", output.display()))?;

    tracing::info!(
        input = %args.input.display(),
        output = %output.display(),
        bytes = envelope.mime_bytes().len(),
        "Signed document"
    );
    println!("{}", output.display());
    Ok(0)
}

/// Key paths from the command line, or from the environment when either
/// is absent.
pub fn keystore_config(key: Option<&PathBuf>, cert: Option<&PathBuf>) -> Result<KeystoreConfig> {
    match (key, cert) {
        (Some(key), Some(cert)) => Ok(KeystoreConfig {
            private_key_path: key.clone(),
            certificate_path: cert.clone(),
        }),
        (None, None) => KeystoreConfig::from_env().context("sender key material not configured"),
        _ => anyhow::bail!("--key and --cert must be given together"),
    }
}

fn render(envelope: &SignedEnvelope) -> Vec<u8> {
    let mut out = format!(
        "MIME-Version: 1.0\r\nContent-Type: {}\r\n\r\n",
        envelope.content_type()
    )
    .into_bytes();
    out.extend_from_slice(envelope.mime_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use apx_core::certificate::test_support::self_signed;

    #[test]
    fn writes_signed_entity() {
        let dir = tempfile::tempdir().unwrap();
        let (key, cert) = self_signed(Some("APP_1000000001")).unwrap();
        let key_path = dir.path().join("key.pem");
        let cert_path = dir.path().join("cert.pem");
        std::fs::write(&key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();
        let input = dir.path().join("invoice.xml");
        std::fs::write(&input, b"<Invoice/>").unwrap();

        let args = SignArgs {
            input: input.clone(),
            output: None,
            key: Some(key_path),
            cert: Some(cert_path),
            content_type: PAYLOAD_MIME_TYPE.into(),
        };
        assert_eq!(run_sign(&args).unwrap(), 0);

        let written = std::fs::read(dir.path().join("invoice.p7m.eml")).unwrap();
        let text = String::from_utf8_lossy(&written);
        assert!(text.starts_with("MIME-Version: 1.0\r\nContent-Type: multipart/signed"));
        assert!(text.contains("Content-Type: application/xml"));
        assert!(text.contains("<Invoice/>"));
    }

    #[test]
    fn key_without_cert_is_rejected() {
        let key = PathBuf::from("key.pem");
        assert!(keystore_config(Some(&key), None).is_err());
    }
}
