//! # Send Subcommand
//!
//! Resolves the recipient's access point, signs the document and delivers
//! it over AS2. Exits 0 only when the receiver returned a valid MDN; any
//! other outcome is reported with its classification and exits 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use apx_as2::{As2Config, TransmissionOutcome};
use apx_core::{DocumentTypeId, ProcessId};
use apx_outbound::{OutboundConfig, OutboundSender, TransmissionRequest};
use apx_smp::SmpConfig;

use crate::hostname::parse_participant;
use crate::sign::keystore_config;

/// Arguments for `apx send`.
#[derive(Args, Debug)]
pub struct SendArgs {
    /// Document to send.
    pub input: PathBuf,

    /// Sending participant, `scheme::value` or bare value.
    #[arg(long)]
    pub sender: String,

    /// Receiving participant, `scheme::value` or bare value.
    #[arg(long)]
    pub recipient: String,

    /// Document type as `scheme::value`.
    #[arg(long)]
    pub document_type: String,

    /// Process as `scheme::value`.
    #[arg(long)]
    pub process: String,

    /// PEM private key. Falls back to `APX_KEY_PEM`.
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// PEM certificate. Falls back to `APX_CERT_PEM`.
    #[arg(long)]
    pub cert: Option<PathBuf>,
}

/// Execute the send subcommand.
pub fn run_send(args: &SendArgs) -> Result<u8> {
    let request = build_request(args)?;
    let config = OutboundConfig {
        smp: SmpConfig::from_env().context("invalid SMP configuration")?,
        as2: As2Config::from_env().context("invalid AS2 configuration")?,
        keystore: keystore_config(args.key.as_ref(), args.cert.as_ref())?,
    };
    let sender = OutboundSender::from_config(config)?;

    let (endpoint, outcome) = crate::block_on(sender.transmit(request))??;
    println!("{} {}", outcome.name(), outcome.transmission_id());
    println!("endpoint {} ({})", endpoint.address, endpoint.common_name);
    match outcome {
        TransmissionOutcome::Accepted { disposition, .. } => {
            if let Some(value) = &disposition.disposition {
                println!("disposition {value}");
            }
            Ok(0)
        }
        TransmissionOutcome::Rejected { status, ref body, .. } => {
            println!("status {status}");
            if !body.is_empty() {
                println!("{}", String::from_utf8_lossy(body));
            }
            Ok(1)
        }
        TransmissionOutcome::ConnectivityFailure { source, .. } => {
            println!("error {source}");
            Ok(1)
        }
        TransmissionOutcome::ProtocolViolation { reason, .. } => {
            println!("reason {reason}");
            Ok(1)
        }
    }
}

fn build_request(args: &SendArgs) -> Result<TransmissionRequest> {
    let document_type: DocumentTypeId = args
        .document_type
        .parse()
        .with_context(|| format!("invalid document type {:?}", args.document_type))?;
    let process: ProcessId = args
        .process
        .parse()
        .with_context(|| format!("invalid process {:?}", args.process))?;
    let payload = std::fs::read(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    Ok(TransmissionRequest {
        sender: parse_participant(&args.sender)?,
        recipient: parse_participant(&args.recipient)?,
        document_type,
        process,
        payload,
        endpoint: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: PathBuf) -> SendArgs {
        SendArgs {
            input,
            sender: "9908:976098897".into(),
            recipient: "iso6523-actorid-upis::9908:810017902".into(),
            document_type: "busdox-docid-qns::urn:invoice::2.0".into(),
            process: "cenbii-procid-ubl::urn:www.cenbii.eu:profile:bii04:ver1.0".into(),
            key: None,
            cert: None,
        }
    }

    #[test]
    fn request_from_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("invoice.xml");
        std::fs::write(&input, b"<Invoice/>").unwrap();

        let request = build_request(&args(input)).unwrap();
        assert_eq!(request.sender.to_string(), "iso6523-actorid-upis::9908:976098897");
        assert_eq!(request.document_type.value(), "urn:invoice::2.0");
        assert_eq!(request.payload, b"<Invoice/>");
        assert!(request.endpoint.is_none());
    }

    #[test]
    fn unreadable_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_request(&args(dir.path().join("missing.xml"))).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
