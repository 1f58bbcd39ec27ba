//! # Hostname Subcommand
//!
//! Prints the SML-derived hostname of a participant's SMP and, when a
//! document type is given, the full lookup URL. No network access.

use anyhow::{Context, Result};
use clap::Args;

use apx_core::{DocumentTypeId, ParticipantId};
use apx_smp::config::DEFAULT_SML_ROOT;
use apx_smp::{compute_lookup_hostname, lookup_path};

/// Arguments for `apx hostname`.
#[derive(Args, Debug)]
pub struct HostnameArgs {
    /// Participant as `scheme::value`, or a bare value for the default scheme.
    pub participant: String,

    /// Document type as `scheme::value`; prints the lookup URL as well.
    #[arg(long)]
    pub document_type: Option<String>,

    /// SML zone.
    #[arg(long, default_value = DEFAULT_SML_ROOT)]
    pub sml_root: String,
}

/// Execute the hostname subcommand.
pub fn run_hostname(args: &HostnameArgs) -> Result<u8> {
    for line in describe(args)? {
        println!("{line}");
    }
    Ok(0)
}

fn describe(args: &HostnameArgs) -> Result<Vec<String>> {
    let participant = parse_participant(&args.participant)?;
    let hostname = compute_lookup_hostname(&args.sml_root, &participant);
    let mut lines = vec![hostname.clone()];
    if let Some(raw) = &args.document_type {
        let document_type: DocumentTypeId = raw
            .parse()
            .with_context(|| format!("invalid document type {raw:?}"))?;
        lines.push(format!(
            "http://{hostname}{}",
            lookup_path(&participant, &document_type)
        ));
    }
    Ok(lines)
}

/// `scheme::value`, or a bare value under the default participant scheme.
pub fn parse_participant(raw: &str) -> Result<ParticipantId> {
    let parsed = if raw.contains("::") {
        raw.parse()
    } else {
        ParticipantId::with_default_scheme(raw)
    };
    parsed.with_context(|| format!("invalid participant {raw:?}"))
}
