//! # Lookup Subcommand
//!
//! Fetches SMP metadata for a participant and document type and prints
//! the processes and endpoints it lists. With `--process`, also applies
//! the selection a sender would use to that same document.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{json, Value};

use apx_core::{certificate_fingerprint, common_name_from_der, DocumentTypeId, ProcessId};
use apx_smp::{
    resolve_certificate, resolve_endpoint_address, EndpointRecord, ServiceMetadataDocument,
    SmpClient, SmpConfig,
};

use crate::hostname::parse_participant;

/// Arguments for `apx lookup`.
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Participant as `scheme::value`, or a bare value for the default scheme.
    pub participant: String,

    /// Document type as `scheme::value`.
    pub document_type: String,

    /// Process as `scheme::value`; resolves the endpoint a sender would use.
    #[arg(long)]
    pub process: Option<String>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the lookup subcommand with configuration from the environment.
pub fn run_lookup(args: &LookupArgs) -> Result<u8> {
    let config = SmpConfig::from_env().context("invalid SMP configuration")?;
    let client = SmpClient::new(config)?;
    crate::block_on(lookup(&client, args))?
}

async fn lookup(client: &SmpClient, args: &LookupArgs) -> Result<u8> {
    let participant = parse_participant(&args.participant)?;
    let document_type: DocumentTypeId = args
        .document_type
        .parse()
        .with_context(|| format!("invalid document type {:?}", args.document_type))?;
    let process: Option<ProcessId> = args
        .process
        .as_deref()
        .map(|raw| {
            raw.parse()
                .with_context(|| format!("invalid process {raw:?}"))
        })
        .transpose()?;

    let url = client.lookup_url(&participant, &document_type)?;
    tracing::info!(url = %url, "Looking up service metadata");
    let metadata = client
        .lookup(&participant, &document_type)
        .await
        .with_context(|| format!("lookup of {participant} failed"))?;

    let resolved = process
        .as_ref()
        .map(|process| select(&metadata, process))
        .transpose()?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&to_json(&metadata, resolved.as_ref()))?
        );
    } else {
        print!("{}", to_text(&metadata, resolved.as_ref()));
    }
    Ok(0)
}

/// Endpoint selection applied to an already fetched document, so the
/// listing and the resolved record always agree.
fn select(metadata: &ServiceMetadataDocument, process: &ProcessId) -> Result<EndpointRecord> {
    let endpoint = resolve_endpoint_address(metadata).context("no usable endpoint")?;
    let certificate = resolve_certificate(metadata, process)
        .with_context(|| format!("service metadata has no process {process}"))?
        .to_vec();
    let common_name = common_name_from_der(&certificate)
        .with_context(|| format!("endpoint certificate for process {process} is unusable"))?;
    Ok(EndpointRecord {
        transport_profile: endpoint.transport_profile.clone(),
        address: endpoint.address.clone(),
        certificate,
        common_name,
    })
}

fn to_json(metadata: &ServiceMetadataDocument, resolved: Option<&EndpointRecord>) -> Value {
    let processes: Vec<Value> = metadata
        .processes
        .iter()
        .map(|p| {
            json!({
                "process": p.process_id.to_string(),
                "endpoints": p.endpoints.iter().map(|e| json!({
                    "transport_profile": e.transport_profile,
                    "address": e.address.as_str(),
                    "common_name": common_name_from_der(&e.certificate).ok(),
                    "certificate_sha256": certificate_fingerprint(&e.certificate),
                    "require_business_level_signature": e.require_business_level_signature,
                    "service_activation_date": e.service_activation_date,
                    "service_expiration_date": e.service_expiration_date,
                    "technical_contact_url": e.technical_contact_url,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "participant": metadata.participant.to_string(),
        "document_type": metadata.document_type.to_string(),
        "signed": metadata.signed,
        "processes": processes,
        "resolved": resolved.map(|r| json!({
            "address": r.address.as_str(),
            "transport_profile": r.transport_profile,
            "common_name": r.common_name,
            "certificate_sha256": r.certificate_fingerprint(),
        })),
    })
}

fn to_text(metadata: &ServiceMetadataDocument, resolved: Option<&EndpointRecord>) -> String {
    let mut out = format!(
        "participant:   {}\ndocument type: {}\nsigned:        {}\n",
        metadata.participant, metadata.document_type, metadata.signed
    );
    for process in &metadata.processes {
        out.push_str(&format!("process {}\n", process.process_id));
        for endpoint in &process.endpoints {
            let cn = common_name_from_der(&endpoint.certificate)
                .unwrap_or_else(|_| "<unreadable certificate>".into());
            out.push_str(&format!(
                "  {} {} ({cn})\n",
                endpoint.transport_profile, endpoint.address
            ));
        }
    }
    if let Some(r) = resolved {
        out.push_str(&format!(
            "resolved: {} {} ({})\n",
            r.transport_profile, r.address, r.common_name
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use apx_core::certificate::test_support::self_signed;
    use apx_smp::parse_metadata;

    fn base64_der(der: &[u8]) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(der)
    }

    const XML: &str = r#"<smp:SignedServiceMetadata xmlns:smp="http://busdox.org/serviceMetadata/publishing/1.0/" xmlns:ids="http://busdox.org/transport/identifiers/1.0/" xmlns:wsa="http://www.w3.org/2005/08/addressing">
  <smp:ServiceMetadata>
    <smp:ServiceInformation>
      <ids:ParticipantIdentifier scheme="iso6523-actorid-upis">9908:810017902</ids:ParticipantIdentifier>
      <ids:DocumentIdentifier scheme="busdox-docid-qns">urn:invoice::2.0</ids:DocumentIdentifier>
      <smp:ProcessList>
        <smp:Process>
          <ids:ProcessIdentifier scheme="cenbii-procid-ubl">urn:bii04</ids:ProcessIdentifier>
          <smp:ServiceEndpointList>
            <smp:Endpoint transportProfile="busdox-transport-as2-ver1p0">
              <wsa:EndpointReference><wsa:Address>https://ap.example.no/as2</wsa:Address></wsa:EndpointReference>
              <smp:Certificate>AAAA</smp:Certificate>
            </smp:Endpoint>
          </smp:ServiceEndpointList>
        </smp:Process>
      </smp:ProcessList>
    </smp:ServiceInformation>
  </smp:ServiceMetadata>
</smp:SignedServiceMetadata>"#;

    #[test]
    fn text_lists_every_endpoint() {
        let md = parse_metadata(XML).unwrap();
        let text = to_text(&md, None);
        assert!(text.contains("process cenbii-procid-ubl::urn:bii04"));
        assert!(text.contains(
            "  busdox-transport-as2-ver1p0 https://ap.example.no/as2 (<unreadable certificate>)"
        ));
        assert!(!text.contains("resolved:"));
    }

    #[test]
    fn selection_uses_the_listed_document() {
        let md = parse_metadata(XML).unwrap();
        let bii04: ProcessId = "cenbii-procid-ubl::urn:bii04".parse().unwrap();
        // The placeholder certificate has no common name.
        let err = select(&md, &bii04).unwrap_err();
        assert!(format!("{err:#}").contains("unusable"));

        let unknown: ProcessId = "cenbii-procid-ubl::urn:unknown".parse().unwrap();
        let err = select(&md, &unknown).unwrap_err();
        assert!(format!("{err:#}").contains("has no process"));
    }

    #[test]
    fn selection_with_real_certificate() {
        let (_, cert) = self_signed(Some("APP_1000000009")).unwrap();
        let b64 = base64_der(&cert.to_der().unwrap());
        let md = parse_metadata(&XML.replace(">AAAA<", &format!(">{b64}<"))).unwrap();
        let bii04: ProcessId = "cenbii-procid-ubl::urn:bii04".parse().unwrap();

        let record = select(&md, &bii04).unwrap();
        assert_eq!(record.common_name, "APP_1000000009");
        assert_eq!(record.address.as_str(), "https://ap.example.no/as2");
        let text = to_text(&md, Some(&record));
        assert!(text.contains("resolved: busdox-transport-as2-ver1p0 https://ap.example.no/as2 (APP_1000000009)"));
    }

    #[test]
    fn json_shape() {
        let md = parse_metadata(XML).unwrap();
        let v = to_json(&md, None);
        assert_eq!(v["participant"], "iso6523-actorid-upis::9908:810017902");
        assert_eq!(v["processes"][0]["endpoints"][0]["address"], "https://ap.example.no/as2");
        assert!(v["processes"][0]["endpoints"][0]["common_name"].is_null());
        assert!(v["resolved"].is_null());
    }
}
