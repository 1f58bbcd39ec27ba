//! # SMP Client
//!
//! Resolves a recipient to an [`EndpointRecord`]:
//!
//! 1. derive the SMP hostname from the participant ([`compute_lookup_hostname`]);
//! 2. `GET http://{hostname}/{participant}/services/{document type}`;
//! 3. parse the metadata ([`parse_metadata`]);
//! 4. select address and certificate.
//!
//! The derived hostname starts with `B-`. `Url` lower-cases hosts, so the
//! request goes to `b-...`; DNS names are case-insensitive and both forms
//! resolve to the same SMP.
//!
//! Every call performs fresh I/O. Nothing is cached between calls and no
//! state is shared, so one client may serve concurrent lookups.

use std::time::Duration;

use apx_core::{
    certificate_fingerprint, common_name_from_der, DocumentTypeId, IdentifierError, ParticipantId,
    ProcessId, SystemIdentifier,
};
use url::Url;

use crate::config::SmpConfig;
use crate::error::ResolutionError;
use crate::hostname::{compute_lookup_hostname, lookup_path};
use crate::metadata::{
    parse_metadata, resolve_certificate, resolve_endpoint_address, ServiceMetadataDocument,
};

/// Where to send a document, and whom to expect there.
///
/// Produced once per resolution call; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRecord {
    /// Transport profile of the selected endpoint.
    pub transport_profile: String,
    /// URL to POST to.
    pub address: Url,
    /// DER bytes of the receiving access point's certificate.
    pub certificate: Vec<u8>,
    /// Subject common name of `certificate`.
    pub common_name: String,
}

impl EndpointRecord {
    /// AS2 system identifier of the receiving access point.
    pub fn system_identifier(&self) -> Result<SystemIdentifier, IdentifierError> {
        SystemIdentifier::from_common_name(&self.common_name)
    }

    /// SHA-256 fingerprint of the endpoint certificate.
    pub fn certificate_fingerprint(&self) -> String {
        certificate_fingerprint(&self.certificate)
    }
}

/// Client for SML/SMP endpoint resolution.
#[derive(Debug, Clone)]
pub struct SmpClient {
    http: reqwest::Client,
    config: SmpConfig,
}

impl SmpClient {
    /// Build a client with the configured connect and request timeouts.
    pub fn new(config: SmpConfig) -> Result<Self, ResolutionError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ResolutionError::Client)?;
        Ok(Self { http, config })
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &SmpConfig {
        &self.config
    }

    /// SML-derived hostname of the participant's SMP.
    pub fn lookup_hostname(&self, participant: &ParticipantId) -> String {
        compute_lookup_hostname(&self.config.sml_root, participant)
    }

    /// Full lookup URL for a participant and document type.
    pub fn lookup_url(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
    ) -> Result<Url, ResolutionError> {
        let path = lookup_path(participant, document_type);
        let raw = match &self.config.smp_override {
            Some(base) => format!("{}{path}", base.as_str().trim_end_matches('/')),
            None => format!("http://{}{path}", self.lookup_hostname(participant)),
        };
        Url::parse(&raw).map_err(|e| {
            ResolutionError::Configuration(apx_core::ConfigurationError::InvalidUrl {
                name: "lookup URL".into(),
                reason: format!("{raw}: {e}"),
            })
        })
    }

    /// Retrieve the raw metadata XML.
    ///
    /// `gzip` and `deflate` content encodings are decoded transparently.
    /// A network failure or a non-success status is an error; an empty
    /// result is never returned in place of a failure.
    pub async fn fetch_metadata(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
    ) -> Result<String, ResolutionError> {
        let url = self.lookup_url(participant, document_type)?;
        self.fetch(&url, participant).await
    }

    /// Retrieve and parse the service metadata.
    pub async fn lookup(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
    ) -> Result<ServiceMetadataDocument, ResolutionError> {
        self.fetch_and_parse(participant, document_type)
            .await
            .map(|(_, metadata)| metadata)
    }

    /// Address of the first endpoint of the first process.
    pub async fn endpoint_address(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
    ) -> Result<Url, ResolutionError> {
        let (url, metadata) = self.fetch_and_parse(participant, document_type).await?;
        let endpoint = resolve_endpoint_address(&metadata).map_err(|source| {
            ResolutionError::MalformedMetadata {
                url: url.to_string(),
                source,
            }
        })?;
        Ok(endpoint.address.clone())
    }

    /// Certificate registered for `process`. `Ok(None)` when no process
    /// matches.
    pub async fn endpoint_certificate(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
        process: &ProcessId,
    ) -> Result<Option<Vec<u8>>, ResolutionError> {
        let metadata = self.lookup(participant, document_type).await?;
        Ok(resolve_certificate(&metadata, process).map(<[u8]>::to_vec))
    }

    /// Resolve the endpoint to transmit to.
    ///
    /// The address follows the first-process/first-endpoint rule, the
    /// certificate follows the process filter. A missing process fails the
    /// call with [`ResolutionError::NoMatchingProcess`].
    pub async fn resolve(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
        process: &ProcessId,
    ) -> Result<EndpointRecord, ResolutionError> {
        let (url, metadata) = self.fetch_and_parse(participant, document_type).await?;
        let endpoint = resolve_endpoint_address(&metadata).map_err(|source| {
            ResolutionError::MalformedMetadata {
                url: url.to_string(),
                source,
            }
        })?;
        let certificate = resolve_certificate(&metadata, process)
            .ok_or_else(|| ResolutionError::NoMatchingProcess {
                url: url.to_string(),
                process: process.clone(),
            })?
            .to_vec();
        let common_name =
            common_name_from_der(&certificate).map_err(|source| ResolutionError::Certificate {
                url: url.to_string(),
                source,
            })?;

        tracing::info!(
            participant = %participant,
            address = %endpoint.address,
            transport_profile = %endpoint.transport_profile,
            common_name = %common_name,
            "Resolved endpoint"
        );

        Ok(EndpointRecord {
            transport_profile: endpoint.transport_profile.clone(),
            address: endpoint.address.clone(),
            certificate,
            common_name,
        })
    }

    async fn fetch(&self, url: &Url, participant: &ParticipantId) -> Result<String, ResolutionError> {
        tracing::debug!(
            hostname = %self.lookup_hostname(participant),
            url = %url,
            "Fetching service metadata"
        );

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ResolutionError::Lookup {
                url: url.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            return Err(match resp.text().await {
                Ok(body) => ResolutionError::LookupStatus {
                    url: url.to_string(),
                    status,
                    body,
                },
                Err(source) => ResolutionError::LookupStatusBody {
                    url: url.to_string(),
                    status,
                    source,
                },
            });
        }

        resp.text().await.map_err(|source| ResolutionError::Lookup {
            url: url.to_string(),
            source,
        })
    }

    async fn fetch_and_parse(
        &self,
        participant: &ParticipantId,
        document_type: &DocumentTypeId,
    ) -> Result<(Url, ServiceMetadataDocument), ResolutionError> {
        let url = self.lookup_url(participant, document_type)?;
        let xml = self.fetch(&url, participant).await?;
        match parse_metadata(&xml) {
            Ok(metadata) => Ok((url, metadata)),
            Err(source) => Err(ResolutionError::MalformedMetadata {
                url: url.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> ParticipantId {
        ParticipantId::new("iso6523-actorid-upis", "9908:810017902").unwrap()
    }

    fn invoice() -> DocumentTypeId {
        DocumentTypeId::new("busdox-docid-qns", "urn:invoice::2.0").unwrap()
    }

    #[test]
    fn lookup_url_uses_derived_hostname() {
        let client = SmpClient::new(SmpConfig::default()).unwrap();
        let url = client.lookup_url(&participant(), &invoice()).unwrap();
        // Host is lower-cased by `Url`; the SML name itself keeps `B-`.
        assert_eq!(
            client.lookup_hostname(&participant()),
            "B-ddc207601e442e1b751e5655d39371cd.iso6523-actorid-upis.sml.peppolcentral.org"
        );
        assert_eq!(
            url.as_str(),
            "http://b-ddc207601e442e1b751e5655d39371cd.iso6523-actorid-upis.sml.peppolcentral.org/iso6523-actorid-upis%3A%3A9908%3A810017902/services/busdox-docid-qns%3A%3Aurn%3Ainvoice%3A%3A2.0"
        );
    }

    #[test]
    fn lookup_url_respects_override() {
        let client = SmpClient::new(SmpConfig::local_mock("http://127.0.0.1:8080/smp/").unwrap()).unwrap();
        let url = client.lookup_url(&participant(), &invoice()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/smp/iso6523-actorid-upis%3A%3A9908%3A810017902/services/busdox-docid-qns%3A%3Aurn%3Ainvoice%3A%3A2.0"
        );
        // The SML-derived name is still computed.
        assert_eq!(
            client.lookup_hostname(&participant()),
            "B-ddc207601e442e1b751e5655d39371cd.iso6523-actorid-upis.sml.peppolcentral.org"
        );
    }
}
