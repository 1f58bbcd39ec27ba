//! # Outbound Sender
//!
//! Runs one transmission end to end:
//!
//! 1. derive the sender system identifier from the keystore certificate;
//! 2. resolve the recipient endpoint (skipped when the request carries one);
//! 3. derive the recipient system identifier from the endpoint certificate;
//! 4. sign the payload;
//! 5. POST it and classify the response.
//!
//! Both system identifiers are validated before anything is signed or
//! sent. Nothing is retried.

use std::sync::Arc;

use apx_as2::{
    sign_with, As2Client, DispositionNotification, PemKeystore, SenderKeystore,
    TransmissionOutcome, PAYLOAD_MIME_TYPE,
};
use apx_core::{
    ConfigurationError, DocumentTypeId, ParticipantId, ProcessId, SystemIdentifier, TransmissionId,
};
use apx_smp::{EndpointRecord, SmpClient};

use crate::config::OutboundConfig;
use crate::error::OutboundError;

/// A document to deliver.
#[derive(Debug, Clone)]
pub struct TransmissionRequest {
    /// Sending participant.
    pub sender: ParticipantId,
    /// Receiving participant; drives the SMP lookup.
    pub recipient: ParticipantId,
    /// Document type to look up.
    pub document_type: DocumentTypeId,
    /// Process selecting the receiver certificate.
    pub process: ProcessId,
    /// Business document bytes, sent as `application/xml`.
    pub payload: Vec<u8>,
    /// Pre-resolved endpoint. When set no SMP lookup is made.
    pub endpoint: Option<EndpointRecord>,
}

/// An accepted transmission.
#[derive(Debug, Clone)]
pub struct TransmissionResponse {
    /// Id sent as `Message-ID`.
    pub transmission_id: TransmissionId,
    /// Where the document went.
    pub endpoint: EndpointRecord,
    /// The receiver's receipt.
    pub disposition: DispositionNotification,
}

/// Resolve, sign and send.
#[derive(Clone)]
pub struct OutboundSender {
    smp: SmpClient,
    as2: As2Client,
    keystore: Arc<dyn SenderKeystore>,
}

impl std::fmt::Debug for OutboundSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundSender")
            .field("smp", &self.smp)
            .field("as2", &self.as2)
            .finish_non_exhaustive()
    }
}

impl OutboundSender {
    /// Assemble a sender from ready-made parts.
    pub fn new(smp: SmpClient, as2: As2Client, keystore: Arc<dyn SenderKeystore>) -> Self {
        Self { smp, as2, keystore }
    }

    /// Build clients and load the PEM keystore from `config`.
    pub fn from_config(config: OutboundConfig) -> Result<Self, OutboundError> {
        let keystore = PemKeystore::load(&config.keystore)?;
        Ok(Self::new(
            SmpClient::new(config.smp)?,
            As2Client::new(config.as2)?,
            Arc::new(keystore),
        ))
    }

    pub fn smp(&self) -> &SmpClient {
        &self.smp
    }

    /// Deliver `request`; any outcome but `Accepted` is an error.
    pub async fn send(
        &self,
        request: TransmissionRequest,
    ) -> Result<TransmissionResponse, OutboundError> {
        let (endpoint, outcome) = self.transmit(request).await?;
        let accepted = outcome.into_result()?;
        Ok(TransmissionResponse {
            transmission_id: accepted.transmission_id,
            endpoint,
            disposition: accepted.disposition,
        })
    }

    /// Deliver `request` and hand back the raw outcome together with the
    /// endpoint it was sent to.
    pub async fn transmit(
        &self,
        request: TransmissionRequest,
    ) -> Result<(EndpointRecord, TransmissionOutcome), OutboundError> {
        if request.payload.is_empty() {
            return Err(ConfigurationError::Missing("payload".into()).into());
        }
        let from = self.keystore.system_identifier()?;

        let endpoint = match request.endpoint {
            Some(endpoint) => endpoint,
            None => {
                self.smp
                    .resolve(&request.recipient, &request.document_type, &request.process)
                    .await?
            }
        };
        let to = SystemIdentifier::from_common_name(&endpoint.common_name)?;

        tracing::debug!(
            sender = %request.sender,
            recipient = %request.recipient,
            document_type = %request.document_type,
            from = %from,
            to = %to,
            "Signing outbound document"
        );
        let envelope = sign_with(self.keystore.as_ref(), &request.payload, PAYLOAD_MIME_TYPE)?;

        let outcome = self
            .as2
            .transmit(&endpoint.address, &from, &to, envelope)
            .await?;
        Ok((endpoint, outcome))
    }
}
