//! # AS2 Client
//!
//! POSTs a signed envelope to a resolved endpoint and classifies the
//! answer. One client may run any number of concurrent transmissions;
//! each call builds its own [`Transmission`] and shares nothing else.
//!
//! TLS certificate and hostname verification are on. Hostname checks can
//! only be disabled through [`As2Config::danger_accept_invalid_hostnames`].

use std::time::Duration;

use apx_core::SystemIdentifier;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::config::As2Config;
use crate::envelope::SignedEnvelope;
use crate::error::TransmissionError;
use crate::transmission::{AcceptedTransmission, Transmission, TransmissionOutcome};

/// HTTP client for AS2 transmissions.
#[derive(Debug, Clone)]
pub struct As2Client {
    http: reqwest::Client,
    config: As2Config,
}

impl As2Client {
    /// Build a client with the configured timeouts.
    ///
    /// Logs a warning when hostname verification is disabled.
    pub fn new(config: As2Config) -> Result<Self, TransmissionError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs));
        if config.danger_accept_invalid_hostnames {
            tracing::warn!("TLS hostname verification is DISABLED for AS2 transmissions");
            builder = builder.danger_accept_invalid_hostnames(true);
        }
        let http = builder.build().map_err(TransmissionError::Client)?;
        Ok(Self { http, config })
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &As2Config {
        &self.config
    }

    /// Send `envelope` to `endpoint` and report how it ended.
    ///
    /// `Err` is reserved for failures that are not a verdict of the
    /// remote side: invalid header values, transport errors other than a
    /// refused connection, unreadable response bodies, unparseable
    /// receipts.
    pub async fn transmit(
        &self,
        endpoint: &Url,
        sender: &SystemIdentifier,
        recipient: &SystemIdentifier,
        envelope: SignedEnvelope,
    ) -> Result<TransmissionOutcome, TransmissionError> {
        let ready = Transmission::new(endpoint.clone(), sender.clone(), recipient.clone(), envelope)
            .prepare(&self.config.subject, Utc::now())?;
        let transmission_id = *ready.transmission_id();

        tracing::info!(
            transmission_id = %transmission_id,
            endpoint = %endpoint,
            from = %sender,
            to = %recipient,
            "Sending AS2 message"
        );

        let (request, sent) = ready.dispatch(&self.http);
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_connect() => {
                tracing::warn!(
                    transmission_id = %transmission_id,
                    endpoint = %endpoint,
                    error = %e,
                    "AS2 endpoint unreachable"
                );
                return Ok(sent.connectivity_failure(e));
            }
            Err(e) => return Err(sent.transport_failure(e)),
        };

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        tracing::debug!(
            transmission_id = %transmission_id,
            status,
            content_type = ?content_type,
            "AS2 response received"
        );

        // The response is released when `resp` is consumed here, on every path.
        let body = resp
            .bytes()
            .await
            .map_err(|source| TransmissionError::ResponseBody {
                transmission_id,
                status,
                source,
            })?;

        sent.classify(status, content_type.as_deref(), &body)
    }

    /// [`transmit`](Self::transmit), turning every outcome but `Accepted`
    /// into an error.
    pub async fn send(
        &self,
        endpoint: &Url,
        sender: &SystemIdentifier,
        recipient: &SystemIdentifier,
        envelope: SignedEnvelope,
    ) -> Result<AcceptedTransmission, TransmissionError> {
        self.transmit(endpoint, sender, recipient, envelope)
            .await?
            .into_result()
    }
}
