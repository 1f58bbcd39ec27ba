//! # Transmission Typestate
//!
//! One AS2 transmission moves through three states before it settles on
//! an outcome:
//!
//! ```text
//! Building ──prepare()──▶ HeadersReady ──dispatch()──▶ Sent ──classify()──▶ TransmissionOutcome
//!                                            │
//!                                            └── connect failure ──▶ ConnectivityFailure
//! ```
//!
//! - `Building`: endpoint, both system identifiers and the signed envelope
//!   are in hand. Both identifiers are validated types, so a transmission
//!   cannot exist without them.
//! - `HeadersReady`: a fresh [`TransmissionId`] has been generated and the
//!   header set is fixed. The id only ever exists for a signed envelope.
//! - `Sent`: the POST went out and a response status arrived.
//!
//! Calling `classify()` on a `Transmission<Building>` is a compile error.

use std::borrow::Cow;

use apx_core::{SystemIdentifier, TransmissionId};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use url::Url;

use crate::envelope::SignedEnvelope;
use crate::error::TransmissionError;
use crate::headers::As2Headers;
use crate::mdn::{parse_receipt, DispositionNotification};

// ─── State Types ─────────────────────────────────────────────────────

/// Transmission state: inputs assembled, nothing generated yet.
#[derive(Debug, Clone, Copy)]
pub struct Building;

/// Transmission state: id generated, headers fixed.
#[derive(Debug, Clone)]
pub struct HeadersReady {
    transmission_id: TransmissionId,
    headers: HeaderMap,
}

/// Transmission state: request delivered, response pending classification.
#[derive(Debug, Clone)]
pub struct Sent {
    transmission_id: TransmissionId,
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Building {}
    impl Sealed for super::HeadersReady {}
    impl Sealed for super::Sent {}
}

/// Marker trait for transmission states. Sealed.
pub trait TransmissionState: private::Sealed + std::fmt::Debug {
    fn name() -> &'static str;
}

impl TransmissionState for Building {
    fn name() -> &'static str {
        "BUILDING"
    }
}
impl TransmissionState for HeadersReady {
    fn name() -> &'static str {
        "HEADERS_READY"
    }
}
impl TransmissionState for Sent {
    fn name() -> &'static str {
        "SENT"
    }
}

// ─── Outcome ─────────────────────────────────────────────────────────

/// How a transmission ended, as far as the remote endpoint is concerned.
#[derive(Debug)]
pub enum TransmissionOutcome {
    /// 200 with a parseable receipt. The disposition text is not judged.
    Accepted {
        transmission_id: TransmissionId,
        disposition: DispositionNotification,
    },
    /// Any status other than 200. The body is kept byte for byte.
    Rejected {
        transmission_id: TransmissionId,
        status: u16,
        body: Vec<u8>,
    },
    /// The endpoint could not be reached.
    ConnectivityFailure {
        transmission_id: TransmissionId,
        endpoint: Url,
        source: reqwest::Error,
    },
    /// 200 without a usable receipt.
    ProtocolViolation {
        transmission_id: TransmissionId,
        reason: String,
    },
}

/// A transmission the endpoint accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTransmission {
    /// Id sent as `Message-ID`.
    pub transmission_id: TransmissionId,
    /// The parsed receipt.
    pub disposition: DispositionNotification,
}

impl TransmissionOutcome {
    pub fn transmission_id(&self) -> &TransmissionId {
        match self {
            Self::Accepted { transmission_id, .. }
            | Self::Rejected { transmission_id, .. }
            | Self::ConnectivityFailure { transmission_id, .. }
            | Self::ProtocolViolation { transmission_id, .. } => transmission_id,
        }
    }

    /// Rejection body decoded for display; invalid UTF-8 is replaced.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Rejected { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }

    /// Whether the endpoint returned a usable receipt.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Name of the terminal state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "ACCEPTED",
            Self::Rejected { .. } => "REJECTED",
            Self::ConnectivityFailure { .. } => "CONNECTIVITY_FAILURE",
            Self::ProtocolViolation { .. } => "PROTOCOL_VIOLATION",
        }
    }

    /// Everything but `Accepted` becomes the matching error.
    pub fn into_result(self) -> Result<AcceptedTransmission, TransmissionError> {
        match self {
            Self::Accepted {
                transmission_id,
                disposition,
            } => Ok(AcceptedTransmission {
                transmission_id,
                disposition,
            }),
            Self::Rejected {
                transmission_id,
                status,
                body,
            } => Err(TransmissionError::Rejected {
                transmission_id,
                status,
                body,
            }),
            Self::ConnectivityFailure {
                transmission_id,
                endpoint,
                source,
            } => Err(TransmissionError::Connectivity {
                transmission_id,
                endpoint: endpoint.to_string(),
                source,
            }),
            Self::ProtocolViolation {
                transmission_id,
                reason,
            } => Err(TransmissionError::ProtocolViolation {
                transmission_id,
                reason,
            }),
        }
    }
}

// ─── Transmission ────────────────────────────────────────────────────

/// A single AS2 transmission in state `S`.
#[derive(Debug)]
pub struct Transmission<S: TransmissionState> {
    endpoint: Url,
    sender: SystemIdentifier,
    recipient: SystemIdentifier,
    envelope: SignedEnvelope,
    state: S,
}

impl<S: TransmissionState> Transmission<S> {
    pub fn state_name(&self) -> &'static str {
        S::name()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn sender(&self) -> &SystemIdentifier {
        &self.sender
    }

    pub fn recipient(&self) -> &SystemIdentifier {
        &self.recipient
    }

    fn with_state<T: TransmissionState>(self, state: T) -> Transmission<T> {
        Transmission {
            endpoint: self.endpoint,
            sender: self.sender,
            recipient: self.recipient,
            envelope: self.envelope,
            state,
        }
    }
}

impl Transmission<Building> {
    pub fn new(
        endpoint: Url,
        sender: SystemIdentifier,
        recipient: SystemIdentifier,
        envelope: SignedEnvelope,
    ) -> Self {
        Self {
            endpoint,
            sender,
            recipient,
            envelope,
            state: Building,
        }
    }

    /// Generate the transmission id and fix the header set.
    pub fn prepare(
        self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<Transmission<HeadersReady>, TransmissionError> {
        let transmission_id = TransmissionId::new();
        let headers = As2Headers {
            from: &self.sender,
            to: &self.recipient,
            subject,
            message_id: &transmission_id,
            date: now,
            content_type: self.envelope.content_type(),
        }
        .to_header_map()?;

        Ok(self.with_state(HeadersReady {
            transmission_id,
            headers,
        }))
    }
}

impl Transmission<HeadersReady> {
    pub fn transmission_id(&self) -> &TransmissionId {
        &self.state.transmission_id
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.state.headers
    }

    /// Turn into an HTTP request on `http` and move to `Sent`.
    ///
    /// The returned `Transmission<Sent>` is only meaningful once the
    /// request has actually been sent.
    pub fn dispatch(self, http: &reqwest::Client) -> (reqwest::RequestBuilder, Transmission<Sent>) {
        let HeadersReady {
            transmission_id,
            headers,
        } = self.state.clone();
        let request = http
            .post(self.endpoint.clone())
            .headers(headers)
            .body(self.envelope.mime_bytes().to_vec());
        (request, self.with_state(Sent { transmission_id }))
    }
}

impl Transmission<Sent> {
    pub fn transmission_id(&self) -> &TransmissionId {
        &self.state.transmission_id
    }

    /// The request never reached the endpoint.
    pub fn connectivity_failure(self, source: reqwest::Error) -> TransmissionOutcome {
        TransmissionOutcome::ConnectivityFailure {
            transmission_id: self.state.transmission_id,
            endpoint: self.endpoint,
            source,
        }
    }

    /// Any other failure while sending.
    pub fn transport_failure(self, source: reqwest::Error) -> TransmissionError {
        TransmissionError::Transport {
            transmission_id: self.state.transmission_id,
            endpoint: self.endpoint.to_string(),
            source,
        }
    }

    /// Classify the response.
    ///
    /// - status other than 200: `Rejected` with the body as received
    /// - 200 without `Content-Type` or with an empty body: `ProtocolViolation`
    /// - 200 with a receipt that does not parse: `Err(MalformedReceipt)`
    /// - otherwise: `Accepted`, whatever the disposition says
    pub fn classify(
        self,
        status: u16,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<TransmissionOutcome, TransmissionError> {
        let transmission_id = self.state.transmission_id;

        if status != 200 {
            tracing::warn!(
                transmission_id = %transmission_id,
                endpoint = %self.endpoint,
                status,
                body_len = body.len(),
                "AS2 transmission rejected"
            );
            return Ok(TransmissionOutcome::Rejected {
                transmission_id,
                status,
                body: body.to_vec(),
            });
        }

        let Some(content_type) = content_type else {
            return Ok(TransmissionOutcome::ProtocolViolation {
                transmission_id,
                reason: "200 response without Content-Type".into(),
            });
        };
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(TransmissionOutcome::ProtocolViolation {
                transmission_id,
                reason: "200 response with empty body".into(),
            });
        }

        let disposition = match parse_receipt(&String::from_utf8_lossy(body), content_type) {
            Ok(disposition) => disposition,
            Err(source) => {
                return Err(TransmissionError::MalformedReceipt {
                    transmission_id,
                    source,
                })
            }
        };

        if !disposition.is_processed() {
            tracing::warn!(
                transmission_id = %transmission_id,
                disposition = ?disposition.disposition,
                text = %disposition.text,
                "Receipt does not report plain processed; treating as accepted"
            );
        }
        tracing::info!(
            transmission_id = %transmission_id,
            endpoint = %self.endpoint,
            "AS2 transmission accepted"
        );

        Ok(TransmissionOutcome::Accepted {
            transmission_id,
            disposition,
        })
    }
}
