//! # apx-as2 - Secure Transmission
//!
//! Delivers a signed business document to a resolved access point over
//! AS2 (RFC 4130) and interprets the synchronous receipt.
//!
//! - [`keystore`]: read-only sender key material.
//! - [`envelope`]: S/MIME `multipart/signed` construction and verification.
//! - [`headers`]: the AS2 header set.
//! - [`transmission`]: per-transmission typestate and outcome classification.
//! - [`client`]: HTTPS POST with connect/request timeouts.
//! - [`mdn`]: disposition notification parsing.
//!
//! ## Outcomes
//!
//! | Response | Outcome |
//! |----------|---------|
//! | 200 + `Content-Type` + receipt | `Accepted` (any disposition) |
//! | 200 without `Content-Type` or body | `ProtocolViolation` |
//! | anything but 200 | `Rejected` (status + raw body) |
//! | connection refused / unreachable | `ConnectivityFailure` |
//!
//! ## Crate Policy
//!
//! - No retries, no queueing. Every call performs one POST.
//! - Hostname verification is on unless explicitly disabled by config.
//! - A `TransmissionId` is generated only after the envelope is signed.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod keystore;
pub mod mdn;
pub mod transmission;

pub use client::As2Client;
pub use config::As2Config;
pub use envelope::{sign, sign_with, SignedEnvelope, PAYLOAD_MIME_TYPE};
pub use error::{KeystoreError, MalformedReceiptError, SigningError, TransmissionError, VerificationError};
pub use keystore::{KeystoreConfig, PemKeystore, SenderKeystore};
pub use mdn::{parse_receipt, DispositionNotification};
pub use transmission::{AcceptedTransmission, Transmission, TransmissionOutcome};
