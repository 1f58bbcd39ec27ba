//! # apx-outbound - Outbound Sending
//!
//! Caller-facing entry point tying endpoint resolution (`apx-smp`) to
//! secure transmission (`apx-as2`):
//!
//! ```text
//! TransmissionRequest ─▶ SmpClient::resolve ─▶ sign ─▶ As2Client::transmit ─▶ TransmissionResponse
//! ```
//!
//! ## Crate Policy
//!
//! - No retries, queueing or persistence; callers own those.
//! - Stage errors are kept distinct in [`OutboundError`].

pub mod config;
pub mod error;
pub mod sender;

pub use config::OutboundConfig;
pub use error::OutboundError;
pub use sender::{OutboundSender, TransmissionRequest, TransmissionResponse};
