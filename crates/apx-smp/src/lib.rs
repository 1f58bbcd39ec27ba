//! # apx-smp - Endpoint Resolution
//!
//! Finds where to deliver a document and which certificate the receiver
//! presents, using the DNS-hash based SML/SMP discovery scheme:
//!
//! - [`hostname`]: participant identifier → SMP hostname (MD5 + DNS label).
//! - [`client`]: HTTP retrieval of service metadata, endpoint selection.
//! - [`metadata`]: XML parsing into [`ServiceMetadataDocument`], independent
//!   of networking.
//!
//! ## Lookup URL
//!
//! `http://B-{md5hex}.{scheme}.{sml_root}/{urlencode(scheme::value)}/services/{urlencode(docScheme::docValue)}`
//!
//! ## Crate Policy
//!
//! - No resolution results are cached; every call performs fresh I/O.
//! - Failures are returned as [`ResolutionError`], never logged and dropped.
//! - No retries. Retry policy belongs to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod hostname;
pub mod metadata;

pub use client::{EndpointRecord, SmpClient};
pub use config::SmpConfig;
pub use error::{MalformedMetadataError, ResolutionError};
pub use hostname::{compute_lookup_hostname, lookup_path};
pub use metadata::{
    parse_metadata, resolve_certificate, resolve_endpoint_address, EndpointEntry, ProcessEntry,
    ServiceMetadataDocument,
};
