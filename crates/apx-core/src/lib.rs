#![deny(missing_docs)]

//! # apx-core - Foundational Types for the Access Point Transport
//!
//! Leaf crate of the workspace. Defines the value types shared by endpoint
//! resolution (`apx-smp`) and secure transmission (`apx-as2`):
//!
//! - **Identifiers**: `ParticipantId`, `DocumentTypeId`, `ProcessId`, each a
//!   `scheme` + `value` pair with the `scheme::value` wire form.
//! - **`TransmissionId`**: random v4 token used as the AS2 `Message-ID`.
//! - **`SystemIdentifier`**: validated AS2 system identity derived from an
//!   X.509 subject common name.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `apx-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Identifiers are immutable once constructed; every constructor validates.

pub mod certificate;
pub mod error;
pub mod identity;
pub mod system_id;

pub use certificate::{certificate_fingerprint, common_name, common_name_from_der};
pub use error::{ConfigurationError, IdentifierError};
pub use identity::{DocumentTypeId, IdentifierKind, ParticipantId, ProcessId, TransmissionId};
pub use system_id::SystemIdentifier;
