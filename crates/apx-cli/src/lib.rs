//! # apx-cli - Access Point Transport CLI
//!
//! Provides the `apx` command for operating the transport by hand.
//!
//! ## Subcommands
//!
//! - `apx hostname`: SML hostname (and lookup URL) for a participant.
//! - `apx lookup`: fetch and print SMP metadata, optionally resolve one endpoint.
//! - `apx sign`: wrap a document in a signed S/MIME envelope.
//! - `apx send`: resolve, sign and deliver a document over AS2.
//!
//! ```bash
//! apx hostname iso6523-actorid-upis::9908:810017902
//! apx lookup iso6523-actorid-upis::9908:810017902 'busdox-docid-qns::urn:...::2.0' --process 'cenbii-procid-ubl::urn:www.cenbii.eu:profile:bii04:ver1.0'
//! APX_KEY_PEM=key.pem APX_CERT_PEM=cert.pem apx send invoice.xml --sender ... --recipient ... --document-type ... --process ...
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; transport logic lives in the domain crates.
//! - Handlers return an exit code; errors go through `anyhow` with context.

pub mod hostname;
pub mod lookup;
pub mod send;
pub mod sign;

use std::future::Future;

use anyhow::{Context, Result};

/// Drive an async handler on a single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
