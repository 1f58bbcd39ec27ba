//! AS2 request headers (RFC 4130 §6).

use apx_core::{SystemIdentifier, TransmissionId};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, DATE};

use crate::error::TransmissionError;

/// Protocol version sent in `AS2-Version`.
pub const AS2_VERSION: &str = "1.0";

/// Request a synchronous, signed receipt.
pub const DEFAULT_DISPOSITION_NOTIFICATION_OPTIONS: &str =
    "signed-receipt-protocol=required, pkcs7-signature; signed-receipt-micalg=required, sha1";

// AS2 header names, lower-case as `HeaderName` requires.
pub const AS2_FROM: HeaderName = HeaderName::from_static("as2-from");
pub const AS2_TO: HeaderName = HeaderName::from_static("as2-to");
pub const AS2_VERSION_HEADER: HeaderName = HeaderName::from_static("as2-version");
pub const DISPOSITION_NOTIFICATION_OPTIONS: HeaderName =
    HeaderName::from_static("disposition-notification-options");
pub const MESSAGE_ID: HeaderName = HeaderName::from_static("message-id");
pub const SUBJECT: HeaderName = HeaderName::from_static("subject");

/// Values for one transmission's header set.
#[derive(Debug, Clone)]
pub struct As2Headers<'a> {
    /// Sender, for `AS2-From`.
    pub from: &'a SystemIdentifier,
    /// Receiver, for `AS2-To`.
    pub to: &'a SystemIdentifier,
    pub subject: &'a str,
    /// Becomes `Message-ID`, without angle brackets.
    pub message_id: &'a TransmissionId,
    /// Rendered as RFC 2822.
    pub date: DateTime<Utc>,
    /// The envelope's `multipart/signed` type.
    pub content_type: &'a str,
}

impl As2Headers<'_> {
    /// Build the header map. Same inputs give the same map.
    pub fn to_header_map(&self) -> Result<HeaderMap, TransmissionError> {
        let mut map = HeaderMap::with_capacity(8);
        map.insert(AS2_FROM, value("AS2-From", self.from.as_str())?);
        map.insert(AS2_TO, value("AS2-To", self.to.as_str())?);
        map.insert(
            DISPOSITION_NOTIFICATION_OPTIONS,
            HeaderValue::from_static(DEFAULT_DISPOSITION_NOTIFICATION_OPTIONS),
        );
        map.insert(AS2_VERSION_HEADER, HeaderValue::from_static(AS2_VERSION));
        map.insert(SUBJECT, value("Subject", self.subject)?);
        map.insert(MESSAGE_ID, value("Message-ID", &self.message_id.to_string())?);
        map.insert(DATE, value("Date", &format_date(&self.date))?);
        map.insert(CONTENT_TYPE, value("Content-Type", self.content_type)?);
        Ok(map)
    }
}

/// RFC 2822 date with a two-digit day, e.g. `Tue, 01 Jul 2003 10:52:37 +0000`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S %z").to_string()
}

fn value(name: &'static str, raw: &str) -> Result<HeaderValue, TransmissionError> {
    HeaderValue::from_str(raw).map_err(|e| TransmissionError::InvalidHeader {
        name,
        reason: e.to_string(),
    })
}
