//! # Receipt Inspection
//!
//! Reads the synchronous MDN (RFC 3798) returned in a successful AS2
//! response:
//!
//! ```text
//! multipart/signed
//! ├── multipart/report; report-type=disposition-notification
//! │   ├── text/plain                          <- human-readable summary
//! │   └── message/disposition-notification    <- machine-readable fields
//! └── application/pkcs7-signature
//! ```
//!
//! An unsigned `multipart/report` at the top level is accepted as well.
//! The receipt signature is not verified here.

use mailparse::{MailHeaderMap, ParsedMail};

use crate::error::MalformedReceiptError;

const MULTIPART_SIGNED: &str = "multipart/signed";
const MULTIPART_REPORT: &str = "multipart/report";
const TEXT_PLAIN: &str = "text/plain";
const DISPOSITION_NOTIFICATION: &str = "message/disposition-notification";

/// What the receiving access point said about the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispositionNotification {
    /// Plain-text summary from the `text/plain` part.
    pub text: String,
    /// `Disposition` field, e.g. `automatic-action/MDN-sent-automatically; processed`.
    pub disposition: Option<String>,
    /// `Original-Message-ID`; should echo the transmission id.
    pub original_message_id: Option<String>,
    /// `Received-Content-MIC`.
    pub received_content_mic: Option<String>,
    /// `Final-Recipient`.
    pub final_recipient: Option<String>,
    /// `Reporting-UA`.
    pub reporting_ua: Option<String>,
}

impl DispositionNotification {
    /// `true` when the `Disposition` field reports plain `processed`
    /// without an error or warning modifier. `false` when it is absent.
    pub fn is_processed(&self) -> bool {
        let Some(disposition) = &self.disposition else {
            return false;
        };
        let Some((_, kind)) = disposition.rsplit_once(';') else {
            return false;
        };
        kind.trim().eq_ignore_ascii_case("processed")
    }
}

/// Parse a receipt body using the response `Content-Type`.
pub fn parse_receipt(
    body: &str,
    content_type: &str,
) -> Result<DispositionNotification, MalformedReceiptError> {
    let declared: mime::Mime =
        content_type
            .parse()
            .map_err(|e: mime::FromStrError| MalformedReceiptError::InvalidContentType {
                value: content_type.to_string(),
                reason: e.to_string(),
            })?;
    if declared.type_() != mime::MULTIPART {
        return Err(MalformedReceiptError::UnexpectedStructure {
            expected: "multipart content",
            found: declared.essence_str().to_string(),
        });
    }

    let raw = format!("Content-Type: {content_type}\r\n\r\n{body}");
    let mail =
        mailparse::parse_mail(raw.as_bytes()).map_err(|e| MalformedReceiptError::Mime(e.to_string()))?;

    let report = report_part(&mail)?;
    let text = find_part(report, TEXT_PLAIN)
        .ok_or(MalformedReceiptError::MissingPart(TEXT_PLAIN))?
        .get_body()
        .map_err(|e| MalformedReceiptError::Mime(e.to_string()))?
        .trim()
        .to_string();

    let mut notification = DispositionNotification {
        text,
        ..Default::default()
    };
    if let Some(part) = find_part(report, DISPOSITION_NOTIFICATION) {
        let fields = part
            .get_body()
            .map_err(|e| MalformedReceiptError::Mime(e.to_string()))?;
        let (headers, _) = mailparse::parse_headers(fields.trim_start().as_bytes())
            .map_err(|e| MalformedReceiptError::Mime(e.to_string()))?;
        notification.disposition = headers.get_first_value("Disposition");
        notification.original_message_id = headers.get_first_value("Original-Message-ID");
        notification.received_content_mic = headers.get_first_value("Received-Content-MIC");
        notification.final_recipient = headers.get_first_value("Final-Recipient");
        notification.reporting_ua = headers.get_first_value("Reporting-UA");
    }
    Ok(notification)
}

fn report_part<'m, 'a>(mail: &'m ParsedMail<'a>) -> Result<&'m ParsedMail<'a>, MalformedReceiptError> {
    let found = mail.ctype.mimetype.to_ascii_lowercase();
    match found.as_str() {
        MULTIPART_REPORT => Ok(mail),
        MULTIPART_SIGNED => {
            let first = mail
                .subparts
                .first()
                .ok_or(MalformedReceiptError::MissingPart(MULTIPART_REPORT))?;
            if first.ctype.mimetype.eq_ignore_ascii_case(MULTIPART_REPORT) {
                Ok(first)
            } else {
                Err(MalformedReceiptError::UnexpectedStructure {
                    expected: "multipart/report inside multipart/signed",
                    found: first.ctype.mimetype.clone(),
                })
            }
        }
        _ => Err(MalformedReceiptError::UnexpectedStructure {
            expected: "multipart/signed or multipart/report",
            found,
        }),
    }
}

fn find_part<'m, 'a>(report: &'m ParsedMail<'a>, mimetype: &str) -> Option<&'m ParsedMail<'a>> {
    report
        .subparts
        .iter()
        .find(|p| p.ctype.mimetype.eq_ignore_ascii_case(mimetype))
}

/// Receipt bodies for unit tests.
#[cfg(test)]
pub(crate) mod fixtures {
    pub const SIGNED_CONTENT_TYPE: &str = "multipart/signed; protocol=\"application/pkcs7-signature\"; micalg=sha1; boundary=\"----=_Part_outer\"";

    pub fn signed_receipt(disposition: &str) -> String {
        format!(
            "------=_Part_outer\n\
             Content-Type: multipart/report; report-type=disposition-notification; boundary=\"----=_Part_report\"\n\
             \n\
             ------=_Part_report\n\
             Content-Type: text/plain; charset=us-ascii\n\
             Content-Transfer-Encoding: 7bit\n\
             \n\
             The message was received and handed over to the recipient.\n\
             ------=_Part_report\n\
             Content-Type: message/disposition-notification\n\
             Content-Transfer-Encoding: 7bit\n\
             \n\
             Reporting-UA: Test Access Point\n\
             Original-Recipient: rfc822; APP_1000000009\n\
             Final-Recipient: rfc822; APP_1000000009\n\
             Original-Message-ID: 6f1c3e0a-8a3b-4a55-9d6e-2f6b9a0c1d2e\n\
             Disposition: {disposition}\n\
             Received-Content-MIC: 3ZiIjHHlIjkPbCRAnEf5Q7VCiPM=, sha1\n\
             \n\
             ------=_Part_report--\n\
             \n\
             ------=_Part_outer\n\
             Content-Type: application/pkcs7-signature; name=smime.p7s\n\
             Content-Transfer-Encoding: base64\n\
             \n\
             AAAA\n\
             ------=_Part_outer--\n"
        )
        .replace('\n', "\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    const PROCESSED: &str = "automatic-action/MDN-sent-automatically; processed";

    #[test]
    fn signed_receipt_yields_text_and_fields() {
        let mdn = parse_receipt(&signed_receipt(PROCESSED), SIGNED_CONTENT_TYPE).unwrap();
        assert_eq!(
            mdn.text,
            "The message was received and handed over to the recipient."
        );
        assert_eq!(mdn.disposition.as_deref(), Some(PROCESSED));
        assert_eq!(
            mdn.original_message_id.as_deref(),
            Some("6f1c3e0a-8a3b-4a55-9d6e-2f6b9a0c1d2e")
        );
        assert_eq!(
            mdn.received_content_mic.as_deref(),
            Some("3ZiIjHHlIjkPbCRAnEf5Q7VCiPM=, sha1")
        );
        assert_eq!(mdn.final_recipient.as_deref(), Some("rfc822; APP_1000000009"));
        assert_eq!(mdn.reporting_ua.as_deref(), Some("Test Access Point"));
        assert!(mdn.is_processed());
    }

    #[test]
    fn unsigned_report_is_accepted() {
        let body = "--r\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    ok\r\n\
                    --r--\r\n";
        let mdn = parse_receipt(
            body,
            "multipart/report; report-type=disposition-notification; boundary=r",
        )
        .unwrap();
        assert_eq!(mdn.text, "ok");
        assert!(mdn.disposition.is_none());
        assert!(!mdn.is_processed());
    }

    #[test]
    fn error_disposition_is_not_processed() {
        let mdn = parse_receipt(
            &signed_receipt("automatic-action/MDN-sent-automatically; processed/error: unexpected-processing-error"),
            SIGNED_CONTENT_TYPE,
        )
        .unwrap();
        assert!(!mdn.is_processed());
    }

    #[test]
    fn invalid_content_type() {
        let err = parse_receipt("x", "not a content type").unwrap_err();
        assert!(matches!(err, MalformedReceiptError::InvalidContentType { .. }));
    }

    #[test]
    fn non_multipart_content_type() {
        let err = parse_receipt("<html/>", "text/html").unwrap_err();
        assert_eq!(
            err,
            MalformedReceiptError::UnexpectedStructure {
                expected: "multipart content",
                found: "text/html".into(),
            }
        );
    }

    #[test]
    fn signed_without_report() {
        let body = "--s\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    hello\r\n\
                    --s--\r\n";
        let err = parse_receipt(body, "multipart/signed; boundary=s").unwrap_err();
        assert!(matches!(err, MalformedReceiptError::UnexpectedStructure { .. }));
    }

    #[test]
    fn report_without_text_part() {
        let body = "--r\r\n\
                    Content-Type: message/disposition-notification\r\n\
                    \r\n\
                    Disposition: automatic-action/MDN-sent-automatically; processed\r\n\
                    --r--\r\n";
        let err = parse_receipt(body, "multipart/report; boundary=r").unwrap_err();
        assert_eq!(err, MalformedReceiptError::MissingPart("text/plain"));
    }
}
