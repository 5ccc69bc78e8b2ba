use incident_core::EmailData;
use mailparse::parse_mail;
use mailparse::MailHeaderMap;
use mailparse::ParsedMail;

use crate::errors::ParseError;

/// Extracts the `EmailData` fields out of a raw MIME message.
pub fn parse_email(raw: &[u8]) -> Result<EmailData, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::EmptyBody);
    }

    let mail = parse_mail(raw).map_err(|e| ParseError::ParseMime(e.to_string()))?;
    let headers = &mail.headers;

    let from = headers.get_first_value("From").unwrap_or_default();
    let to = headers.get_first_value("To").unwrap_or_default();
    let cc = headers.get_first_value("Cc").unwrap_or_default();
    let subject = headers.get_first_value("Subject").unwrap_or_default();
    let date = headers.get_first_value("Date").unwrap_or_default();
    let original_message_id = headers.get_first_value("Message-ID").unwrap_or_default();
    let mime_version = headers.get_first_value("MIME-Version").unwrap_or_default();
    let content_type = mail.ctype.mimetype.clone();
    let content_transfer_encoding = headers
        .get_first_value("Content-Transfer-Encoding")
        .unwrap_or_default();

    let body = extract_text_body(&mail).ok_or(ParseError::EmptyData)?;
    if body.trim().is_empty() {
        return Err(ParseError::EmptyBody);
    }

    let file_name = find_first_attachment(&mail);

    Ok(EmailData {
        from,
        to,
        cc,
        subject,
        date,
        original_message_id,
        mime_version,
        content_type,
        content_transfer_encoding,
        body,
        file_name,
    })
}

/// Depth-first search for the first `text/plain` part, falling back to
/// `text/html` and finally the top-level body for a non-multipart message.
fn extract_text_body(mail: &ParsedMail) -> Option<String> {
    if mail.subparts.is_empty() {
        return mail.get_body().ok();
    }

    for part in &mail.subparts {
        if part.ctype.mimetype == "text/plain" {
            if let Ok(body) = part.get_body() {
                return Some(body);
            }
        }
    }
    for part in &mail.subparts {
        if part.ctype.mimetype.starts_with("multipart/") {
            if let Some(body) = extract_text_body(part) {
                return Some(body);
            }
        }
    }
    for part in &mail.subparts {
        if part.ctype.mimetype == "text/html" {
            if let Ok(body) = part.get_body() {
                return Some(body);
            }
        }
    }
    None
}

/// Finds the filename of the first part with `Content-Disposition:
/// attachment`, scanning depth-first.
fn find_first_attachment(mail: &ParsedMail) -> Option<String> {
    for part in &mail.subparts {
        if let Ok(disposition) = part.get_content_disposition() {
            if disposition.disposition == mailparse::DispositionType::Attachment {
                if let Some(name) = disposition.params.get("filename") {
                    return Some(name.clone());
                }
            }
        }
        if let Some(name) = part.ctype.params.get("name") {
            return Some(name.clone());
        }
        if let Some(found) = find_first_attachment(part) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(parse_email(b""), Err(ParseError::EmptyBody)));
    }

    #[test]
    fn parses_plain_text_message() {
        let raw = b"From: a@x\r\nTo: b@x\r\nSubject: S\r\nX-Message-ID: M1\r\n\r\nhello\r\n";
        let email = parse_email(raw).unwrap();
        assert_eq!(email.from, "a@x");
        assert_eq!(email.subject, "S");
        assert_eq!(email.body.trim(), "hello");
        assert!(email.file_name.is_none());
    }

    #[test]
    fn rejects_blank_body() {
        let raw = b"From: a@x\r\nTo: b@x\r\nSubject: S\r\n\r\n   \r\n";
        assert!(matches!(parse_email(raw), Err(ParseError::EmptyBody)));
    }
}
