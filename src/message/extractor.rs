//! Component extraction: raw RFC 5322 / MIME bytes into an `EmailRecord`

use super::{Attachment, EmailRecord};
use crate::error::{Result, TriageError};
use mail_parser::{MessageParser, MessagePart, MimeHeaders, PartType};
use std::path::Path;

/// Splits raw messages into subject, plain-text body and named attachments
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentExtractor;

impl ComponentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Read and extract a message file; the file name becomes the record id
    pub fn extract_file(&self, path: &Path) -> Result<EmailRecord> {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let raw = std::fs::read(path).map_err(|e| TriageError::Parse {
            file: id.clone(),
            message: format!("Failed to read message file: {}", e),
        })?;

        self.extract(&id, &raw)
    }

    /// Extract components from raw message bytes
    ///
    /// Fails only when the input has no header block to build a MIME tree from.
    /// A missing subject becomes an empty string and undecodable text parts
    /// contribute an empty string to the body.
    pub fn extract(&self, id: &str, raw: &[u8]) -> Result<EmailRecord> {
        let parse_error = |message: &str| TriageError::Parse {
            file: id.to_string(),
            message: message.to_string(),
        };

        if !starts_with_header(raw) {
            return Err(parse_error("Input does not start with a header block"));
        }

        let message = MessageParser::default()
            .parse(raw)
            .ok_or_else(|| parse_error("Message could not be parsed"))?;

        if message.parts.is_empty() {
            return Err(parse_error("Message has no MIME parts"));
        }

        let subject = message.subject().unwrap_or_default().to_string();
        let from = message
            .from()
            .and_then(|addr| addr.first())
            .and_then(|a| a.address())
            .unwrap_or_default()
            .to_string();

        let mut body = String::new();
        let mut attachments = Vec::new();

        for part in &message.parts {
            if is_plain_body(part) {
                if let PartType::Text(text) = &part.body {
                    if part.is_encoding_problem {
                        tracing::warn!("{}: undecodable text part replaced with empty text", id);
                    } else {
                        body.push_str(text);
                    }
                }
                continue;
            }

            if matches!(part.body, PartType::Multipart(_)) {
                continue;
            }

            if let Some(name) = part.attachment_name() {
                tracing::debug!("{}: attachment found: {}", id, name);
                attachments.push(Attachment {
                    name: name.to_string(),
                    content_type: content_type_of(part),
                    data: part.contents().to_vec(),
                });
            }
        }

        // HTML-only messages still need a body to classify
        if body.is_empty() {
            let has_html = message
                .parts
                .iter()
                .any(|p| matches!(p.body, PartType::Html(_)) && p.attachment_name().is_none());
            if has_html {
                if let Some(text) = message.body_text(0) {
                    tracing::debug!("{}: no text/plain part, using converted HTML body", id);
                    body = text.into_owned();
                }
            }
        }

        Ok(EmailRecord {
            id: id.to_string(),
            from,
            subject,
            body: normalize_line_endings(&body),
            attachments,
        })
    }
}

/// True when the first non-blank line looks like `Name: value`
fn starts_with_header(raw: &[u8]) -> bool {
    let first_line = raw
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .find(|line| !line.iter().all(u8::is_ascii_whitespace));

    let Some(line) = first_line else {
        return false;
    };

    match line.iter().position(|b| *b == b':') {
        Some(0) | None => false,
        Some(colon) => line[..colon]
            .iter()
            .all(|b| b.is_ascii_graphic() && *b != b':'),
    }
}

/// Inline text/plain parts (explicit or defaulted) belong to the body
fn is_plain_body(part: &MessagePart) -> bool {
    if !matches!(part.body, PartType::Text(_)) {
        return false;
    }

    let is_attachment = part
        .content_disposition()
        .map(|d| d.is_attachment())
        .unwrap_or(false);
    if is_attachment {
        return false;
    }

    match part.content_type() {
        None => true,
        Some(ct) => {
            ct.ctype().eq_ignore_ascii_case("text")
                && ct
                    .subtype()
                    .map(|s| s.eq_ignore_ascii_case("plain"))
                    .unwrap_or(true)
        }
    }
}

fn content_type_of(part: &MessagePart) -> String {
    match part.content_type() {
        Some(ct) => match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        },
        None => "application/octet-stream".to_string(),
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}
