//! Retrieved message data.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::MessageId;

/// Summary of a message as returned by a metadata fetch.
///
/// Fields that were not requested are left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Zero-based index in the folder at fetch time.
    pub index: u32,
    /// Unique identifier.
    pub id: MessageId,
    /// Subject.
    pub subject: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Date from the envelope.
    pub date: Option<DateTime<Utc>>,
    /// Message size in bytes.
    pub size: Option<u32>,
    /// Flags, as IMAP strings (`\Seen`, keywords).
    pub flags: Vec<String>,
    /// `Message-ID` header.
    pub message_id: Option<String>,
}

impl MessageSummary {
    /// Creates a summary carrying only position and identity.
    #[must_use]
    pub const fn new(index: u32, id: MessageId) -> Self {
        Self {
            index,
            id,
            subject: None,
            from: None,
            to: Vec::new(),
            date: None,
            size: None,
            flags: Vec::new(),
            message_id: None,
        }
    }

    /// Returns true if the message carries the `\Seen` flag.
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case("\\Seen"))
    }
}

/// A complete message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Zero-based index in the folder, when retrieved by position.
    pub index: Option<u32>,
    /// `Message-ID` header, if present.
    pub message_id: Option<String>,
    /// Raw RFC 5322 content.
    pub raw: Bytes,
}

impl Message {
    /// Creates a message from its identifier and raw content.
    #[must_use]
    pub fn new(id: MessageId, raw: impl Into<Bytes>) -> Self {
        let raw = raw.into();
        let message_id = header_value(&raw, "message-id");
        Self {
            id,
            index: None,
            message_id,
            raw,
        }
    }

    /// Records the folder index the message was retrieved from.
    #[must_use]
    pub const fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Returns the raw content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns true if the raw content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Finds an unfolded header value in the header block of a raw message.
pub(crate) fn header_value(raw: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        if line.is_empty() {
            break;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case(name) {
            continue;
        }
        let mut value = value.trim().to_string();
        while let Some(next) = lines.peek() {
            if next.starts_with(' ') || next.starts_with('\t') {
                value.push(' ');
                value.push_str(next.trim());
                lines.next();
            } else {
                break;
            }
        }
        return Some(value);
    }
    None
}
