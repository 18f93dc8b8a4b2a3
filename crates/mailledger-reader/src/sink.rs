//! Message persistence.

use std::borrow::Cow;
use std::path::Path;

use async_trait::async_trait;

use crate::config::ReaderConfig;
use crate::error::Result;
use crate::types::Message;

/// Destination for saved messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Creates a directory and its parents if missing.
    async fn ensure_directory(&self, path: &Path) -> Result<()>;

    /// Returns true if the directory exists.
    async fn directory_exists(&self, path: &Path) -> bool;

    /// Writes one message to `path`, replacing any existing file.
    async fn write(&self, message: &Message, path: &Path) -> Result<()>;
}

/// Writes messages to the local filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSink {
    dos_line_endings: bool,
}

impl FileSink {
    /// Creates a sink. With `dos_line_endings`, bare LF becomes CRLF.
    #[must_use]
    pub const fn new(dos_line_endings: bool) -> Self {
        Self { dos_line_endings }
    }

    /// Creates a sink using the line ending setting of a reader
    /// configuration.
    #[must_use]
    pub const fn from_config(config: &ReaderConfig) -> Self {
        Self::new(config.dos_line_endings)
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl MessageSink for FileSink {
    async fn ensure_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn directory_exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .is_ok_and(|meta| meta.is_dir())
    }

    async fn write(&self, message: &Message, path: &Path) -> Result<()> {
        let contents = if self.dos_line_endings {
            to_crlf(&message.raw)
        } else {
            Cow::Borrowed(message.raw.as_ref())
        };
        tokio::fs::write(path, contents).await?;
        tracing::trace!(id = %message.id, path = %path.display(), "Saved message");
        Ok(())
    }
}

/// Converts bare LF line endings to CRLF.
fn to_crlf(raw: &[u8]) -> Cow<'_, [u8]> {
    let bare = raw
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'\n' && (i == 0 || raw[i - 1] != b'\r'))
        .count();
    if bare == 0 {
        return Cow::Borrowed(raw);
    }
    let mut out = Vec::with_capacity(raw.len() + bare);
    let mut prev = 0u8;
    for &b in raw {
        if b == b'\n' && prev != b'\r' {
            out.push(b'\r');
        }
        out.push(b);
        prev = b;
    }
    Cow::Owned(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::MessageId;

    #[test]
    fn test_to_crlf() {
        assert_eq!(to_crlf(b"a\nb\r\nc\n").as_ref(), b"a\r\nb\r\nc\r\n");
        assert!(matches!(to_crlf(b"a\r\nb"), Cow::Borrowed(_)));
        assert_eq!(to_crlf(b"\n").as_ref(), b"\r\n");
    }

    #[tokio::test]
    async fn test_write_normalizes_line_endings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.eml");
        let message = Message::new(MessageId::new(1), &b"Subject: hi\n\nbody\n"[..]);

        FileSink::new(true).write(&message, &path).await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, b"Subject: hi\r\n\r\nbody\r\n");

        FileSink::new(false).write(&message, &path).await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, b"Subject: hi\n\nbody\n");
    }

    #[tokio::test]
    async fn test_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let sink = FileSink::default();

        assert!(!sink.directory_exists(&nested).await);
        sink.ensure_directory(&nested).await.unwrap();
        assert!(sink.directory_exists(&nested).await);
    }

    #[tokio::test]
    async fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.eml");
        tokio::fs::write(&file, b"x").await.unwrap();
        assert!(!FileSink::default().directory_exists(&file).await);
    }
}
