//! Reader configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Result cap most servers apply to SEARCH responses.
pub const DEFAULT_SEARCH_CAP: u32 = 250;

/// Batch size above which a `take` is considered unusually large.
pub const DEFAULT_BATCH_WARNING_THRESHOLD: u32 = 65535;

/// Access mode used when the reader opens a folder itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FolderAccess {
    /// EXAMINE; flags are not changed by reading.
    ReadOnly,
    /// SELECT.
    #[default]
    ReadWrite,
}

impl FolderAccess {
    /// Returns true for read-only access.
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Maximum number of results taken from a single search.
    pub search_cap: u32,
    /// `take` values above this log a warning.
    pub batch_warning_threshold: u32,
    /// File extension for saved messages, without the dot.
    pub message_extension: String,
    /// Write saved messages with CRLF line endings.
    pub dos_line_endings: bool,
    /// Access mode for folders the reader opens.
    pub folder_access: FolderAccess,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            search_cap: DEFAULT_SEARCH_CAP,
            batch_warning_threshold: DEFAULT_BATCH_WARNING_THRESHOLD,
            message_extension: "eml".to_string(),
            dos_line_endings: true,
            folder_access: FolderAccess::ReadWrite,
        }
    }
}

impl ReaderConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::new()
    }

    /// Parses a JSON configuration. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        tracing::debug!(path = %path.display(), "Loaded reader configuration");
        Self::from_json(&contents)
    }

    /// Checks the configuration for inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.search_cap == 0 {
            return Err(Error::Config("search_cap must be greater than zero".into()));
        }
        if self.message_extension.is_empty() {
            return Err(Error::Config("message_extension must not be empty".into()));
        }
        if self
            .message_extension
            .chars()
            .any(|c| matches!(c, '.' | '/' | '\\') || c.is_control())
        {
            return Err(Error::Config(format!(
                "message_extension contains an invalid character: {:?}",
                self.message_extension
            )));
        }
        Ok(())
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug, Clone)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ReaderConfig::default(),
        }
    }

    /// Sets the search result cap.
    #[must_use]
    pub const fn search_cap(mut self, cap: u32) -> Self {
        self.config.search_cap = cap;
        self
    }

    /// Sets the large-batch warning threshold.
    #[must_use]
    pub const fn batch_warning_threshold(mut self, threshold: u32) -> Self {
        self.config.batch_warning_threshold = threshold;
        self
    }

    /// Sets the saved message file extension.
    #[must_use]
    pub fn message_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.message_extension = extension.into();
        self
    }

    /// Sets whether saved messages use CRLF line endings.
    #[must_use]
    pub const fn dos_line_endings(mut self, enabled: bool) -> Self {
        self.config.dos_line_endings = enabled;
        self
    }

    /// Sets the folder access mode.
    #[must_use]
    pub const fn folder_access(mut self, access: FolderAccess) -> Self {
        self.config.folder_access = access;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ReaderConfig {
        self.config
    }
}

impl Default for ReaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::manual_string_new)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaderConfig::default();
        assert_eq!(config.search_cap, 250);
        assert_eq!(config.batch_warning_threshold, 65535);
        assert_eq!(config.message_extension, "eml");
        assert!(config.dos_line_endings);
        assert_eq!(config.folder_access, FolderAccess::ReadWrite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ReaderConfig::builder()
            .search_cap(100)
            .message_extension("msg")
            .dos_line_endings(false)
            .folder_access(FolderAccess::ReadOnly)
            .build();

        assert_eq!(config.search_cap, 100);
        assert_eq!(config.message_extension, "msg");
        assert!(!config.dos_line_endings);
        assert!(config.folder_access.is_read_only());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = ReaderConfig::from_json(r#"{"search_cap": 50, "folder_access": "read-only"}"#)
            .unwrap();
        assert_eq!(config.search_cap, 50);
        assert_eq!(config.folder_access, FolderAccess::ReadOnly);
        assert_eq!(config.message_extension, "eml");
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        let err = ReaderConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let err = ReaderConfig::builder().search_cap(0).build().validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        for ext in ["", ".eml", "a/b", "a\\b"] {
            let config = ReaderConfig::builder().message_extension(ext).build();
            assert!(config.validate().is_err(), "accepted {ext:?}");
        }
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.json");
        tokio::fs::write(&path, r#"{"message_extension": "txt"}"#)
            .await
            .unwrap();

        let config = ReaderConfig::load(&path).await.unwrap();
        assert_eq!(config.message_extension, "txt");
        assert_eq!(config.search_cap, DEFAULT_SEARCH_CAP);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = ReaderConfig::load("/nonexistent/reader.json").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
