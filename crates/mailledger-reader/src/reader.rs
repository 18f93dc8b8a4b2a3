//! The mail reader.
//!
//! [`MailReader`] owns a folder and a [`QuerySpec`]. Configuration calls
//! validate eagerly and leave the spec untouched on error. Retrieval calls
//! open the folder when needed, run one window, advance the spec and close
//! the folder again unless a continuation chain still needs it.
//!
//! # Example
//!
//! ```
//! use mailledger_reader::{MailReader, MemoryFolder};
//!
//! # tokio_test::block_on(async {
//! let mut reader = MailReader::new(MemoryFolder::with_messages("INBOX", 10));
//! reader.skip(0)?.take(4, true)?;
//!
//! let first = reader.fetch_summaries().await?;
//! let second = reader.fetch_summaries().await?;
//! assert_eq!(first.len(), 4);
//! assert_eq!(second[0].index, 4);
//! reader.finish().await;
//! # Ok::<(), mailledger_reader::Error>(())
//! # }).unwrap();
//! ```

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::advance::advance;
use crate::config::ReaderConfig;
use crate::error::{Error, Interrupted, Result};
use crate::executor;
use crate::lease::{FolderLease, close_quietly};
use crate::query::{QuerySpec, SelectionMode};
use crate::search::SearchQuery;
use crate::session::MailFolder;
use crate::sink::MessageSink;
use crate::strategy::{self, Planned};
use crate::stream;
use crate::types::{IdRange, Message, MessageId, MessageSummary, SummaryItems};

/// Windowed reader over a single folder.
pub struct MailReader<F> {
    pub(crate) folder: F,
    pub(crate) spec: QuerySpec,
    pub(crate) config: ReaderConfig,
    pub(crate) retained: bool,
}

impl<F: MailFolder> MailReader<F> {
    /// Creates a reader with the default configuration.
    #[must_use]
    pub fn new(folder: F) -> Self {
        Self {
            folder,
            spec: QuerySpec::new(),
            config: ReaderConfig::default(),
            retained: false,
        }
    }

    /// Creates a reader with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn with_config(folder: F, config: ReaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            folder,
            spec: QuerySpec::new(),
            config,
            retained: false,
        })
    }

    /// Skips the first `n` messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is negative.
    pub fn skip(&mut self, n: i64) -> Result<&mut Self> {
        self.spec = self.spec.clone().with_skip(n)?;
        Ok(self)
    }

    /// Retrieves at most `n` messages per call; `-1` retrieves all. With
    /// `continuous`, each call starts where the previous one ended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is below `-1`.
    pub fn take(&mut self, n: i64, continuous: bool) -> Result<&mut Self> {
        self.spec = self.spec.clone().with_take(n, continuous)?;
        if n > i64::from(self.config.batch_warning_threshold) {
            tracing::warn!(
                take = n,
                threshold = self.config.batch_warning_threshold,
                "Take should be split into smaller batches"
            );
        }
        Ok(self)
    }

    /// Retrieves the last `n` messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is zero.
    pub fn top(&mut self, n: u32) -> Result<&mut Self> {
        self.spec = self.spec.clone().with_top(n)?;
        Ok(self)
    }

    /// Retrieves messages with identifiers in `start..=end`.
    pub fn range(&mut self, start: MessageId, end: MessageId, continuous: bool) -> &mut Self {
        self.spec = self
            .spec
            .clone()
            .with_range(IdRange::new(start, end), continuous);
        self
    }

    /// Retrieves messages with identifiers in `start..=start + batch_size`.
    /// With `continuous`, each call moves to the next batch.
    pub fn range_batch(&mut self, start: MessageId, batch_size: u32, continuous: bool) -> &mut Self {
        self.spec = self.spec.clone().with_batch(start, batch_size, continuous);
        self
    }

    /// Retrieves messages matching a search query.
    pub fn query(&mut self, query: SearchQuery) -> &mut Self {
        self.spec = self.spec.clone().with_query(query, self.config.search_cap);
        self
    }

    /// Sets the summary fields to fetch.
    pub fn items(&mut self, items: SummaryItems) -> &mut Self {
        self.spec = self.spec.clone().with_items(items);
        self
    }

    /// Current spec.
    #[must_use]
    pub const fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Replaces the spec, returning the previous one.
    pub fn replace_spec(&mut self, spec: QuerySpec) -> QuerySpec {
        std::mem::replace(&mut self.spec, spec)
    }

    /// Configuration.
    #[must_use]
    pub const fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// The folder.
    #[must_use]
    pub const fn folder(&self) -> &F {
        &self.folder
    }

    /// The folder, mutably.
    pub const fn folder_mut(&mut self) -> &mut F {
        &mut self.folder
    }

    /// Returns the folder. A folder retained by a continuation chain is still
    /// open; call [`MailReader::finish`] first to close it.
    #[must_use]
    pub fn into_folder(self) -> F {
        self.folder
    }

    /// Returns true if the reader keeps the folder open for the next call.
    #[must_use]
    pub const fn retains_folder(&self) -> bool {
        self.retained
    }

    /// Fetches summaries for the current window and advances the spec.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be opened or a fetch fails. The
    /// spec is not advanced and a folder opened by the reader is closed.
    pub async fn fetch_summaries(&mut self) -> Result<Vec<MessageSummary>> {
        if self.spec.take().is_zero() {
            tracing::info!("Take(0) returns no results");
            return Ok(Vec::new());
        }

        let retained = std::mem::take(&mut self.retained);
        let lease =
            FolderLease::acquire(&mut self.folder, self.config.folder_access, retained).await?;
        let count = self.folder.count();
        let mode = self.spec.selection().mode();
        let Planned { spec, plan } = strategy::plan(self.spec.clone(), count, self.config.search_cap);

        let fetched = match executor::resolve_window(&mut self.folder, plan, self.config.search_cap)
            .await
        {
            Ok(window) => executor::fetch_summaries(&mut self.folder, &window, spec.items()).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(summaries) => {
                self.complete(lease, spec, mode, summaries.len(), count).await;
                Ok(summaries)
            }
            Err(e) => {
                lease.abandon(&mut self.folder).await;
                Err(e)
            }
        }
    }

    /// Retrieves complete messages for the current window and advances the
    /// spec.
    ///
    /// Cancellation is checked before each message.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] with the messages retrieved before a failure
    /// or cancellation. The spec is not advanced and a folder opened by the
    /// reader is closed.
    pub async fn fetch_messages(
        &mut self,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<Message>, Interrupted<Message>> {
        if self.spec.take().is_zero() {
            tracing::info!("Take(0) returns no results");
            return Ok(Vec::new());
        }

        let retained = std::mem::take(&mut self.retained);
        let lease =
            FolderLease::acquire(&mut self.folder, self.config.folder_access, retained).await?;
        let count = self.folder.count();
        let mode = self.spec.selection().mode();
        let Planned { spec, plan } = strategy::plan(self.spec.clone(), count, self.config.search_cap);

        let targets = match executor::resolve_window(&mut self.folder, plan, self.config.search_cap)
            .await
        {
            Ok(window) => executor::message_targets(&mut self.folder, &window).await,
            Err(e) => Err(e),
        };
        let fetched = match targets {
            Ok(targets) => executor::fetch_messages(&mut self.folder, targets, cancel).await,
            Err(e) => Err(Interrupted::new(e)),
        };

        match fetched {
            Ok(messages) => {
                tracing::trace!(folder = self.folder.name(), count = messages.len(), "Received messages");
                self.complete(lease, spec, mode, messages.len(), count).await;
                Ok(messages)
            }
            Err(interrupted) => {
                lease.abandon(&mut self.folder).await;
                Err(interrupted)
            }
        }
    }

    /// Streams complete messages for the current window in ascending order.
    ///
    /// The spec advances once the stream is exhausted. Cancellation ends the
    /// stream with [`Error::Cancelled`] after the messages already yielded.
    /// If the stream is dropped early the folder stays open and is closed by
    /// the next call or by [`MailReader::finish`].
    pub fn message_stream(
        &mut self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<Message>> + '_ {
        stream::messages(self, cancel)
    }

    /// Saves every message of the current window to `dir` as
    /// `<id>.<extension>`.
    ///
    /// The directory is checked before the folder is touched.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] with the paths written before a failure.
    /// [`Error::DirectoryNotFound`] is returned if `dir` is missing and
    /// `create_directory` is false.
    pub async fn save_all<S>(
        &mut self,
        sink: &S,
        dir: impl AsRef<Path>,
        create_directory: bool,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<PathBuf>, Interrupted<PathBuf>>
    where
        S: MessageSink + ?Sized,
    {
        let dir = dir.as_ref();
        if create_directory {
            sink.ensure_directory(dir).await?;
        } else if !sink.directory_exists(dir).await {
            return Err(Error::DirectoryNotFound(dir.to_path_buf()).into());
        }

        let extension = self.config.message_extension.clone();
        let mut saved = Vec::new();
        let failure = {
            let mut messages = std::pin::pin!(self.message_stream(cancel.clone()));
            loop {
                match messages.next().await {
                    None => break None,
                    Some(Err(e)) => break Some((e, false)),
                    Some(Ok(message)) => {
                        let path = dir.join(format!("{}.{extension}", message.id));
                        if let Err(e) = sink.write(&message, &path).await {
                            break Some((e, true));
                        }
                        saved.push(path);
                    }
                }
            }
        };

        match failure {
            None => {
                tracing::debug!(dir = %dir.display(), count = saved.len(), "Saved messages");
                Ok(saved)
            }
            Some((error, sink_failed)) => {
                if sink_failed {
                    self.close_retained().await;
                }
                Err(Interrupted::with_fetched(saved, error))
            }
        }
    }

    /// Retrieves one message by identifier, independent of the current
    /// window. The spec is not changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the folder cannot be opened or the fetch fails.
    pub async fn fetch_message(&mut self, id: MessageId) -> Result<Option<Message>> {
        let retained = self.retained;
        let lease =
            FolderLease::acquire(&mut self.folder, self.config.folder_access, retained).await?;
        match executor::fetch_one(&mut self.folder, executor::Target::Id(id)).await {
            Ok(message) => {
                self.retained = lease.release(&mut self.folder, retained).await;
                Ok(message)
            }
            Err(e) => {
                self.retained = false;
                lease.abandon(&mut self.folder).await;
                Err(e)
            }
        }
    }

    /// Fetches summaries batch after batch and passes each to `handler`,
    /// until a batch comes back empty or the spec stops continuing.
    ///
    /// Returns the number of summaries handled.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or handler error, or [`Error::Cancelled`].
    /// A folder kept open between batches is closed first.
    pub async fn process_summaries<H, Fut>(
        &mut self,
        mut handler: H,
        cancel: &CancellationToken,
    ) -> Result<usize>
    where
        H: FnMut(MessageSummary) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut processed = 0;
        loop {
            if cancel.is_cancelled() {
                self.close_retained().await;
                return Err(Error::Cancelled);
            }
            let batch = self.fetch_summaries().await?;
            if batch.is_empty() {
                break;
            }
            for summary in batch {
                if let Err(e) = handler(summary).await {
                    self.close_retained().await;
                    return Err(e);
                }
                processed += 1;
            }
            if !self.spec.is_continuous() {
                break;
            }
        }
        tracing::debug!(folder = self.folder.name(), processed, "Processed summaries");
        Ok(processed)
    }

    /// Ends a continuation chain: disables continuation and closes a folder
    /// the reader kept open.
    pub async fn finish(&mut self) {
        self.spec = self.spec.clone().stopped();
        self.close_retained().await;
    }

    pub(crate) async fn complete(
        &mut self,
        lease: FolderLease,
        spec: QuerySpec,
        mode: SelectionMode,
        returned: usize,
        count: u32,
    ) {
        let next = advance(spec, mode, returned, count);
        let pending = next.is_pending();
        self.spec = next.into_spec();
        self.retained = lease.release(&mut self.folder, pending).await;
    }

    async fn close_retained(&mut self) {
        if std::mem::take(&mut self.retained) && self.folder.is_open() {
            close_quietly(&mut self.folder).await;
        }
    }
}

impl<F: MailFolder> fmt::Display for MailReader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (skip {}, take {})",
            self.folder.name(),
            self.spec.skip(),
            self.spec.take()
        )
    }
}

impl<F: MailFolder> fmt::Debug for MailReader<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailReader")
            .field("folder", &self.folder.name())
            .field("spec", &self.spec)
            .field("config", &self.config)
            .field("retained", &self.retained)
            .finish()
    }
}
