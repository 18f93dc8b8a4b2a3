//! Mailbox session capability.
//!
//! The reader drives a single folder through [`MailFolder`]. Implementations
//! wrap a protocol session (IMAP, a local store, an in-memory fixture) and
//! report failures as [`SessionError`].

use async_trait::async_trait;

use crate::config::FolderAccess;
use crate::error::SessionError;
use crate::search::SearchQuery;
use crate::types::{IdSet, IndexRange, Message, MessageId, MessageSummary, SummaryItems};

/// Result type for session calls.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// A folder on a message store.
///
/// The reader owns the folder value it is given. To keep using a folder
/// after the reader is gone, lend it with `&mut folder`; the blanket
/// implementation forwards every call.
#[async_trait]
pub trait MailFolder: Send {
    /// Folder name, used in log output.
    fn name(&self) -> &str;

    /// Returns true if the folder is currently open.
    fn is_open(&self) -> bool;

    /// Number of messages, as known since the folder was opened.
    fn count(&self) -> u32;

    /// Opens the folder.
    async fn open(&mut self, access: FolderAccess) -> SessionResult<()>;

    /// Closes the folder, optionally expunging deleted messages.
    async fn close(&mut self, expunge: bool) -> SessionResult<()>;

    /// Fetches summaries for a range of folder indexes, ascending.
    async fn fetch_by_index_range(
        &mut self,
        range: IndexRange,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>>;

    /// Fetches summaries for identifiers. Identifiers that no longer exist are
    /// left out of the result.
    async fn fetch_by_ids(
        &mut self,
        ids: &IdSet,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>>;

    /// Runs a search. The store may cap the number of results.
    async fn search(&mut self, query: &SearchQuery) -> SessionResult<Vec<MessageId>>;

    /// Retrieves a complete message by identifier.
    async fn get_message_by_id(&mut self, id: MessageId) -> SessionResult<Option<Message>>;

    /// Retrieves a complete message by folder index.
    async fn get_message_by_index(&mut self, index: u32) -> SessionResult<Option<Message>>;
}

#[async_trait]
impl<T: MailFolder + ?Sized> MailFolder for &mut T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn count(&self) -> u32 {
        (**self).count()
    }

    async fn open(&mut self, access: FolderAccess) -> SessionResult<()> {
        (**self).open(access).await
    }

    async fn close(&mut self, expunge: bool) -> SessionResult<()> {
        (**self).close(expunge).await
    }

    async fn fetch_by_index_range(
        &mut self,
        range: IndexRange,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>> {
        (**self).fetch_by_index_range(range, items).await
    }

    async fn fetch_by_ids(
        &mut self,
        ids: &IdSet,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>> {
        (**self).fetch_by_ids(ids, items).await
    }

    async fn search(&mut self, query: &SearchQuery) -> SessionResult<Vec<MessageId>> {
        (**self).search(query).await
    }

    async fn get_message_by_id(&mut self, id: MessageId) -> SessionResult<Option<Message>> {
        (**self).get_message_by_id(id).await
    }

    async fn get_message_by_index(&mut self, index: u32) -> SessionResult<Option<Message>> {
        (**self).get_message_by_index(index).await
    }
}
