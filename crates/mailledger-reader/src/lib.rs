//! # mailledger-reader
//!
//! Windowed mailbox reading for `MailLedger`.
//!
//! A [`MailReader`] turns pagination requests into bounded retrieval windows
//! against a single folder, and can advance those windows across calls to
//! walk a large mailbox in finite batches.
//!
//! ## Selection modes
//!
//! Exactly one mode drives a call. Precedence is fixed:
//!
//! 1. **Identifier range** ([`MailReader::range`], [`MailReader::range_batch`]):
//!    identifiers in `start..=end` that still exist on the server.
//! 2. **Search** ([`MailReader::query`]): search results, sliced newest first
//!    and capped at the server limit (250 by default).
//! 3. **Top** ([`MailReader::top`]): the last N messages by folder index.
//! 4. **Index** ([`MailReader::skip`], [`MailReader::take`]): an offset and a
//!    count.
//!
//! ## Continuation
//!
//! With `continuous` set, each call moves the window forward: offsets by the
//! take count, identifier ranges by their own size. A chain ends when a call
//! returns nothing, the folder is exhausted or the next window would
//! overflow. The reader keeps a folder it opened itself open between calls of
//! a chain and closes it when the chain ends or on [`MailReader::finish`].
//!
//! ## Quick Start
//!
//! ```
//! use mailledger_reader::{MailReader, MemoryFolder, SearchQuery};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let folder = MemoryFolder::with_messages("INBOX", 20);
//! let mut reader = MailReader::new(folder);
//!
//! // Newest five unread messages, oldest first.
//! reader.query(SearchQuery::Unseen).take(5, false)?;
//! let messages = reader.fetch_messages(&CancellationToken::new()).await?;
//! assert_eq!(messages.len(), 5);
//! assert_eq!(messages[0].id.get(), 16);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`query`]: pagination parameters and selection modes
//! - [`strategy`]: planning one call against the folder size
//! - [`advance`]: computing the next window of a continuation chain
//! - [`lease`]: folder open/close discipline
//! - [`session`]: the folder capability implemented by mail stores
//! - [`memory`]: an in-memory folder
//! - [`sink`]: saving messages

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod advance;
pub mod config;
mod error;
mod executor;
pub mod lease;
pub mod memory;
pub mod query;
mod reader;
pub mod search;
pub mod session;
pub mod sink;
pub mod strategy;
mod stream;
#[cfg(test)]
mod testing;
pub mod types;

pub use advance::Continuation;
pub use config::{FolderAccess, ReaderConfig, ReaderConfigBuilder};
pub use error::{Error, Interrupted, Result, SessionError};
pub use lease::FolderLease;
pub use memory::MemoryFolder;
pub use query::{QuerySpec, Selection, SelectionMode, Take};
pub use reader::MailReader;
pub use search::SearchQuery;
pub use session::MailFolder;
pub use sink::{FileSink, MessageSink};
pub use strategy::{Plan, Planned};
pub use types::{
    IdRange, IdSet, IndexRange, Message, MessageId, MessageSummary, SummaryItem, SummaryItems,
};
