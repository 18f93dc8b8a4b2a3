//! In-memory folder.
//!
//! [`MemoryFolder`] keeps messages in index order, evaluates [`SearchQuery`]
//! locally and records every session call, which makes it suitable for tests
//! and demos. Faults can be injected per operation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};

use crate::config::{DEFAULT_SEARCH_CAP, FolderAccess};
use crate::error::SessionError;
use crate::search::SearchQuery;
use crate::session::{MailFolder, SessionResult};
use crate::types::{
    IdSet, IndexRange, Message, MessageId, MessageSummary, SummaryItem, SummaryItems,
    header_value,
};

/// A session call observed by a [`MemoryFolder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `open`.
    Open(FolderAccess),
    /// `close`.
    Close,
    /// `fetch_by_index_range`.
    FetchIndexRange(IndexRange),
    /// `fetch_by_ids`.
    FetchIds(IdSet),
    /// `search`, with the rendered query.
    Search(String),
    /// `get_message_by_id`.
    GetById(MessageId),
    /// `get_message_by_index`.
    GetByIndex(u32),
}

/// A failure to inject into a [`MemoryFolder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `open` fails.
    Open,
    /// `close` fails.
    Close,
    /// Summary fetches fail.
    Fetch,
    /// `search` fails.
    Search,
    /// Retrieving this message fails.
    Message(MessageId),
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: MessageId,
    raw: Bytes,
    flags: Vec<String>,
    received: DateTime<Utc>,
}

impl StoredMessage {
    fn header(&self, name: &str) -> Option<String> {
        header_value(&self.raw, name)
    }

    fn body(&self) -> String {
        let text = String::from_utf8_lossy(&self.raw);
        text.split_once("\r\n\r\n")
            .or_else(|| text.split_once("\n\n"))
            .map(|(_, body)| body.to_string())
            .unwrap_or_default()
    }

    fn size(&self) -> u32 {
        u32::try_from(self.raw.len()).unwrap_or(u32::MAX)
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    fn matches(&self, query: &SearchQuery) -> bool {
        match query {
            SearchQuery::All => true,
            SearchQuery::Seen => self.has_flag("\\Seen"),
            SearchQuery::Unseen => !self.has_flag("\\Seen"),
            SearchQuery::Flagged => self.has_flag("\\Flagged"),
            SearchQuery::Answered => self.has_flag("\\Answered"),
            SearchQuery::Deleted => self.has_flag("\\Deleted"),
            SearchQuery::Subject(s) => self.header_contains("subject", s),
            SearchQuery::From(s) => self.header_contains("from", s),
            SearchQuery::To(s) => self.header_contains("to", s),
            SearchQuery::Header(name, value) => self.header_contains(name, value),
            SearchQuery::Body(s) => contains_ignore_case(&self.body(), s),
            SearchQuery::Text(s) => contains_ignore_case(&String::from_utf8_lossy(&self.raw), s),
            SearchQuery::Since(date) => self.received.date_naive() >= *date,
            SearchQuery::Before(date) => self.received.date_naive() < *date,
            SearchQuery::On(date) => self.received.date_naive() == *date,
            SearchQuery::Larger(n) => self.size() > *n,
            SearchQuery::Smaller(n) => self.size() < *n,
            SearchQuery::Uid(set) => set.contains(self.id),
            SearchQuery::And(criteria) => criteria.iter().all(|c| self.matches(c)),
            SearchQuery::Or(a, b) => self.matches(a) || self.matches(b),
            SearchQuery::Not(c) => !self.matches(c),
        }
    }

    fn header_contains(&self, name: &str, needle: &str) -> bool {
        self.header(name)
            .is_some_and(|value| contains_ignore_case(&value, needle))
    }

    fn summary(&self, index: u32, items: &SummaryItems) -> MessageSummary {
        let mut summary = MessageSummary::new(index, self.id);
        if items.contains(SummaryItem::Envelope) {
            summary.subject = self.header("subject");
            summary.from = self.header("from");
            summary.to = self
                .header("to")
                .map(|to| to.split(',').map(|a| a.trim().to_string()).collect())
                .unwrap_or_default();
            summary.date = self
                .header("date")
                .and_then(|d| DateTime::parse_from_rfc2822(&d).ok())
                .map(|d| d.with_timezone(&Utc));
            summary.message_id = self.header("message-id");
        }
        if items.contains(SummaryItem::InternalDate) && summary.date.is_none() {
            summary.date = Some(self.received);
        }
        if items.contains(SummaryItem::Flags) {
            summary.flags.clone_from(&self.flags);
        }
        if items.contains(SummaryItem::Size) {
            summary.size = Some(self.size());
        }
        summary
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A folder held in memory.
#[derive(Debug, Clone)]
pub struct MemoryFolder {
    name: String,
    open: Option<FolderAccess>,
    messages: Vec<StoredMessage>,
    search_cap: usize,
    faults: Vec<Fault>,
    calls: Vec<Call>,
}

impl MemoryFolder {
    /// Creates an empty, closed folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: None,
            messages: Vec::new(),
            search_cap: DEFAULT_SEARCH_CAP as usize,
            faults: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Creates a folder holding `count` generated messages with identifiers
    /// `1..=count`, received one day apart starting 2024-01-01.
    #[must_use]
    pub fn with_messages(name: impl Into<String>, count: u32) -> Self {
        let mut folder = Self::new(name);
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single();
        for n in 1..=count {
            let received = base
                .and_then(|b| b.checked_add_days(Days::new(u64::from(n - 1))))
                .unwrap_or_else(Utc::now);
            let raw = format!(
                "From: sender{n}@example.com\r\n\
                 To: inbox@example.com\r\n\
                 Subject: Message {n}\r\n\
                 Date: {}\r\n\
                 Message-ID: <{n}@example.com>\r\n\
                 \r\n\
                 Body of message {n}.\r\n",
                received.to_rfc2822()
            );
            folder.insert(MessageId::new(n), raw, received);
        }
        folder
    }

    /// Limits the number of search results, like a server would.
    #[must_use]
    pub const fn with_search_cap(mut self, cap: usize) -> Self {
        self.search_cap = cap;
        self
    }

    /// Appends a message with the next identifier and returns it.
    pub fn push(&mut self, raw: impl Into<Bytes>) -> MessageId {
        let id = self
            .messages
            .last()
            .map_or(MessageId::new(1), |m| m.id.saturating_add(1));
        self.insert(id, raw, Utc::now());
        id
    }

    /// Appends a message with an explicit identifier and arrival time.
    ///
    /// Identifiers must be appended in increasing order.
    pub fn insert(&mut self, id: MessageId, raw: impl Into<Bytes>, received: DateTime<Utc>) {
        self.messages.push(StoredMessage {
            id,
            raw: raw.into(),
            flags: Vec::new(),
            received,
        });
    }

    /// Removes a message. Returns true if it existed.
    pub fn expunge(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Replaces the flags of a message.
    pub fn set_flags<I, S>(&mut self, id: MessageId, flags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(m) = self.messages.iter_mut().find(|m| m.id == id) {
            m.flags = flags.into_iter().map(Into::into).collect();
        }
    }

    /// Identifiers in index order.
    #[must_use]
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id).collect()
    }

    /// Access mode of the current open, if any.
    #[must_use]
    pub const fn opened_with(&self) -> Option<FolderAccess> {
        self.open
    }

    /// Injects a fault. Faults persist until cleared.
    pub fn inject(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Removes all injected faults.
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Session calls observed so far.
    #[must_use]
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn fail(&self, fault: Fault) -> SessionResult<()> {
        if self.faults.contains(&fault) {
            Err(SessionError::Operation(format!("injected {fault:?} failure")))
        } else {
            Ok(())
        }
    }

    fn ensure_open(&self) -> SessionResult<()> {
        if self.open.is_some() {
            Ok(())
        } else {
            Err(SessionError::FolderNotOpen(self.name.clone()))
        }
    }

    fn position(&self, id: MessageId) -> Option<(u32, &StoredMessage)> {
        let index = self.messages.binary_search_by(|m| m.id.cmp(&id)).ok()?;
        let message = self.messages.get(index)?;
        Some((u32::try_from(index).ok()?, message))
    }

    fn message_at(&self, index: u32, stored: &StoredMessage) -> SessionResult<Message> {
        self.fail(Fault::Message(stored.id))?;
        Ok(Message::new(stored.id, stored.raw.clone()).with_index(index))
    }
}

/// Builds a date for [`MemoryFolder::insert`] in tests and demos.
#[must_use]
pub fn received_on(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(12, 0, 0).map_or_else(Utc::now, |d| d.and_utc())
}

#[async_trait]
impl MailFolder for MemoryFolder {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn count(&self) -> u32 {
        u32::try_from(self.messages.len()).unwrap_or(u32::MAX)
    }

    async fn open(&mut self, access: FolderAccess) -> SessionResult<()> {
        self.calls.push(Call::Open(access));
        self.fail(Fault::Open)?;
        self.open = Some(access);
        Ok(())
    }

    async fn close(&mut self, expunge: bool) -> SessionResult<()> {
        self.calls.push(Call::Close);
        self.fail(Fault::Close)?;
        if expunge {
            self.messages.retain(|m| !m.has_flag("\\Deleted"));
        }
        self.open = None;
        Ok(())
    }

    async fn fetch_by_index_range(
        &mut self,
        range: IndexRange,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>> {
        self.calls.push(Call::FetchIndexRange(range));
        self.ensure_open()?;
        self.fail(Fault::Fetch)?;
        Ok(range
            .iter()
            .filter_map(|i| self.messages.get(i as usize).map(|m| m.summary(i, items)))
            .collect())
    }

    async fn fetch_by_ids(
        &mut self,
        ids: &IdSet,
        items: &SummaryItems,
    ) -> SessionResult<Vec<MessageSummary>> {
        self.calls.push(Call::FetchIds(ids.clone()));
        self.ensure_open()?;
        self.fail(Fault::Fetch)?;
        Ok(self
            .messages
            .iter()
            .zip(0u32..)
            .filter(|(m, _)| ids.contains(m.id))
            .map(|(m, i)| m.summary(i, items))
            .collect())
    }

    async fn search(&mut self, query: &SearchQuery) -> SessionResult<Vec<MessageId>> {
        self.calls.push(Call::Search(query.to_string()));
        self.ensure_open()?;
        self.fail(Fault::Search)?;
        Ok(self
            .messages
            .iter()
            .filter(|m| m.matches(query))
            .map(|m| m.id)
            .take(self.search_cap)
            .collect())
    }

    async fn get_message_by_id(&mut self, id: MessageId) -> SessionResult<Option<Message>> {
        self.calls.push(Call::GetById(id));
        self.ensure_open()?;
        match self.position(id) {
            Some((index, stored)) => self.message_at(index, stored).map(Some),
            None => Ok(None),
        }
    }

    async fn get_message_by_index(&mut self, index: u32) -> SessionResult<Option<Message>> {
        self.calls.push(Call::GetByIndex(index));
        self.ensure_open()?;
        match self.messages.get(index as usize) {
            Some(stored) => self.message_at(index, stored).map(Some),
            None => Ok(None),
        }
    }
}
