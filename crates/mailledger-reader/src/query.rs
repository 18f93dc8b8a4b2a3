//! Pagination parameters.
//!
//! A [`QuerySpec`] is a snapshot of everything that decides which messages one
//! call retrieves. Every transition returns a new value; the reader swaps the
//! whole snapshot after each call instead of mutating fields in place.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::{Error, Result};
use crate::search::SearchQuery;
use crate::types::{IdRange, MessageId, SummaryItems};

/// Number of messages to retrieve per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Take {
    /// Everything from the offset onwards.
    #[default]
    All,
    /// At most this many. `Count(0)` retrieves nothing and skips all I/O.
    Count(u32),
}

impl Take {
    /// Converts a signed count where `-1` means [`Take::All`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for values below `-1` or above
    /// `u32::MAX`.
    pub fn from_signed(n: i64) -> Result<Self> {
        match n {
            -1 => Ok(Self::All),
            n if n < -1 => Err(Error::invalid_argument(
                "take",
                format!("must be -1 (all) or a non-negative count, got {n}"),
            )),
            n => u32::try_from(n)
                .map(Self::Count)
                .map_err(|_| Error::invalid_argument("take", format!("{n} exceeds {}", u32::MAX))),
        }
    }

    /// Returns true for `Count(0)`.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Count(0))
    }

    /// Returns the count, or `None` for [`Take::All`].
    #[must_use]
    pub const fn count(self) -> Option<u32> {
        match self {
            Self::All => None,
            Self::Count(n) => Some(n),
        }
    }
}

impl fmt::Display for Take {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

/// Which retrieval mode drives a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// Explicit identifier range.
    IdRange,
    /// Search query other than "match all".
    Search,
    /// Last N messages by folder index.
    Top,
    /// Offset and count by folder index.
    Index,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::IdRange => "id-range",
            Self::Search => "search",
            Self::Top => "top",
            Self::Index => "index",
        })
    }
}

/// The selection a spec resolves to, with the fields that mode uses.
///
/// Precedence is fixed: id range, then search, then top, then index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Identifier range.
    IdRange(IdRange),
    /// Search with a slice over the results.
    Search {
        /// The query.
        query: &'a SearchQuery,
        /// Results skipped, newest first.
        skip: u32,
        /// Results taken after skipping.
        take: Take,
    },
    /// Last N messages.
    Top(NonZeroU32),
    /// Offset and count.
    Index {
        /// Index of the first message.
        skip: u32,
        /// Number of messages.
        take: Take,
    },
}

impl Selection<'_> {
    /// Returns the mode tag.
    #[must_use]
    pub const fn mode(&self) -> SelectionMode {
        match self {
            Self::IdRange(_) => SelectionMode::IdRange,
            Self::Search { .. } => SelectionMode::Search,
            Self::Top(_) => SelectionMode::Top,
            Self::Index { .. } => SelectionMode::Index,
        }
    }
}

/// Pagination parameters for one retrieval call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuerySpec {
    skip: u32,
    take: Take,
    take_configured: bool,
    top: Option<NonZeroU32>,
    id_range: Option<IdRange>,
    query: SearchQuery,
    continuous: bool,
    items: SummaryItems,
}

impl QuerySpec {
    /// Creates a spec that selects every message with envelope summaries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset applied in index and search modes.
    #[must_use]
    pub const fn skip(&self) -> u32 {
        self.skip
    }

    /// Count applied in index and search modes.
    #[must_use]
    pub const fn take(&self) -> Take {
        self.take
    }

    /// Last-N count, if set.
    #[must_use]
    pub const fn top(&self) -> Option<NonZeroU32> {
        self.top
    }

    /// Identifier range, if set.
    #[must_use]
    pub const fn id_range(&self) -> Option<IdRange> {
        self.id_range
    }

    /// Search query.
    #[must_use]
    pub const fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Whether each call advances the window for the next one.
    #[must_use]
    pub const fn is_continuous(&self) -> bool {
        self.continuous
    }

    /// Requested summary fields.
    #[must_use]
    pub const fn items(&self) -> &SummaryItems {
        &self.items
    }

    /// Returns the active selection.
    #[must_use]
    pub fn selection(&self) -> Selection<'_> {
        if let Some(range) = self.id_range {
            Selection::IdRange(range)
        } else if !self.query.is_match_all() {
            Selection::Search {
                query: &self.query,
                skip: self.skip,
                take: self.take,
            }
        } else if let Some(top) = self.top {
            Selection::Top(top)
        } else {
            Selection::Index {
                skip: self.skip,
                take: self.take,
            }
        }
    }

    /// Sets the offset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is negative or above
    /// `u32::MAX`.
    pub fn with_skip(self, n: i64) -> Result<Self> {
        if n < 0 {
            return Err(Error::invalid_argument(
                "skip",
                format!("must not be negative, got {n}"),
            ));
        }
        let skip = u32::try_from(n)
            .map_err(|_| Error::invalid_argument("skip", format!("{n} exceeds {}", u32::MAX)))?;
        Ok(Self { skip, ..self })
    }

    /// Sets the count and whether calls continue from where the last one
    /// ended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is below `-1` or above
    /// `u32::MAX`.
    pub fn with_take(self, n: i64, continuous: bool) -> Result<Self> {
        let take = Take::from_signed(n)?;
        Ok(Self {
            take,
            take_configured: true,
            continuous,
            ..self
        })
    }

    /// Selects the last `n` messages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `n` is zero.
    pub fn with_top(self, n: u32) -> Result<Self> {
        let top = NonZeroU32::new(n)
            .ok_or_else(|| Error::invalid_argument("top", "must be greater than zero"))?;
        Ok(Self {
            top: Some(top),
            ..self
        })
    }

    /// Selects an explicit identifier range.
    #[must_use]
    pub fn with_range(self, range: IdRange, continuous: bool) -> Self {
        Self {
            id_range: Some(range),
            continuous,
            ..self
        }
    }

    /// Selects `start..=start + size`, clamping the end to
    /// [`MessageId::MAX`].
    #[must_use]
    pub fn with_batch(self, start: MessageId, size: u32, continuous: bool) -> Self {
        if start.checked_add(size).is_none() {
            tracing::debug!(%start, size, "Batch end clamped to maximum identifier");
        }
        self.with_range(IdRange::batch(start, size), continuous)
    }

    /// Sets the search query.
    ///
    /// A query other than [`SearchQuery::All`] sets `take` to `search_cap`
    /// unless a count was configured explicitly.
    #[must_use]
    pub fn with_query(self, query: SearchQuery, search_cap: u32) -> Self {
        let take = if query.is_match_all() || self.take_configured {
            self.take
        } else {
            Take::Count(search_cap)
        };
        Self {
            query,
            take,
            ..self
        }
    }

    /// Sets the requested summary fields. The unique identifier is always
    /// included.
    #[must_use]
    pub fn with_items(self, items: SummaryItems) -> Self {
        Self {
            items: SummaryItems::new().union(&items),
            ..self
        }
    }

    /// Disables continuation.
    #[must_use]
    pub fn stopped(self) -> Self {
        Self {
            continuous: false,
            ..self
        }
    }

    pub(crate) fn with_next_skip(self, skip: u32) -> Self {
        Self { skip, ..self }
    }

    pub(crate) fn with_next_range(self, range: IdRange) -> Self {
        Self {
            id_range: Some(range),
            ..self
        }
    }
}
