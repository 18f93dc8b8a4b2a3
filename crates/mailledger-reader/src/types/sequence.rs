//! Identifier and index ranges used to describe retrieval windows.

use super::MessageId;

/// Inclusive range of message identifiers.
///
/// A range whose end is below its start is *inverted*. Inverted ranges only
/// arise from wrapped arithmetic and are never treated as descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange {
    start: MessageId,
    end: MessageId,
}

impl IdRange {
    /// Creates a range from explicit bounds.
    #[must_use]
    pub const fn new(start: MessageId, end: MessageId) -> Self {
        Self { start, end }
    }

    /// Creates the range `start..=start + size`.
    ///
    /// The end clamps to [`MessageId::MAX`] instead of wrapping.
    #[must_use]
    pub const fn batch(start: MessageId, size: u32) -> Self {
        Self {
            start,
            end: start.saturating_add(size),
        }
    }

    /// Returns the first identifier of the range.
    #[must_use]
    pub const fn start(&self) -> MessageId {
        self.start
    }

    /// Returns the last identifier of the range.
    #[must_use]
    pub const fn end(&self) -> MessageId {
        self.end
    }

    /// Returns true if `end < start`.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.end.get() < self.start.get()
    }

    /// Returns true if `id` lies within the range.
    #[must_use]
    pub const fn contains(&self, id: MessageId) -> bool {
        self.start.get() <= id.get() && id.get() <= self.end.get()
    }

    /// Number of identifiers covered, zero when inverted.
    #[must_use]
    pub const fn len(&self) -> u64 {
        if self.is_inverted() {
            0
        } else {
            (self.end.get() - self.start.get()) as u64 + 1
        }
    }

    /// Returns true if the range covers nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_inverted()
    }
}

impl std::fmt::Display for IdRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Set of message identifiers submitted to the server in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSet {
    /// Every identifier in a contiguous range.
    Range(IdRange),
    /// Explicit identifiers, ascending and without duplicates.
    List(Vec<MessageId>),
}

impl IdSet {
    /// Creates a list set, sorting ascending and removing duplicates.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = MessageId>) -> Self {
        let mut ids: Vec<MessageId> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self::List(ids)
    }

    /// Returns true if `id` is a member of the set.
    #[must_use]
    pub fn contains(&self, id: MessageId) -> bool {
        match self {
            Self::Range(range) => range.contains(id),
            Self::List(ids) => ids.binary_search(&id).is_ok(),
        }
    }

    /// Returns true if the set has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Range(range) => range.is_empty(),
            Self::List(ids) => ids.is_empty(),
        }
    }
}

impl From<IdRange> for IdSet {
    fn from(range: IdRange) -> Self {
        Self::Range(range)
    }
}

impl std::fmt::Display for IdSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Range(range) => write!(f, "{range}"),
            Self::List(ids) => {
                let s: Vec<_> = ids.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

/// Inclusive range of zero-based folder indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    start: u32,
    end: u32,
}

impl IndexRange {
    /// Creates an index range.
    ///
    /// Returns `None` if `end < start`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Option<Self> {
        if end < start {
            None
        } else {
            Some(Self { start, end })
        }
    }

    /// Returns the first index.
    #[must_use]
    pub const fn start(&self) -> u32 {
        self.start
    }

    /// Returns the last index.
    #[must_use]
    pub const fn end(&self) -> u32 {
        self.end
    }

    /// Number of indexes covered.
    #[must_use]
    pub const fn len(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    /// Always false; an index range covers at least one index.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `index` lies within the range.
    #[must_use]
    pub const fn contains(&self, index: u32) -> bool {
        self.start <= index && index <= self.end
    }

    /// Iterates the indexes in ascending order.
    pub fn iter(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl std::fmt::Display for IndexRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod id_range_tests {
        use super::*;

        #[test]
        fn batch_adds_size_to_start() {
            let range = IdRange::batch(MessageId::new(100), 50);
            assert_eq!(range.start(), MessageId::new(100));
            assert_eq!(range.end(), MessageId::new(150));
            assert_eq!(range.len(), 51);
        }

        #[test]
        fn batch_clamps_instead_of_wrapping() {
            let range = IdRange::batch(MessageId::new(u32::MAX - 5), 10);
            assert_eq!(range.end(), MessageId::MAX);
            assert!(!range.is_inverted());
        }

        #[test]
        fn inverted_range_is_empty() {
            let range = IdRange::new(MessageId::new(10), MessageId::new(5));
            assert!(range.is_inverted());
            assert!(range.is_empty());
            assert_eq!(range.len(), 0);
            assert!(!range.contains(MessageId::new(7)));
        }

        #[test]
        fn contains_is_inclusive() {
            let range = IdRange::new(MessageId::new(1), MessageId::new(3));
            assert!(range.contains(MessageId::new(1)));
            assert!(range.contains(MessageId::new(3)));
            assert!(!range.contains(MessageId::new(4)));
        }

        #[test]
        fn display() {
            let range = IdRange::new(MessageId::new(1), MessageId::new(999));
            assert_eq!(format!("{range}"), "1:999");
        }

        #[test]
        fn full_range_length() {
            let range = IdRange::new(MessageId::MIN, MessageId::MAX);
            assert_eq!(range.len(), u64::from(u32::MAX) + 1);
        }
    }

    mod id_set_tests {
        use super::*;

        #[test]
        fn from_ids_sorts_and_dedups() {
            let set = IdSet::from_ids([5, 1, 3, 1].map(MessageId::new));
            assert_eq!(
                set,
                IdSet::List(vec![MessageId::new(1), MessageId::new(3), MessageId::new(5)])
            );
            assert!(set.contains(MessageId::new(3)));
            assert!(!set.contains(MessageId::new(2)));
        }

        #[test]
        fn display_list() {
            let set = IdSet::from_ids([7, 2].map(MessageId::new));
            assert_eq!(format!("{set}"), "2,7");
        }

        #[test]
        fn display_range() {
            let set = IdSet::from(IdRange::new(MessageId::new(4), MessageId::new(8)));
            assert_eq!(format!("{set}"), "4:8");
        }

        #[test]
        fn empty_sets() {
            assert!(IdSet::List(Vec::new()).is_empty());
            assert!(IdSet::Range(IdRange::new(MessageId::new(2), MessageId::new(1))).is_empty());
        }
    }

    mod index_range_tests {
        use super::*;

        #[test]
        fn rejects_reversed_bounds() {
            assert!(IndexRange::new(5, 4).is_none());
        }

        #[test]
        fn single_index() {
            let range = IndexRange::new(0, 0).unwrap();
            assert_eq!(range.len(), 1);
            assert_eq!(range.iter().collect::<Vec<_>>(), vec![0]);
        }

        #[test]
        fn iterates_ascending() {
            let range = IndexRange::new(2, 4).unwrap();
            assert_eq!(range.iter().collect::<Vec<_>>(), vec![2, 3, 4]);
            assert!(range.contains(3));
            assert!(!range.contains(5));
            assert_eq!(format!("{range}"), "[2,4]");
        }
    }
}
