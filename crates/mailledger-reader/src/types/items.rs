//! Message summary fields requested from the server.

use std::collections::BTreeSet;

/// A metadata field that can be requested for a message summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SummaryItem {
    /// Unique identifier. Always requested.
    UniqueId,
    /// Envelope (subject, addresses, date, Message-ID).
    Envelope,
    /// Message flags.
    Flags,
    /// Internal (arrival) date.
    InternalDate,
    /// Message size in bytes.
    Size,
    /// Full header block.
    Headers,
    /// MIME body structure.
    BodyStructure,
    /// `References` header.
    References,
}

impl SummaryItem {
    /// Returns the IMAP FETCH attribute for this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UniqueId => "UID",
            Self::Envelope => "ENVELOPE",
            Self::Flags => "FLAGS",
            Self::InternalDate => "INTERNALDATE",
            Self::Size => "RFC822.SIZE",
            Self::Headers => "BODY.PEEK[HEADER]",
            Self::BodyStructure => "BODYSTRUCTURE",
            Self::References => "BODY.PEEK[HEADER.FIELDS (REFERENCES)]",
        }
    }
}

impl std::fmt::Display for SummaryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of summary fields.
///
/// [`SummaryItem::UniqueId`] is a member of every set; there is no way to
/// remove it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItems {
    items: BTreeSet<SummaryItem>,
}

impl SummaryItems {
    /// Creates a set containing only the unique identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: BTreeSet::from([SummaryItem::UniqueId]),
        }
    }

    /// Creates a set from the given fields plus the unique identifier.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = SummaryItem>) -> Self {
        let mut set = Self::new();
        set.items.extend(items);
        set
    }

    /// Unique identifier and envelope.
    #[must_use]
    pub fn envelope() -> Self {
        Self::from_items([SummaryItem::Envelope])
    }

    /// Fields typically needed to present a message without downloading it:
    /// envelope, headers, size and body structure.
    #[must_use]
    pub fn core() -> Self {
        Self::from_items([
            SummaryItem::Envelope,
            SummaryItem::Headers,
            SummaryItem::Size,
            SummaryItem::BodyStructure,
        ])
    }

    /// Adds a field.
    #[must_use]
    pub fn with(mut self, item: SummaryItem) -> Self {
        self.items.insert(item);
        self
    }

    /// Returns the union of both sets.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            items: self.items.union(&other.items).copied().collect(),
        }
    }

    /// Returns true if the field is requested.
    #[must_use]
    pub fn contains(&self, item: SummaryItem) -> bool {
        self.items.contains(&item)
    }

    /// Returns an iterator over the fields in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = SummaryItem> + '_ {
        self.items.iter().copied()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; the unique identifier is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for SummaryItems {
    fn default() -> Self {
        Self::envelope()
    }
}

impl FromIterator<SummaryItem> for SummaryItems {
    fn from_iter<I: IntoIterator<Item = SummaryItem>>(iter: I) -> Self {
        Self::from_items(iter)
    }
}

impl std::fmt::Display for SummaryItems {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: Vec<_> = self.items.iter().map(|item| item.as_str()).collect();
        write!(f, "({})", s.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_contains_only_uid() {
        let items = SummaryItems::new();
        assert_eq!(items.len(), 1);
        assert!(items.contains(SummaryItem::UniqueId));
        assert!(!items.is_empty());
    }

    #[test]
    fn default_is_envelope() {
        let items = SummaryItems::default();
        assert!(items.contains(SummaryItem::UniqueId));
        assert!(items.contains(SummaryItem::Envelope));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn from_items_always_adds_uid() {
        let items = SummaryItems::from_items([SummaryItem::Flags]);
        assert!(items.contains(SummaryItem::UniqueId));
        assert!(items.contains(SummaryItem::Flags));
    }

    #[test]
    fn collect_adds_uid() {
        let items: SummaryItems = [SummaryItem::Size].into_iter().collect();
        assert!(items.contains(SummaryItem::UniqueId));
    }

    #[test]
    fn core_preset() {
        let items = SummaryItems::core();
        for item in [
            SummaryItem::UniqueId,
            SummaryItem::Envelope,
            SummaryItem::Headers,
            SummaryItem::Size,
            SummaryItem::BodyStructure,
        ] {
            assert!(items.contains(item), "missing {item}");
        }
        assert!(!items.contains(SummaryItem::Flags));
    }

    #[test]
    fn union_and_with() {
        let a = SummaryItems::new().with(SummaryItem::Flags);
        let b = SummaryItems::from_items([SummaryItem::Size]);
        let both = a.union(&b);
        assert_eq!(both.len(), 3);
    }

    #[test]
    fn display_as_fetch_list() {
        let items = SummaryItems::from_items([SummaryItem::Flags, SummaryItem::Envelope]);
        assert_eq!(items.to_string(), "(UID ENVELOPE FLAGS)");
    }
}
