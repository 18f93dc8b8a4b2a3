//! Message identifiers.
//!
//! Server-assigned unique identifiers and the zero-based folder index used by
//! positional windows.

use serde::{Deserialize, Serialize};

/// Unique identifier for a message within a folder.
///
/// Identifiers are issued in increasing order by the server but are not
/// contiguous: expunged messages leave gaps. All arithmetic on them is
/// explicit about overflow, see [`MessageId::checked_add`] and
/// [`MessageId::saturating_add`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl MessageId {
    /// Smallest representable identifier.
    pub const MIN: Self = Self(u32::MIN);

    /// Largest representable identifier.
    pub const MAX: Self = Self(u32::MAX);

    /// Creates a new identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns true if this is [`MessageId::MAX`].
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 == u32::MAX
    }

    /// Adds `n`, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, n: u32) -> Option<Self> {
        match self.0.checked_add(n) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Adds `n`, clamping to [`MessageId::MAX`] on overflow.
    #[must_use]
    pub const fn saturating_add(self, n: u32) -> Self {
        Self(self.0.saturating_add(n))
    }
}

impl From<u32> for MessageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn new_and_get() {
        let id = MessageId::new(4242);
        assert_eq!(id.get(), 4242);
        assert_eq!(MessageId::from(4242), id);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", MessageId::new(12345)), "12345");
    }

    #[test]
    fn ordering() {
        assert!(MessageId::new(100) < MessageId::new(200));
        assert!(MessageId::MIN < MessageId::MAX);
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(MessageId::new(1).checked_add(2), Some(MessageId::new(3)));
        assert_eq!(MessageId::new(u32::MAX - 1).checked_add(2), None);
        assert_eq!(MessageId::MAX.checked_add(0), Some(MessageId::MAX));
    }

    #[test]
    fn saturating_add_clamps() {
        assert_eq!(MessageId::new(u32::MAX - 10).saturating_add(50), MessageId::MAX);
        assert!(MessageId::new(u32::MAX - 10).saturating_add(50).is_max());
        assert!(!MessageId::new(7).is_max());
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&MessageId::new(987654321)).unwrap();
        assert_eq!(json, "987654321");
        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(), 987654321);
    }
}
