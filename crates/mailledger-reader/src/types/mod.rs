//! Core reader types.
//!
//! Identifiers, ranges, requested fields and retrieved message data.

mod identifiers;
mod items;
mod message;
mod sequence;

pub use identifiers::MessageId;
pub use items::{SummaryItem, SummaryItems};
pub(crate) use message::header_value;
pub use message::{Message, MessageSummary};
pub use sequence::{IdRange, IdSet, IndexRange};
