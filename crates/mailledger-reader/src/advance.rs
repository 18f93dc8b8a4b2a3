//! Continuation between calls.
//!
//! After each call the reader asks [`advance`] for the spec the next call
//! should use. A continuous spec either moves its window forward or stops for
//! good; it never wraps.

use crate::query::{QuerySpec, SelectionMode, Take};
use crate::types::IdRange;

/// Outcome of advancing a spec after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// The spec was not continuous; returned unchanged.
    Stopped(QuerySpec),
    /// Nothing more to retrieve; continuation is now off.
    Exhausted(QuerySpec),
    /// The spec for the next window.
    Next(QuerySpec),
}

impl Continuation {
    /// Returns true if another call would retrieve a new window.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Next(_))
    }

    /// Returns the spec for the next call.
    #[must_use]
    pub fn into_spec(self) -> QuerySpec {
        match self {
            Self::Stopped(spec) | Self::Exhausted(spec) | Self::Next(spec) => spec,
        }
    }
}

/// Computes the spec that follows a call which returned `returned` items
/// using `mode`, against a folder of `count` messages.
#[must_use]
pub fn advance(spec: QuerySpec, mode: SelectionMode, returned: usize, count: u32) -> Continuation {
    if !spec.is_continuous() {
        return Continuation::Stopped(spec);
    }
    if returned == 0 {
        tracing::debug!(%mode, "No items returned, continuation finished");
        return Continuation::Exhausted(spec.stopped());
    }

    match mode {
        SelectionMode::IdRange => match spec.id_range().and_then(next_range) {
            Some(range) => {
                tracing::debug!(%range, "Advancing identifier range");
                Continuation::Next(spec.with_next_range(range))
            }
            None => {
                tracing::debug!("Identifier range reached its upper bound");
                Continuation::Exhausted(spec.stopped())
            }
        },
        SelectionMode::Search | SelectionMode::Index => {
            let step = match spec.take() {
                Take::All | Take::Count(0) => None,
                Take::Count(n) => spec.skip().checked_add(n),
            };
            match step {
                Some(skip) => {
                    let skip = skip.min(count);
                    tracing::debug!(skip, "Advancing offset");
                    Continuation::Next(spec.with_next_skip(skip))
                }
                None => Continuation::Exhausted(spec.stopped()),
            }
        }
        SelectionMode::Top => Continuation::Exhausted(spec.stopped()),
    }
}

/// Shifts a range forward by its own size.
///
/// Returns `None` when the range already ends at the maximum identifier or is
/// inverted.
fn next_range(range: IdRange) -> Option<IdRange> {
    if range.end().is_max() || range.is_inverted() {
        return None;
    }
    let start = range.end().checked_add(1)?;
    let size = start.get() - range.start().get();
    Some(IdRange::new(start, range.end().saturating_add(size)))
}
