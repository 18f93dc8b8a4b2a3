//! Selection planning.
//!
//! Turns a [`QuerySpec`] and the live folder size into a [`Plan`] for one
//! call. Planning never touches the folder; the executor resolves a plan into
//! a concrete window.

use crate::query::{QuerySpec, Selection, Take};
use crate::search::SearchQuery;
use crate::types::{IdRange, IndexRange, MessageId};

/// What one call retrieves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Nothing; no fetch is issued.
    Empty,
    /// Identifiers in a range, validated against the server.
    Ids(IdRange),
    /// A slice of search results, newest first.
    Search {
        /// The query to run.
        query: SearchQuery,
        /// Results skipped from the newest end.
        skip: u32,
        /// Results taken after skipping.
        take: Take,
    },
    /// Folder indexes, ascending.
    Indices(IndexRange),
    /// The last N folder indexes.
    Top(IndexRange),
}

impl Plan {
    /// Returns true for [`Plan::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// A plan together with the spec it was computed from.
///
/// Planning may adjust the spec (a continuous index query snaps an
/// out-of-range offset to the folder size), so the caller keeps this spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    /// Spec after any planning adjustments.
    pub spec: QuerySpec,
    /// The plan.
    pub plan: Plan,
}

/// Plans one call against a folder holding `count` messages.
#[must_use]
pub fn plan(spec: QuerySpec, count: u32, search_cap: u32) -> Planned {
    if spec.take().is_zero() {
        return Planned {
            spec,
            plan: Plan::Empty,
        };
    }

    let beyond = matches!(spec.selection(), Selection::Index { skip, .. } if skip >= count);
    if beyond {
        return beyond_folder(spec, count);
    }

    let plan = match spec.selection() {
        Selection::IdRange(range) => {
            if range.is_inverted() {
                tracing::debug!(%range, "Identifier range is inverted");
                Plan::Empty
            } else {
                Plan::Ids(range)
            }
        }
        Selection::Search { query, skip, take } => {
            if skip >= search_cap {
                tracing::warn!(skip, search_cap, "Skip exceeds the search result limit");
                Plan::Empty
            } else {
                if search_cap_exceeded(skip, take, search_cap) {
                    tracing::warn!(
                        skip,
                        %take,
                        search_cap,
                        "Skip and take exceed the search result limit, results will be truncated"
                    );
                }
                Plan::Search {
                    query: query.clone(),
                    skip,
                    take,
                }
            }
        }
        Selection::Top(top) => top_range(count, top.get()).map_or(Plan::Empty, Plan::Top),
        Selection::Index { skip, take } => {
            let last = count.saturating_sub(1);
            let end = match take {
                Take::All => last,
                Take::Count(n) => skip.saturating_add(n.saturating_sub(1)).min(last),
            };
            IndexRange::new(skip, end).map_or(Plan::Empty, Plan::Indices)
        }
    };

    Planned { spec, plan }
}

fn top_range(count: u32, top: u32) -> Option<IndexRange> {
    if count == 0 {
        return None;
    }
    let end = count - 1;
    let start = end.saturating_sub(top.saturating_sub(1));
    IndexRange::new(start, end)
}

fn beyond_folder(spec: QuerySpec, count: u32) -> Planned {
    let skip = spec.skip();
    let spec = if spec.is_continuous() {
        if skip != count {
            tracing::info!(skip, count, "Skip limited to folder count");
        }
        spec.with_next_skip(count)
    } else {
        tracing::warn!(skip, count, "Skip is beyond the end of the folder");
        spec
    };
    Planned {
        spec,
        plan: Plan::Empty,
    }
}

/// Returns true if a counted slice reaches past the search result cap.
#[must_use]
pub fn search_cap_exceeded(skip: u32, take: Take, cap: u32) -> bool {
    take.count()
        .is_some_and(|n| u64::from(skip) + u64::from(n) > u64::from(cap))
}

/// Slices search results newest first, then returns them ascending.
///
/// Never returns more than `cap` identifiers.
#[must_use]
pub fn slice_search_results(
    mut candidates: Vec<MessageId>,
    skip: u32,
    take: Take,
    cap: u32,
) -> Vec<MessageId> {
    candidates.sort_unstable_by(|a, b| b.cmp(a));
    candidates.dedup();

    let limit = take.count().map_or(cap, |n| n.min(cap));
    let mut window: Vec<MessageId> = candidates
        .into_iter()
        .skip(skip as usize)
        .take(limit as usize)
        .collect();
    window.reverse();
    window
}
