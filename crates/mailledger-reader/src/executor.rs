//! Plan execution against a folder.

use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Interrupted, Result};
use crate::session::MailFolder;
use crate::strategy::{Plan, slice_search_results};
use crate::types::{IdSet, IndexRange, Message, MessageId, MessageSummary, SummaryItems};

/// Messages one call retrieves, resolved against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Window {
    Empty,
    Ids(IdSet),
    Indices(IndexRange),
    Top(IndexRange),
}

/// A single message to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Target {
    Id(MessageId),
    Index(u32),
}

/// Messages to retrieve one by one, in retrieval order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct Targets {
    items: VecDeque<Target>,
    newest_first: bool,
}

impl Targets {
    /// Same targets in ascending order.
    pub(crate) fn ascending(mut self) -> VecDeque<Target> {
        if self.newest_first {
            self.items.make_contiguous().reverse();
        }
        self.items
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// Runs the search of a search plan and slices the results; other plans map
/// directly onto a window.
pub(crate) async fn resolve_window<F>(folder: &mut F, plan: Plan, cap: u32) -> Result<Window>
where
    F: MailFolder + ?Sized,
{
    let window = match plan {
        Plan::Empty => Window::Empty,
        Plan::Ids(range) => Window::Ids(IdSet::Range(range)),
        Plan::Indices(range) => Window::Indices(range),
        Plan::Top(range) => Window::Top(range),
        Plan::Search { query, skip, take } => {
            let candidates = folder.search(&query).await?;
            tracing::trace!(matches = candidates.len(), %query, "Search complete");
            let ids = slice_search_results(candidates, skip, take, cap);
            if ids.is_empty() {
                Window::Empty
            } else {
                Window::Ids(IdSet::List(ids))
            }
        }
    };
    Ok(window)
}

/// Fetches summaries for a window, ascending by identifier or index.
pub(crate) async fn fetch_summaries<F>(
    folder: &mut F,
    window: &Window,
    items: &SummaryItems,
) -> Result<Vec<MessageSummary>>
where
    F: MailFolder + ?Sized,
{
    let summaries = match window {
        Window::Empty => Vec::new(),
        Window::Ids(set) => {
            let mut summaries = folder.fetch_by_ids(set, items).await?;
            summaries.retain(|s| set.contains(s.id));
            summaries.sort_by_key(|s| s.id);
            summaries
        }
        Window::Indices(range) | Window::Top(range) => {
            let mut summaries = folder.fetch_by_index_range(*range, items).await?;
            summaries.sort_by_key(|s| s.index);
            summaries
        }
    };
    tracing::trace!(folder = folder.name(), count = summaries.len(), "Received summaries");
    Ok(summaries)
}

/// Lists the messages of a window. Identifier windows are checked against the
/// server first; identifiers that no longer exist are dropped.
pub(crate) async fn message_targets<F>(folder: &mut F, window: &Window) -> Result<Targets>
where
    F: MailFolder + ?Sized,
{
    let targets = match window {
        Window::Empty => Targets::default(),
        Window::Ids(set) => {
            let found = folder.fetch_by_ids(set, &SummaryItems::new()).await?;
            let mut ids: Vec<MessageId> = found
                .into_iter()
                .map(|s| s.id)
                .filter(|id| set.contains(*id))
                .collect();
            ids.sort_unstable();
            ids.dedup();
            Targets {
                items: ids.into_iter().map(Target::Id).collect(),
                newest_first: false,
            }
        }
        Window::Indices(range) => Targets {
            items: range.iter().map(Target::Index).collect(),
            newest_first: false,
        },
        Window::Top(range) => Targets {
            items: range.iter().rev().map(Target::Index).collect(),
            newest_first: true,
        },
    };
    Ok(targets)
}

/// Retrieves one message. `None` if the server no longer has it.
pub(crate) async fn fetch_one<F>(folder: &mut F, target: Target) -> Result<Option<Message>>
where
    F: MailFolder + ?Sized,
{
    let message = match target {
        Target::Id(id) => folder.get_message_by_id(id).await?,
        Target::Index(index) => folder.get_message_by_index(index).await?,
    };
    match &message {
        Some(m) => tracing::trace!(id = %m.id, size = m.len(), "Received message"),
        None => tracing::debug!(?target, "Message no longer exists"),
    }
    Ok(message)
}

/// Retrieves messages one at a time, checking for cancellation before each.
///
/// The first failure ends the batch. Messages retrieved so far are returned
/// with it. Results are in ascending order.
pub(crate) async fn fetch_messages<F>(
    folder: &mut F,
    targets: Targets,
    cancel: &CancellationToken,
) -> std::result::Result<Vec<Message>, Interrupted<Message>>
where
    F: MailFolder + ?Sized,
{
    let newest_first = targets.newest_first;
    let mut fetched = Vec::with_capacity(targets.items.len());
    let mut failure = None;

    for target in targets.items {
        if cancel.is_cancelled() {
            failure = Some(Error::Cancelled);
            break;
        }
        match fetch_one(folder, target).await {
            Ok(Some(message)) => fetched.push(message),
            Ok(None) => {}
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if newest_first {
        fetched.reverse();
    }
    match failure {
        None => Ok(fetched),
        Some(error) => Err(Interrupted::with_fetched(fetched, error)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::FolderAccess;
    use crate::memory::{Call, Fault, MemoryFolder};
    use crate::query::Take;
    use crate::search::SearchQuery;
    use crate::types::IdRange;

    async fn open_folder(count: u32) -> MemoryFolder {
        let mut folder = MemoryFolder::with_messages("INBOX", count);
        folder.open(FolderAccess::ReadWrite).await.unwrap();
        folder.clear_calls();
        folder
    }

    fn ids(messages: &[Message]) -> Vec<u32> {
        messages.iter().map(|m| m.id.get()).collect()
    }

    #[tokio::test]
    async fn test_search_window_is_sliced() {
        let mut folder = open_folder(10).await;
        let plan = Plan::Search {
            query: SearchQuery::Unseen,
            skip: 2,
            take: Take::Count(3),
        };
        let window = resolve_window(&mut folder, plan, 250).await.unwrap();
        assert_eq!(window, Window::Ids(IdSet::from_ids([6, 7, 8].map(MessageId::new))));
        assert_eq!(folder.calls(), &[Call::Search("UNSEEN".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_window_makes_no_calls() {
        let mut folder = open_folder(3).await;
        let summaries = fetch_summaries(&mut folder, &Window::Empty, &SummaryItems::new())
            .await
            .unwrap();
        assert!(summaries.is_empty());
        let targets = message_targets(&mut folder, &Window::Empty).await.unwrap();
        assert_eq!(targets.len(), 0);
        assert!(folder.calls().is_empty());
    }

    #[tokio::test]
    async fn test_id_window_drops_expunged() {
        let mut folder = open_folder(6).await;
        folder.expunge(MessageId::new(4));
        let window = Window::Ids(IdSet::Range(IdRange::new(
            MessageId::new(3),
            MessageId::new(5),
        )));

        let summaries = fetch_summaries(&mut folder, &window, &SummaryItems::new())
            .await
            .unwrap();
        let found: Vec<u32> = summaries.iter().map(|s| s.id.get()).collect();
        assert_eq!(found, vec![3, 5]);

        let targets = message_targets(&mut folder, &window).await.unwrap();
        assert_eq!(
            targets.ascending(),
            VecDeque::from([Target::Id(MessageId::new(3)), Target::Id(MessageId::new(5))])
        );
    }

    #[tokio::test]
    async fn test_top_messages_are_chronological() {
        let mut folder = open_folder(5).await;
        let window = Window::Top(IndexRange::new(2, 4).unwrap());
        let targets = message_targets(&mut folder, &window).await.unwrap();
        let messages = fetch_messages(&mut folder, targets, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(ids(&messages), vec![3, 4, 5]);
        assert_eq!(
            folder.calls(),
            &[Call::GetByIndex(4), Call::GetByIndex(3), Call::GetByIndex(2)]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_results() {
        let mut folder = open_folder(5).await;
        folder.inject(Fault::Message(MessageId::new(3)));
        let window = Window::Indices(IndexRange::new(0, 4).unwrap());
        let targets = message_targets(&mut folder, &window).await.unwrap();
        let err = fetch_messages(&mut folder, targets, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(ids(&err.fetched), vec![1, 2]);
        assert!(matches!(err.error, Error::Session(_)));
        assert_eq!(folder.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_item() {
        let mut folder = open_folder(5).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let window = Window::Indices(IndexRange::new(0, 4).unwrap());
        let targets = message_targets(&mut folder, &window).await.unwrap();
        let err = fetch_messages(&mut folder, targets, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(err.fetched.is_empty());
        assert!(folder.calls().is_empty());
    }
}
