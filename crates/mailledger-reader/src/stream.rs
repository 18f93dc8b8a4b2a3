//! Lazy message retrieval.
//!
//! The stream plans its window on first poll and retrieves one message per
//! item. It records the folder as retained as soon as it owns it, so a stream
//! dropped half way leaves the reader able to close the folder later.

use std::collections::VecDeque;

use futures::Stream;
use futures::stream;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::executor::{self, Target};
use crate::lease::FolderLease;
use crate::query::{QuerySpec, SelectionMode};
use crate::reader::MailReader;
use crate::session::MailFolder;
use crate::strategy::{self, Planned};
use crate::types::Message;

enum State {
    Start,
    Fetching {
        lease: FolderLease,
        spec: QuerySpec,
        mode: SelectionMode,
        count: u32,
        targets: VecDeque<Target>,
        delivered: usize,
    },
    Done,
}

pub(crate) fn messages<F: MailFolder>(
    reader: &mut MailReader<F>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Message>> + '_ {
    stream::unfold(
        (reader, cancel, State::Start),
        |(reader, cancel, mut state)| async move {
            loop {
                match state {
                    State::Done => return None,
                    State::Start => match start(reader).await {
                        Ok(Some(next)) => state = next,
                        Ok(None) => return None,
                        Err(e) => return Some((Err(e), (reader, cancel, State::Done))),
                    },
                    State::Fetching {
                        lease,
                        spec,
                        mode,
                        count,
                        mut targets,
                        delivered,
                    } => {
                        let Some(target) = targets.pop_front() else {
                            tracing::trace!(
                                folder = reader.folder.name(),
                                count = delivered,
                                "Message stream finished"
                            );
                            reader.complete(lease, spec, mode, delivered, count).await;
                            return None;
                        };
                        // Only checked while messages remain; a fully delivered window completes.
                        if cancel.is_cancelled() {
                            reader.retained = false;
                            lease.abandon(&mut reader.folder).await;
                            return Some((Err(Error::Cancelled), (reader, cancel, State::Done)));
                        }
                        match executor::fetch_one(&mut reader.folder, target).await {
                            Ok(Some(message)) => {
                                let next = State::Fetching {
                                    lease,
                                    spec,
                                    mode,
                                    count,
                                    targets,
                                    delivered: delivered + 1,
                                };
                                return Some((Ok(message), (reader, cancel, next)));
                            }
                            Ok(None) => {
                                state = State::Fetching {
                                    lease,
                                    spec,
                                    mode,
                                    count,
                                    targets,
                                    delivered,
                                };
                            }
                            Err(e) => {
                                reader.retained = false;
                                lease.abandon(&mut reader.folder).await;
                                return Some((Err(e), (reader, cancel, State::Done)));
                            }
                        }
                    }
                }
            }
        },
    )
}

/// Opens the folder and resolves the window. `None` if there is nothing to
/// retrieve and no I/O was needed.
async fn start<F: MailFolder>(reader: &mut MailReader<F>) -> Result<Option<State>> {
    if reader.spec.take().is_zero() {
        tracing::info!("Take(0) returns no results");
        return Ok(None);
    }

    let retained = std::mem::take(&mut reader.retained);
    let lease =
        FolderLease::acquire(&mut reader.folder, reader.config.folder_access, retained).await?;
    reader.retained = lease.is_owned();

    let count = reader.folder.count();
    let mode = reader.spec.selection().mode();
    let cap = reader.config.search_cap;
    let Planned { spec, plan } = strategy::plan(reader.spec.clone(), count, cap);

    let targets = match executor::resolve_window(&mut reader.folder, plan, cap).await {
        Ok(window) => executor::message_targets(&mut reader.folder, &window).await,
        Err(e) => Err(e),
    };
    match targets {
        Ok(targets) => Ok(Some(State::Fetching {
            lease,
            spec,
            mode,
            count,
            targets: targets.ascending(),
            delivered: 0,
        })),
        Err(e) => {
            reader.retained = false;
            lease.abandon(&mut reader.folder).await;
            Err(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::memory::{Fault, MemoryFolder};
    use crate::types::MessageId;

    fn reader(count: u32) -> MailReader<MemoryFolder> {
        MailReader::new(MemoryFolder::with_messages("INBOX", count))
    }

    #[tokio::test]
    async fn test_stream_yields_window_and_advances() {
        let mut reader = reader(10);
        reader.take(4, true).unwrap();

        let ids: Vec<u32> = reader
            .message_stream(CancellationToken::new())
            .map(|m| m.unwrap().id.get())
            .collect()
            .await;
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(reader.spec().skip(), 4);
        assert!(reader.retains_folder());
        reader.finish().await;
        assert!(!reader.folder().is_open());
    }

    #[tokio::test]
    async fn test_stream_top_is_ascending() {
        let mut reader = reader(5);
        reader.top(3).unwrap();
        let ids: Vec<u32> = reader
            .message_stream(CancellationToken::new())
            .map(|m| m.unwrap().id.get())
            .collect()
            .await;
        assert_eq!(ids, vec![3, 4, 5]);
        assert!(!reader.folder().is_open());
    }

    #[tokio::test]
    async fn test_stream_take_zero_is_empty() {
        let mut reader = reader(5);
        reader.take(0, false).unwrap();
        let items: Vec<_> = reader.message_stream(CancellationToken::new()).collect().await;
        assert!(items.is_empty());
        assert!(reader.folder().calls().is_empty());
    }

    #[tokio::test]
    async fn test_stream_cancellation_is_terminal() {
        let mut reader = reader(5);
        let cancel = CancellationToken::new();
        let mut items = Vec::new();
        {
            let mut stream = std::pin::pin!(reader.message_stream(cancel.clone()));
            while let Some(item) = stream.next().await {
                let done = item.is_err();
                items.push(item);
                if items.len() == 2 {
                    cancel.cancel();
                }
                if done {
                    break;
                }
            }
        }
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_ok());
        assert!(matches!(items[2], Err(Error::Cancelled)));
        assert!(!reader.folder().is_open());
        assert_eq!(reader.spec().skip(), 0);
    }

    #[tokio::test]
    async fn test_cancel_after_last_item_completes_window() {
        let mut reader = reader(5);
        reader.take(2, true).unwrap();
        let cancel = CancellationToken::new();
        let mut items = Vec::new();
        {
            let mut stream = std::pin::pin!(reader.message_stream(cancel.clone()));
            while let Some(item) = stream.next().await {
                items.push(item.unwrap().id.get());
                if items.len() == 2 {
                    cancel.cancel();
                }
            }
        }
        assert_eq!(items, vec![1, 2]);
        assert_eq!(reader.spec().skip(), 2);
        assert!(reader.spec().is_continuous());

        let next: Vec<u32> = reader
            .message_stream(CancellationToken::new())
            .map(|m| m.unwrap().id.get())
            .collect()
            .await;
        assert_eq!(next, vec![3, 4]);
        reader.finish().await;
    }

    #[tokio::test]
    async fn test_dropped_stream_leaves_folder_closable() {
        let mut reader = reader(5);
        {
            let mut stream = std::pin::pin!(reader.message_stream(CancellationToken::new()));
            let first = stream.next().await.unwrap().unwrap();
            assert_eq!(first.id, MessageId::new(1));
        }
        assert!(reader.folder().is_open());
        assert!(reader.retains_folder());
        reader.finish().await;
        assert!(!reader.folder().is_open());
    }

    #[tokio::test]
    async fn test_stream_error_ends_stream() {
        let mut reader = reader(5);
        reader.folder_mut().inject(Fault::Message(MessageId::new(2)));
        let items: Vec<_> = reader.message_stream(CancellationToken::new()).collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(Error::Session(_))));
        assert!(!reader.folder().is_open());
        assert!(!reader.retains_folder());
    }
}
