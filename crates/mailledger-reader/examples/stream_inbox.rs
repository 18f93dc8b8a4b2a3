//! Walks an in-memory inbox in batches, then saves the newest messages.
//!
//! Run with `RUST_LOG=mailledger_reader=trace` to see each window.

use anyhow::Context;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailledger_reader::{
    FileSink, MailFolder, MailReader, MemoryFolder, MessageId, SearchQuery, SummaryItems,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailledger_reader=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut inbox = MemoryFolder::with_messages("INBOX", 23);
    for id in [4, 9, 17] {
        inbox.set_flags(MessageId::new(id), ["\\Seen"]);
    }

    let mut reader = MailReader::new(inbox);
    reader.take(10, true)?.items(SummaryItems::core());

    let cancel = CancellationToken::new();
    let processed = reader
        .process_summaries(
            |summary| async move {
                println!(
                    "#{:<3} {:<12} {}",
                    summary.id,
                    summary.subject.as_deref().unwrap_or("(no subject)"),
                    summary.size.unwrap_or_default()
                );
                Ok(())
            },
            &cancel,
        )
        .await?;
    println!("{processed} summaries in {reader}");

    let mut reader = MailReader::new(reader.into_folder());
    reader.query(SearchQuery::Unseen).take(3, false)?;
    let mut messages = std::pin::pin!(reader.message_stream(cancel.clone()));
    while let Some(message) = messages.next().await {
        let message = message?;
        println!("{} {}", message.id, message.message_id.as_deref().unwrap_or("-"));
    }

    let dir = tempfile::tempdir().context("creating demo directory")?;
    let mut reader = MailReader::new(MemoryFolder::with_messages("Archive", 5));
    reader.top(2)?;
    let saved = reader
        .save_all(&FileSink::default(), dir.path(), false, &cancel)
        .await
        .context("saving archive")?;
    for path in saved {
        println!("saved {}", path.display());
    }
    println!("archive open after save: {}", reader.folder().is_open());
    Ok(())
}
