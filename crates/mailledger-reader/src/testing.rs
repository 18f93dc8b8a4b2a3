//! Test helpers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts `WARN` events.
#[derive(Debug, Clone, Default)]
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Runs `f` with a subscriber installed for the current thread and returns its
/// result together with the number of warnings it logged.
pub(crate) fn count_warnings<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let counter = WarnCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let result = {
        let _guard = tracing::subscriber::set_default(subscriber);
        f()
    };
    (result, counter.0.load(Ordering::SeqCst))
}
