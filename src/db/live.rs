use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::error::Result;

/// Stream of query results that re-emits whenever the watched source changes.
pub type LiveStream<T> = BoxStream<'static, Result<T>>;

/// Run `query` now and again after every change signalled on `changes`.
///
/// A failed run is yielded as an `Err` item and the stream keeps waiting for
/// the next change. The stream ends once every sender is gone; dropping it
/// unsubscribes.
pub fn live_query<T, F, Fut>(changes: watch::Receiver<u64>, query: F) -> LiveStream<T>
where
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    stream::unfold(
        (changes, query, true),
        |(mut changes, mut query, first)| async move {
            if !first && changes.changed().await.is_err() {
                return None;
            }
            // Anything that lands while the query runs triggers another pass.
            changes.borrow_and_update();
            let item = query().await;
            Some((item, (changes, query, false)))
        },
    )
    .boxed()
}
