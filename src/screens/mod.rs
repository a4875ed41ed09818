//! State holders for the presentation layer. Each one subscribes to
//! repository streams inside its own [`Scope`] and publishes a
//! [`ScreenState`] through a `watch` channel; dropping the holder cancels
//! its subscriptions. Outcomes of user actions arrive once each on a
//! [`Messages`] queue.

mod notice;
mod poems;
mod settings;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::Result;

pub use notice::{NoticeScreen, NoticeView};
pub use poems::{PoemDetail, PoemDetailScreen, PoemListScreen};
pub use settings::SettingsScreen;

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState<T> {
    Loading,
    Ready(T),
    /// Nothing exists for the requested id or key.
    NotFound,
    /// The screen was opened without the key it needs.
    MissingKey,
    Failed(String),
}

impl<T> ScreenState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ScreenState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ScreenState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// What happened after a user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Favorited,
    Unfavorited,
    MarkedRead,
    UnmarkedRead,
    Deleted,
    FavoriteFailed,
    ReadFailed,
    DeleteFailed,
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Feedback::Favorited => "Poesia marcada como favorita",
            Feedback::Unfavorited => "Poesia removida das favoritas",
            Feedback::MarkedRead => "Poesia marcada como lida",
            Feedback::UnmarkedRead => "Poesia marcada como não lida",
            Feedback::Deleted => "Excluído com sucesso",
            Feedback::FavoriteFailed => "Não foi possível atualizar o favorito",
            Feedback::ReadFailed => "Não foi possível atualizar a leitura",
            Feedback::DeleteFailed => "Não foi possível excluir a poesia",
        };
        f.write_str(text)
    }
}

/// A one-shot message for the user. Toasts confirm, snackbars report
/// something that needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    Toast(Feedback),
    Snackbar(Feedback),
}

impl UserMessage {
    pub fn feedback(&self) -> Feedback {
        match self {
            UserMessage::Toast(feedback) | UserMessage::Snackbar(feedback) => *feedback,
        }
    }
}

/// Queue of messages a screen has produced but the UI has not shown yet.
pub struct Messages {
    tx: mpsc::UnboundedSender<UserMessage>,
    rx: mpsc::UnboundedReceiver<UserMessage>,
}

impl Default for Messages {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Messages {
    fn send(&self, message: UserMessage) {
        let _ = self.tx.send(message);
    }

    /// Next pending message, without waiting.
    pub fn poll(&mut self) -> Option<UserMessage> {
        self.rx.try_recv().ok()
    }

    pub async fn next(&mut self) -> Option<UserMessage> {
        self.rx.recv().await
    }
}

/// Tasks owned by one screen, aborted when the scope is dropped.
#[derive(Default)]
pub struct Scope {
    tasks: Vec<JoinHandle<()>>,
}

impl Scope {
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(tokio::spawn(task));
    }

    pub fn cancel(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.cancel();
    }
}

type StateSender<T> = Arc<watch::Sender<ScreenState<T>>>;

fn state_channel<T>() -> StateSender<T> {
    Arc::new(watch::Sender::new(ScreenState::Loading))
}

/// Drive `stream` into `state`, turning each result into a screen state.
fn publish<T, U, S, F>(stream: S, state: StateSender<U>, mut to_state: F) -> impl Future<Output = ()> + Send
where
    S: Stream<Item = Result<T>> + Send + Unpin + 'static,
    T: Send + 'static,
    U: Send + Sync + 'static,
    F: FnMut(T) -> ScreenState<U> + Send + 'static,
{
    let mut stream = stream;
    async move {
        while let Some(item) = stream.next().await {
            let next = match item {
                Ok(value) => to_state(value),
                Err(e) => {
                    tracing::error!("Screen stream failed: {}", e);
                    ScreenState::Failed(e.to_string())
                }
            };
            state.send_replace(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn dropping_scope_aborts_tasks() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let mut scope = Scope::default();
        scope.spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(scope);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn publish_maps_errors_to_failed() {
        let items: Vec<Result<u8>> = vec![
            Ok(1),
            Err(crate::error::AppError::Invalid("disco".into())),
        ];
        let state = state_channel();
        publish(futures::stream::iter(items), Arc::clone(&state), ScreenState::Ready).await;

        let last = state.borrow().clone();
        assert_eq!(last, ScreenState::Failed("Invalid value: disco".into()));
    }

    #[test]
    fn messages_arrive_once_in_order() {
        let mut messages = Messages::default();
        messages.send(UserMessage::Toast(Feedback::Deleted));
        messages.send(UserMessage::Snackbar(Feedback::ReadFailed));

        assert_eq!(messages.poll(), Some(UserMessage::Toast(Feedback::Deleted)));
        assert_eq!(messages.poll().map(|m| m.feedback()), Some(Feedback::ReadFailed));
        assert_eq!(messages.poll(), None);
        assert_eq!(Feedback::Deleted.to_string(), "Excluído com sucesso");
    }
}
