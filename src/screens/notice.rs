use std::sync::Arc;

use tokio::sync::watch;

use crate::db::NoticeRepository;
use crate::markup::{self, ContentElement};
use crate::models::Notice;

use super::{publish, state_channel, Scope, ScreenState, StateSender};

#[derive(Debug, Clone, PartialEq)]
pub struct NoticeView {
    pub notice: Notice,
    pub elements: Vec<ContentElement>,
}

/// An informational page looked up by key.
pub struct NoticeScreen {
    state: StateSender<NoticeView>,
    tooltip: watch::Sender<Option<String>>,
    _scope: Scope,
}

impl NoticeScreen {
    pub fn open(repo: &NoticeRepository, key: Option<String>) -> Self {
        let mut scope = Scope::default();
        let state = state_channel();

        match key {
            None => {
                tracing::warn!("Notice screen opened without a key");
                state.send_replace(ScreenState::MissingKey);
            }
            Some(key) => {
                let stream = repo.watch_notice(key.clone());
                scope.spawn(publish(stream, Arc::clone(&state), move |notice| match notice {
                    Some(notice) => {
                        let elements = markup::parse(&notice.content);
                        ScreenState::Ready(NoticeView { notice, elements })
                    }
                    None => {
                        tracing::warn!("No notice stored under key {:?}", key);
                        ScreenState::NotFound
                    }
                }));
            }
        }

        Self {
            state,
            tooltip: watch::Sender::new(None),
            _scope: scope,
        }
    }

    pub fn state(&self) -> watch::Receiver<ScreenState<NoticeView>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> ScreenState<NoticeView> {
        self.state.borrow().clone()
    }

    /// Title and body as one string for read-aloud. The raw content with
    /// its tags stripped stands in only when parsing produced no elements.
    pub fn speech_text(&self) -> Option<String> {
        let state = self.state.borrow();
        let view = state.ready()?;
        let body = if view.elements.is_empty() {
            markup::strip_tags(&view.notice.content)
        } else {
            markup::speech_text(&view.elements)
        };
        let title = view
            .notice
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        match (title, body) {
            (Some(title), Some(body)) => Some(format!("{}\n\n{}", title, body)),
            (Some(title), None) => Some(title.to_string()),
            (None, body) => body,
        }
    }

    pub fn tooltip(&self) -> watch::Receiver<Option<String>> {
        self.tooltip.subscribe()
    }

    pub fn show_tooltip(&self, text: impl Into<String>) {
        self.tooltip.send_replace(Some(text.into()));
    }

    pub fn clear_tooltip(&self) {
        self.tooltip.send_replace(None);
    }
}
