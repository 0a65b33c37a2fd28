//! Chat widget orchestration: one controller instance owns the conversation,
//! the open/closed state and the in-flight guard for round trips.

mod view;

pub use view::{ HtmlView, TerminalView };

use chrono::Utc;
use log::{ debug, warn };
use std::sync::Arc;
use std::sync::atomic::{ AtomicBool, Ordering };
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use crate::config::WidgetConfig;
use crate::history::{ ConversationStore, SnapshotStorage };
use crate::llm::chat::{ ChatClient, ChatError };
use crate::models::chat::{ ChatTurn, Role, UpstreamMessage };

/// Asks the user to approve a destructive action.
pub trait ConfirmPrompt: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

/// A confirmation whose answer was collected before the action ran.
pub struct PresetAnswer(pub bool);

impl ConfirmPrompt for PresetAnswer {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

/// Where the widget draws turns, the typing indicator and the unread badge.
pub trait WidgetView: Send + Sync {
    fn render_turn(&self, turn: &ChatTurn);
    fn show_typing(&self);
    fn hide_typing(&self);
    fn reset(&self);
    fn set_badge(&self, label: Option<&str>);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Blank submission, no round trip started.
    Ignored,
    /// Another round trip is still in flight.
    Busy,
    Replied(ChatTurn),
    /// The round trip failed and the fallback turn was appended instead.
    Fallback(ChatTurn),
}

struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub fn badge_label(turn_count: usize, is_open: bool) -> Option<String> {
    if is_open || turn_count <= 1 {
        return None;
    }
    let unread = turn_count - 1;
    Some(if unread > 9 { "9+".to_string() } else { unread.to_string() })
}

pub struct WidgetController {
    config: WidgetConfig,
    client: Arc<dyn ChatClient>,
    view: Arc<dyn WidgetView>,
    store: Mutex<ConversationStore>,
    in_flight: AtomicBool,
    is_open: AtomicBool,
}

impl WidgetController {
    pub fn new(
        config: WidgetConfig,
        client: Arc<dyn ChatClient>,
        storage: Arc<dyn SnapshotStorage>,
        view: Arc<dyn WidgetView>
    ) -> Self {
        let store = ConversationStore::new(storage, &config);
        Self {
            config,
            client,
            view,
            store: Mutex::new(store),
            in_flight: AtomicBool::new(false),
            is_open: AtomicBool::new(false),
        }
    }

    /// Restores the persisted conversation and draws it.
    pub async fn init(&self) {
        let store = {
            let mut store = self.store.lock().await;
            store.load().await;
            store
        };
        self.view.reset();
        for turn in store.turns() {
            self.view.render_turn(turn);
        }
        let count = store.len();
        drop(store);
        self.view.set_badge(badge_label(count, self.is_open()).as_deref());
    }

    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn open(&self) {
        self.is_open.store(true, Ordering::Release);
        self.view.set_badge(None);
        let mut store = self.store.lock().await;
        if store.is_empty() {
            let welcome = store.append(Role::Assistant, self.config.welcome_message.clone()).await;
            self.view.render_turn(&welcome);
        }
    }

    pub fn close(&self) {
        self.is_open.store(false, Ordering::Release);
    }

    pub async fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.open().await;
        }
    }

    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.store.lock().await.turns().to_vec()
    }

    pub async fn clear(&self, prompt: &dyn ConfirmPrompt) -> bool {
        let mut store = self.store.lock().await;
        if !store.clear(prompt).await {
            return false;
        }
        self.view.reset();
        for turn in store.turns() {
            self.view.render_turn(turn);
        }
        true
    }

    pub async fn send(&self, input: &str) -> SendOutcome {
        self.send_with_cancel(input, &CancellationToken::new()).await
    }

    /// Runs one round trip. Cancellation and the configured timeout both end
    /// the round trip with the fallback turn.
    pub async fn send_with_cancel(&self, input: &str, cancel: &CancellationToken) -> SendOutcome {
        let content = input.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!("Round trip already in flight; ignoring submission");
            return SendOutcome::Busy;
        };

        let messages = {
            let mut store = self.store.lock().await;
            let turn = store.append(Role::User, content).await;
            self.view.render_turn(&turn);
            self.upstream_messages(store.turns())
        };

        self.view.show_typing();
        let result = self.round_trip(&messages, cancel).await;
        self.view.hide_typing();

        let outcome = {
            let mut store = self.store.lock().await;
            let outcome = match result {
                Ok(reply) => SendOutcome::Replied(store.append(Role::Assistant, reply).await),
                Err(e) => {
                    warn!("Chat round trip failed: {}", e);
                    let fallback = self.config.fallback_message.clone();
                    SendOutcome::Fallback(store.append(Role::Assistant, fallback).await)
                }
            };
            self.view.set_badge(badge_label(store.len(), self.is_open()).as_deref());
            outcome
        };
        if let SendOutcome::Replied(turn) | SendOutcome::Fallback(turn) = &outcome {
            self.view.render_turn(turn);
        }
        outcome
    }

    async fn round_trip(
        &self,
        messages: &[UpstreamMessage],
        cancel: &CancellationToken
    ) -> Result<String, ChatError> {
        let timeout = self.config.request_timeout();
        let started = Utc::now();
        let result =
            tokio::select! {
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            r = tokio::time::timeout(timeout, self.client.complete(messages)) => {
                r.unwrap_or(Err(ChatError::Timeout(timeout)))
            }
        };
        debug!("Round trip finished in {}ms", (Utc::now() - started).num_milliseconds());
        result
    }

    fn upstream_messages(&self, turns: &[ChatTurn]) -> Vec<UpstreamMessage> {
        let system = UpstreamMessage {
            role: Role::System,
            content: self.config.system_prompt.clone(),
        };
        std::iter::once(system).chain(turns.iter().map(ChatTurn::to_upstream)).collect()
    }
}
