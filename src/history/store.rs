use chrono::{ DateTime, Duration, Utc };
use log::{ debug, warn };
use std::sync::Arc;
use crate::config::WidgetConfig;
use crate::history::SnapshotStorage;
use crate::models::chat::{ ChatTurn, ConversationSnapshot, Role };
use crate::widget::ConfirmPrompt;

pub const SNAPSHOT_KEY: &str = "chatMessages";

const CLEAR_CONFIRMATION: &str = "Clear the conversation history?";

/// Ordered, bounded conversation backed by a persisted snapshot.
///
/// Storage failures never reach callers: a missing, corrupt or expired
/// snapshot loads as an empty conversation, and failed writes are logged.
pub struct ConversationStore {
    storage: Arc<dyn SnapshotStorage>,
    key: String,
    max_messages: usize,
    expiry: Duration,
    welcome_message: String,
    turns: Vec<ChatTurn>,
}

impl ConversationStore {
    pub fn new(storage: Arc<dyn SnapshotStorage>, config: &WidgetConfig) -> Self {
        Self {
            storage,
            key: SNAPSHOT_KEY.to_string(),
            max_messages: config.max_messages.max(1),
            expiry: config.cache_expiry(),
            welcome_message: config.welcome_message.clone(),
            turns: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub async fn load(&mut self) -> &[ChatTurn] {
        self.load_at(Utc::now()).await
    }

    pub async fn load_at(&mut self, now: DateTime<Utc>) -> &[ChatTurn] {
        self.turns = match self.read_snapshot().await {
            Some(snapshot) if snapshot.is_fresh(now, self.expiry) => {
                debug!("Restored {} turns from '{}'", snapshot.turns.len(), self.key);
                snapshot.turns
            }
            Some(_) => {
                warn!("Conversation snapshot '{}' expired; discarding", self.key);
                self.remove_snapshot().await;
                Vec::new()
            }
            None => Vec::new(),
        };
        &self.turns
    }

    async fn read_snapshot(&self) -> Option<ConversationSnapshot> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                return None;
            }
            Err(e) => {
                warn!("Failed to read conversation snapshot '{}': {}", self.key, e);
                return None;
            }
        };
        match serde_json::from_str::<ConversationSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Corrupt conversation snapshot '{}': {}; discarding", self.key, e);
                self.remove_snapshot().await;
                None
            }
        }
    }

    /// Appends a turn stamped with the current time, drops the oldest turns
    /// beyond the cap and rewrites the snapshot.
    pub async fn append(&mut self, role: Role, content: impl Into<String>) -> ChatTurn {
        let turn = ChatTurn::new(role, content);
        self.turns.push(turn.clone());
        if self.turns.len() > self.max_messages {
            let excess = self.turns.len() - self.max_messages;
            self.turns.drain(..excess);
        }
        self.persist().await;
        turn
    }

    /// Empties the conversation after the user confirms, then reseeds it with
    /// the welcome turn. Returns false when the user declines.
    pub async fn clear(&mut self, prompt: &dyn ConfirmPrompt) -> bool {
        if !prompt.confirm(CLEAR_CONFIRMATION) {
            return false;
        }
        self.turns.clear();
        self.remove_snapshot().await;
        let welcome = self.welcome_message.clone();
        self.append(Role::Assistant, welcome).await;
        true
    }

    async fn persist(&self) {
        let snapshot = ConversationSnapshot::new(self.turns.clone(), Utc::now());
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize conversation snapshot: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &json).await {
            warn!("Failed to persist conversation snapshot '{}': {}", self.key, e);
        }
    }

    async fn remove_snapshot(&self) {
        if let Err(e) = self.storage.remove(&self.key).await {
            warn!("Failed to remove conversation snapshot '{}': {}", self.key, e);
        }
    }
}
