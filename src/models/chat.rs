use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation. Never mutated once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn to_upstream(&self) -> UpstreamMessage {
        UpstreamMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Persisted form of a conversation: `{messages: [...], timestamp: epoch-millis}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationSnapshot {
    #[serde(rename = "messages")]
    pub turns: Vec<ChatTurn>,
    #[serde(rename = "timestamp")]
    pub saved_at: i64,
}

impl ConversationSnapshot {
    pub fn new(turns: Vec<ChatTurn>, saved_at: DateTime<Utc>) -> Self {
        Self {
            turns,
            saved_at: saved_at.timestamp_millis(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, expiry: chrono::Duration) -> bool {
        now.timestamp_millis()
            .checked_sub(self.saved_at)
            .map_or(false, |age| age < expiry.num_milliseconds())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpstreamMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<UpstreamMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: String,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn snapshot_uses_browser_field_names() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let snapshot = ConversationSnapshot::new(
            vec![ChatTurn { role: Role::User, content: "hi".into(), timestamp: at }],
            at
        );
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["timestamp"], at.timestamp_millis());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }

    #[test]
    fn snapshot_freshness_is_strict() {
        let now = Utc::now();
        let expiry = Duration::hours(1);
        let exact = ConversationSnapshot::new(Vec::new(), now - expiry);
        let recent = ConversationSnapshot::new(Vec::new(), now - Duration::minutes(59));
        assert!(!exact.is_fresh(now, expiry));
        assert!(recent.is_fresh(now, expiry));
    }

    #[test]
    fn extreme_saved_at_is_never_fresh() {
        let snapshot = ConversationSnapshot { turns: Vec::new(), saved_at: i64::MIN };
        assert!(!snapshot.is_fresh(Utc::now(), Duration::hours(1)));
    }

    #[test]
    fn response_content_reads_first_choice() {
        let parsed: ChatCompletionResponse = serde_json
            ::from_str(r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi"}}]}"#)
            .unwrap();
        assert_eq!(parsed.first_content(), Some("Hi"));
    }
}
