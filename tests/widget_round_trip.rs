//! Widget round trips through the HTTP chat client against a mocked endpoint.

use portfolio_chat::config::WidgetConfig;
use portfolio_chat::history::{ ConversationStore, FileStorage, MemoryStorage, SnapshotStorage };
use portfolio_chat::llm::chat::new_client;
use portfolio_chat::models::chat::Role;
use portfolio_chat::widget::{ HtmlView, SendOutcome, WidgetController };
use serde_json::json;
use std::sync::Arc;
use wiremock::{ Mock, MockServer, ResponseTemplate };
use wiremock::matchers::{ method, path };

fn config(api_url: String) -> WidgetConfig {
    WidgetConfig {
        api_url,
        welcome_message: "welcome".into(),
        fallback_message: "Sorry, something went wrong.".into(),
        request_timeout_secs: 5,
        ..WidgetConfig::default()
    }
}

fn widget(
    config: WidgetConfig,
    storage: Arc<dyn SnapshotStorage>
) -> (WidgetController, Arc<HtmlView>) {
    let view = Arc::new(HtmlView::new());
    let client = new_client(&config).unwrap();
    (WidgetController::new(config, client, storage, view.clone()), view)
}

#[tokio::test]
async fn successful_reply_appends_one_assistant_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"choices": [{"message": {"content": "Hi"}}]}))
        )
        .expect(1)
        .mount(&server).await;

    let (widget, view) = widget(
        config(format!("{}/api/chat", server.uri())),
        Arc::new(MemoryStorage::new())
    );
    let outcome = widget.send("hello").await;

    let turns = widget.turns().await;
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Hi");
    assert_eq!(outcome, SendOutcome::Replied(turns[1].clone()));
    assert_eq!(view.fragment_count(), 2);
    assert!(!view.is_typing());
    assert_eq!(view.badge().as_deref(), Some("1"));
}

#[tokio::test]
async fn network_failure_appends_fallback_and_accepts_next_send() {
    let (widget, view) = widget(
        config("http://127.0.0.1:1/api/chat".to_string()),
        Arc::new(MemoryStorage::new())
    );

    let outcome = widget.send("hello").await;
    assert!(matches!(outcome, SendOutcome::Fallback(ref t) if t.content == "Sorry, something went wrong."));
    assert!(!widget.is_busy());
    assert!(!view.markup().contains("typingIndicator"));

    let again = widget.send("still there?").await;
    assert!(matches!(again, SendOutcome::Fallback(_)));
    let assistant_turns = widget
        .turns().await
        .into_iter()
        .filter(|t| t.role == Role::Assistant)
        .count();
    assert_eq!(assistant_turns, 2);
}

#[tokio::test]
async fn non_success_status_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to fetch AI response"})))
        .mount(&server).await;

    let (widget, _view) = widget(
        config(format!("{}/api/chat", server.uri())),
        Arc::new(MemoryStorage::new())
    );
    let outcome = widget.send("hello").await;
    assert!(matches!(outcome, SendOutcome::Fallback(_)));
    let turns = widget.turns().await;
    assert_eq!(turns.len(), 2);
    assert!(!turns[1].content.contains("Failed to fetch"));
}

#[tokio::test]
async fn conversation_survives_a_new_session_on_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"choices": [{"message": {"content": "**Sure**"}}]}))
        )
        .mount(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(format!("{}/api/chat", server.uri()));

    let (first, _) = widget(config.clone(), Arc::new(FileStorage::new(dir.path())));
    first.open().await;
    first.send("tell me more").await;
    let before = first.turns().await;

    let (second, view) = widget(config.clone(), Arc::new(FileStorage::new(dir.path())));
    second.init().await;
    assert_eq!(second.turns().await, before);
    assert_eq!(view.fragment_count(), 3);
    assert!(view.markup().contains("<strong>Sure</strong>"));
    assert_eq!(view.badge().as_deref(), Some("2"));

    let mut store = ConversationStore::new(Arc::new(FileStorage::new(dir.path())), &config);
    assert_eq!(store.load().await.len(), 3);
}
