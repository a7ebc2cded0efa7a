//! Integration tests for the raw webhook: update in, model call, reply out.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use futures::future::BoxFuture;
use relaybot_core::{Relay, RelayConfig, RetryPolicy};
use relaybot_telegram::webhook::{ACK, SECRET_TOKEN_HEADER};
use relaybot_telegram::{create_router, BotApiSender, ReplySender, WebhookState};
use serde_json::json;

/// Captures replies instead of calling Telegram.
#[derive(Default)]
struct RecordingSender {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingSender {
    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ReplySender for RecordingSender {
    fn send<'a>(
        &'a self,
        chat_id: i64,
        text: &'a str,
    ) -> BoxFuture<'a, relaybot_telegram::Result<()>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        })
    }
}

fn relay_config(urls: Vec<String>, turns: usize) -> RelayConfig {
    let mut config = RelayConfig::new("123:abc")
        .with_urls(urls)
        .with_history_turns(turns);
    config.inference.retry = RetryPolicy::no_retry();
    config
}

fn text_update(chat_id: i64, text: &str) -> serde_json::Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private"},
            "text": text
        }
    })
}

fn server_with(
    config: &RelayConfig,
    sender: Arc<RecordingSender>,
    secret: Option<&str>,
) -> TestServer {
    let state = WebhookState::new(
        Arc::new(Relay::new(config).unwrap()),
        sender,
        secret.map(str::to_string),
    );
    TestServer::new(create_router(state)).unwrap()
}

/// Replies are sent from a background task; poll until `count` arrive.
async fn wait_for_replies(sender: &RecordingSender, count: usize) -> Vec<(i64, String)> {
    for _ in 0..200 {
        let sent = sender.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sender.sent()
}

#[tokio::test]
async fn test_message_is_relayed_and_answered() {
    let mut model = mockito::Server::new_async().await;
    let mock = model
        .mock("POST", "/model")
        .with_status(200)
        .with_body(r#"[{"generated_text": "Four."}]"#)
        .expect(1)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec![format!("{}/model", model.url())], 0);
    let server = server_with(&config, Arc::clone(&sender), None);

    let response = server.post("/").json(&text_update(77, "2+2?")).await;
    response.assert_status_ok();
    assert_eq!(response.text(), ACK);

    assert_eq!(
        wait_for_replies(&sender, 1).await,
        vec![(77, "Four.".to_string())]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fallback_url_used_when_primary_fails() {
    let mut model = mockito::Server::new_async().await;
    model
        .mock("POST", "/primary")
        .with_status(503)
        .with_body(r#"{"error": "Model is currently loading", "estimated_time": 40.0}"#)
        .create_async()
        .await;
    model
        .mock("POST", "/secondary")
        .with_status(200)
        .with_body(r#"[{"generated_text": "Backup answer"}]"#)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(
        vec![
            format!("{}/primary", model.url()),
            format!("{}/secondary", model.url()),
        ],
        0,
    );
    let server = server_with(&config, Arc::clone(&sender), None);

    server.post("/").json(&text_update(5, "hi")).await.assert_status_ok();
    assert_eq!(
        wait_for_replies(&sender, 1).await,
        vec![(5, "Backup answer".to_string())]
    );
}

#[tokio::test]
async fn test_all_endpoints_down_sends_fallback_reply() {
    let mut model = mockito::Server::new_async().await;
    model
        .mock("POST", "/model")
        .with_status(500)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec![format!("{}/model", model.url())], 0);
    let server = server_with(&config, Arc::clone(&sender), None);

    let response = server.post("/").json(&text_update(5, "hi")).await;
    response.assert_status_ok();
    assert_eq!(response.text(), ACK);
    assert_eq!(
        wait_for_replies(&sender, 1).await,
        vec![(5, config.fallback_reply.clone())]
    );
}

#[tokio::test]
async fn test_commands_do_not_reach_the_model() {
    let mut model = mockito::Server::new_async().await;
    let mock = model
        .mock("POST", "/model")
        .expect(0)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec![format!("{}/model", model.url())], 4);
    let server = server_with(&config, Arc::clone(&sender), None);

    server.post("/").json(&text_update(3, "/start")).await.assert_status_ok();
    wait_for_replies(&sender, 1).await;
    server.post("/").json(&text_update(3, "/unknown")).await.assert_status_ok();
    server.post("/").json(&text_update(3, "/reset")).await.assert_status_ok();

    let sent = wait_for_replies(&sender, 2).await;
    assert_eq!(sent.len(), 2);
    assert!(sent[0].1.starts_with("Hello! Bot is working."));
    assert_eq!(sent[1].1, "Nothing to forget yet.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_history_carries_into_next_prompt() {
    let mut model = mockito::Server::new_async().await;
    model
        .mock("POST", "/model")
        .with_status(200)
        .with_body(r#"[{"generated_text": "Nice to meet you, Sam."}]"#)
        .expect(1)
        .create_async()
        .await;
    let follow_up = model
        .mock("POST", "/model")
        .match_body(mockito::Matcher::PartialJson(json!({
            "inputs": "User: I am Sam\nAssistant: Nice to meet you, Sam.\nUser: Who am I?\nAssistant:"
        })))
        .with_status(200)
        .with_body(r#"[{"generated_text": " You are Sam.\nUser: thanks"}]"#)
        .expect(1)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec![format!("{}/model", model.url())], 6);
    let server = server_with(&config, Arc::clone(&sender), None);

    server.post("/").json(&text_update(8, "I am Sam")).await.assert_status_ok();
    wait_for_replies(&sender, 1).await;
    server.post("/").json(&text_update(8, "Who am I?")).await.assert_status_ok();

    let sent = wait_for_replies(&sender, 2).await;
    assert_eq!(sent[1], (8, "You are Sam.".to_string()));
    follow_up.assert_async().await;
}

#[tokio::test]
async fn test_secret_token_enforced() {
    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec!["http://127.0.0.1:9/model".to_string()], 0);
    let server = server_with(&config, Arc::clone(&sender), Some("s3cret"));

    let response = server.post("/").json(&text_update(1, "/help")).await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert!(sender.sent().is_empty());

    let response = server
        .post("/")
        .add_header(
            HeaderName::from_static(SECRET_TOKEN_HEADER),
            HeaderValue::from_static("s3cret"),
        )
        .json(&text_update(1, "/help"))
        .await;
    response.assert_status_ok();
    assert_eq!(wait_for_replies(&sender, 1).await.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_acknowledged() {
    let sender = Arc::new(RecordingSender::default());
    let config = relay_config(vec!["http://127.0.0.1:9/model".to_string()], 0);
    let server = server_with(&config, Arc::clone(&sender), None);

    let response = server.post("/").text("this is not json").await;
    response.assert_status_ok();
    assert_eq!(response.text(), ACK);
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn test_reply_goes_through_bot_api() {
    let mut model = mockito::Server::new_async().await;
    model
        .mock("POST", "/model")
        .with_status(200)
        .with_body(r#"[{"generated_text": "pong"}]"#)
        .create_async()
        .await;

    let mut telegram = mockito::Server::new_async().await;
    let send = telegram
        .mock("POST", "/bot123:abc/sendMessage")
        .match_body(mockito::Matcher::Json(json!({"chat_id": 42, "text": "pong"})))
        .with_status(200)
        .with_body(r#"{"ok": true, "result": {"message_id": 2}}"#)
        .expect(1)
        .create_async()
        .await;

    let config = relay_config(vec![format!("{}/model", model.url())], 0);
    let state = WebhookState::new(
        Arc::new(Relay::new(&config).unwrap()),
        Arc::new(BotApiSender::new(telegram.url(), "123:abc")),
        None,
    );
    let server = TestServer::new(create_router(state)).unwrap();

    server.post("/").json(&text_update(42, "ping")).await.assert_status_ok();
    for _ in 0..200 {
        if send.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    send.assert_async().await;
}

#[tokio::test]
async fn test_ack_does_not_wait_for_loading_model() {
    let mut model = mockito::Server::new_async().await;
    model
        .mock("POST", "/model")
        .with_status(503)
        .with_body(r#"{"error": "Model is currently loading", "estimated_time": 120.0}"#)
        .create_async()
        .await;

    let sender = Arc::new(RecordingSender::default());
    let mut config = relay_config(vec![format!("{}/model", model.url())], 0);
    config.inference.retry =
        RetryPolicy::new(3, Duration::from_secs(30), Duration::from_secs(60));
    let server = server_with(&config, Arc::clone(&sender), None);

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        server.post("/").json(&text_update(9, "are you there?")),
    )
    .await
    .expect("webhook should acknowledge before the model is ready");
    response.assert_status_ok();
    assert_eq!(response.text(), ACK);
    assert!(sender.sent().is_empty());
}
