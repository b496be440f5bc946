use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use medchat_gateway::AppState;
use medchat_gateway::gateway::{
    ChatGateway, ChatReply, FALLBACK_REPLY, GatewayOptions, SYSTEM_PROMPT, intake_message,
};
use medchat_gateway::llm::{CompletionProvider, CompletionRequest, MessageRole, ProviderError};
use medchat_gateway::server::build_router;
use serde_json::{Value, json};

const APOLOGY: &str = "I'm sorry, I encountered an error processing your request. If you're experiencing a medical emergency, please call 911 or visit your nearest emergency room immediately.";

const INTAKE: &str = "To properly assess your condition, please answer these questions:\n\n\
1. How long have you been experiencing these symptoms?\n\
2. Where exactly is the pain/discomfort located?\n\
3. Does the pain/discomfort radiate to other areas?\n\
4. How would you rate the severity on a scale of 1-10?\n\
5. Are there any activities or positions that make it better or worse?\n\
6. Have you taken any medications for this?\n\
7. Do you have any relevant medical history or conditions?\n\n\
Please provide answers to these questions so I can better assist you.";

/// Stub completion provider with a fixed behaviour.
#[derive(Clone, Copy)]
enum Behaviour {
    Echo,
    Fail,
    Hang,
}

struct StubProvider {
    behaviour: Behaviour,
    seen: Mutex<Vec<CompletionRequest>>,
}

#[async_trait::async_trait]
impl CompletionProvider for StubProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<String, ProviderError> {
        let last = req
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.seen.lock().unwrap().push(req);
        match self.behaviour {
            Behaviour::Echo => Ok(format!("model says: {last}")),
            Behaviour::Fail => Err(ProviderError::Status {
                status: 401,
                body: "invalid api key".to_string(),
            }),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}

fn setup(behaviour: Behaviour) -> (TestServer, Arc<StubProvider>) {
    let provider = Arc::new(StubProvider {
        behaviour,
        seen: Mutex::default(),
    });
    let options = GatewayOptions {
        provider_timeout: Duration::from_millis(200),
        ..GatewayOptions::default()
    };
    let gateway = ChatGateway::new(Arc::clone(&provider) as Arc<dyn CompletionProvider>, options);
    let server = TestServer::new(build_router(AppState { gateway })).unwrap();
    (server, provider)
}

async fn send_chat(server: &TestServer, message: &str, session_id: &str) -> ChatReply {
    let response = server
        .post("/api/chat")
        .json(&json!({"message": message, "session_id": session_id}))
        .await;
    response.assert_status_ok();
    response.json::<ChatReply>()
}

#[tokio::test]
async fn test_root_and_health() {
    let (server, _) = setup(Behaviour::Echo);

    let root = server.get("/").await;
    root.assert_status_ok();
    let body = root.json::<Value>();
    assert_eq!(body["status"], "API is running");
    assert_eq!(body["endpoints"], json!(["/api/chat", "/health"]));

    let health = server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_first_message_is_intake_then_passthrough() {
    let (server, _) = setup(Behaviour::Echo);

    let first = send_chat(&server, "I have a headache", "s1").await;
    assert_eq!(first.response, INTAKE);
    assert_eq!(intake_message(), INTAKE);
    assert_eq!(first.session_id, "s1");
    assert!(first.has_audio);

    let second = send_chat(&server, "three days, forehead", "s1").await;
    assert_eq!(second.response, "model says: three days, forehead");
}

#[tokio::test]
async fn test_session_id_defaults_to_unknown() {
    let (server, _) = setup(Behaviour::Echo);

    let response = server.post("/api/chat").json(&json!({"message": "hi"})).await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["session_id"], "unknown");
    assert_eq!(body["has_audio"], true);
}

#[tokio::test]
async fn test_provider_failure_returns_fallback_with_200() {
    let (server, _) = setup(Behaviour::Fail);

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hello", "session_id": "x"}))
        .await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["response"], APOLOGY);
    assert_eq!(body["has_audio"], true);
    assert_eq!(FALLBACK_REPLY, APOLOGY);
}

#[tokio::test]
async fn test_provider_timeout_returns_fallback_with_200() {
    let (server, _) = setup(Behaviour::Hang);

    let reply = send_chat(&server, "hello", "x").await;
    assert_eq!(reply.response, FALLBACK_REPLY);
    assert!(reply.has_audio);
}

#[tokio::test]
async fn test_history_window_after_fifteen_turns() {
    let (server, provider) = setup(Behaviour::Echo);

    for i in 0..8 {
        send_chat(&server, &format!("turn {i}"), "long").await;
    }

    let seen = provider.seen.lock().unwrap();
    assert!(seen.iter().all(|r| r.messages.len() <= 11));
    let last = seen.last().unwrap();
    assert_eq!(last.messages.len(), 11);
    assert_eq!(last.messages[0].role, MessageRole::System);
    assert_eq!(last.messages[0].content, SYSTEM_PROMPT);
    assert_eq!(last.messages[10].content, "turn 7");
    assert_eq!(last.messages[1].content, "model says: turn 2");
}

#[tokio::test]
async fn test_sessions_do_not_leak() {
    let (server, provider) = setup(Behaviour::Echo);

    send_chat(&server, "secret from A", "A").await;
    send_chat(&server, "more from A", "A").await;
    let b = send_chat(&server, "hello from B", "B").await;

    assert_eq!(b.response, intake_message());
    let seen = provider.seen.lock().unwrap();
    let b_request = seen.last().unwrap();
    assert!(
        b_request
            .messages
            .iter()
            .all(|m| !m.content.contains("from A"))
    );
}

#[tokio::test]
async fn test_clear_twice_then_intake_again() {
    let (server, _) = setup(Behaviour::Echo);

    send_chat(&server, "hi", "c").await;
    send_chat(&server, "details", "c").await;

    for _ in 0..2 {
        let response = server
            .delete("/api/chat")
            .json(&json!({"session_id": "c"}))
            .await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Conversation cleared");
    }

    let reply = send_chat(&server, "starting over", "c").await;
    assert_eq!(reply.response, intake_message());
}

#[tokio::test]
async fn test_clear_unknown_session_succeeds() {
    let (server, _) = setup(Behaviour::Echo);

    let response = server
        .delete("/api/chat")
        .json(&json!({"session_id": "nobody"}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "success");
}

#[tokio::test]
async fn test_chat_without_message_is_400() {
    let (server, provider) = setup(Behaviour::Echo);

    let response = server.post("/api/chat").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Invalid request. 'message' field is required");

    let response = server
        .post("/api/chat")
        .json(&json!({"session_id": "s"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());

    assert!(provider.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_without_session_id_is_400() {
    let (server, _) = setup(Behaviour::Echo);

    let response = server.delete("/api/chat").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Invalid request. 'session_id' field is required");
}

#[tokio::test]
async fn test_null_required_fields_are_400() {
    let (server, provider) = setup(Behaviour::Echo);

    let response = server
        .delete("/api/chat")
        .json(&json!({"session_id": null}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid request. 'session_id' field is required"
    );

    let response = server
        .post("/api/chat")
        .json(&json!({"message": null, "session_id": "n"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Invalid request. 'message' field is required"
    );
    assert!(provider.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_500_with_error() {
    let (server, _) = setup(Behaviour::Echo);

    let response = server
        .post("/api/chat")
        .text("{\"message\": ")
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_concurrent_requests_on_one_session_stay_ordered() {
    let (server, provider) = setup(Behaviour::Echo);
    let server = Arc::new(server);

    let calls = (0..5).map(|i| {
        let server = Arc::clone(&server);
        async move { send_chat(&server, &format!("parallel {i}"), "shared").await }
    });
    let replies = futures::future::join_all(calls).await;

    let intake_count = replies
        .iter()
        .filter(|r| r.response == intake_message())
        .count();
    assert_eq!(intake_count, 1);

    // Every request saw a history of strictly alternating user/assistant turns.
    let seen = provider.seen.lock().unwrap();
    for req in seen.iter() {
        let turns = &req.messages[1..];
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 {
                MessageRole::User
            } else {
                MessageRole::Assistant
            };
            assert_eq!(turn.role, expected);
        }
    }
}
