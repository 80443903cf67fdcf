//! In-process stand-ins for the upstream AI services, for tests.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::chat::ChatClient;

type Log = Arc<Mutex<Vec<Value>>>;

/// Reply for a given model: `Some(content)` answers 200, `None` answers 500.
pub type ChatReply = fn(&str) -> Option<Value>;

pub struct ChatMock {
    pub base_url: String,
    requests: Log,
}

impl ChatMock {
    pub fn client(&self) -> ChatClient {
        ChatClient::new(reqwest::Client::new(), &self.base_url, "test-key".into())
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_chat_mock(reply: ChatReply) -> ChatMock {
    async fn complete(
        State((log, reply)): State<(Log, ChatReply)>,
        Json(body): Json<Value>,
    ) -> Response {
        let model = body["model"].as_str().unwrap_or_default().to_string();
        log.lock().unwrap().push(body);
        match reply(&model) {
            Some(content) => Json(json!({
                "choices": [{ "message": { "role": "assistant", "content": content } }]
            }))
            .into_response(),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        }
    }

    let requests: Log = Arc::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(complete))
        .with_state((requests.clone(), reply));
    let addr = serve(app).await;

    ChatMock {
        base_url: format!("http://{addr}/v1"),
        requests,
    }
}

pub struct WebhookMock {
    pub url: String,
    requests: Log,
}

impl WebhookMock {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

/// Webhook that answers every POST with `status` and the raw `body`.
pub async fn spawn_webhook_mock(status: StatusCode, body: &'static str) -> WebhookMock {
    async fn hook(
        State((log, status, reply)): State<(Log, StatusCode, &'static str)>,
        Json(body): Json<Value>,
    ) -> Response {
        log.lock().unwrap().push(body);
        (status, [("content-type", "application/json")], reply).into_response()
    }

    let requests: Log = Arc::default();
    let app = Router::new()
        .route("/agent", post(hook))
        .with_state((requests.clone(), status, body));
    let addr = serve(app).await;

    WebhookMock {
        url: format!("http://{addr}/agent"),
        requests,
    }
}

async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local_addr should succeed");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
