//! Chat gateway for OpenAI-compatible `/chat/completions` endpoints
//! (OpenRouter, Ollama, vLLM, llama.cpp server and similar).
//!
//! Each session keeps its own message history and sends the whole of it on
//! every turn. Replies arrive in one piece and are re-emitted as fixed-size
//! deltas so the presentation layer can stream them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shellpilot_application::ports::llm_gateway::{
    GatewayError, LlmGateway, LlmSession, StreamHandle,
};
use shellpilot_domain::util::truncate_str;
use shellpilot_domain::session::chunk_text;
use shellpilot_domain::{Message, Session, StreamEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Longest error body quoted back in a `GatewayError`.
const MAX_ERROR_BODY: usize = 500;

/// Connection settings shared by every session of a gateway.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    /// Environment variable holding the bearer key
    pub api_key_env: String,
    pub request_timeout: Duration,
    pub stream_chunk_size: usize,
}

impl GatewaySettings {
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// The key, if the variable is set and non-empty. Local servers
    /// usually need none.
    fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::Connection(err.to_string())
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

pub struct OpenAiCompatibleGateway {
    client: Client,
    settings: Arc<GatewaySettings>,
    next_session: AtomicU64,
}

impl OpenAiCompatibleGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| GatewayError::Connection(e.to_string()))?;
        info!("Chat gateway using {}", settings.endpoint());
        Ok(Self {
            client,
            settings: Arc::new(settings),
            next_session: AtomicU64::new(1),
        })
    }

    fn session_id(&self) -> String {
        format!(
            "session-{}",
            self.next_session.fetch_add(1, Ordering::Relaxed)
        )
    }

    fn open(&self, history: Session) -> Box<dyn LlmSession> {
        debug!("Opened {} on {}", history.id(), history.model());
        Box::new(OpenAiSession {
            client: self.client.clone(),
            settings: Arc::clone(&self.settings),
            model: history.model().to_string(),
            history: Mutex::new(history),
        })
    }
}

#[async_trait]
impl LlmGateway for OpenAiCompatibleGateway {
    async fn create_session(&self, model: &str) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.open(Session::new(self.session_id(), model)))
    }

    async fn create_session_with_system_prompt(
        &self,
        model: &str,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        Ok(self.open(Session::with_system_prompt(
            self.session_id(),
            model,
            system_prompt,
        )))
    }
}

pub struct OpenAiSession {
    client: Client,
    settings: Arc<GatewaySettings>,
    model: String,
    history: Mutex<Session>,
}

impl OpenAiSession {
    async fn complete(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let mut request = self.client.post(self.settings.endpoint()).json(&ChatRequest {
            model: &self.model,
            messages,
        });
        if let Some(key) = self.settings.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: truncate_str(body.trim(), MAX_ERROR_BODY).to_string(),
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("response has no content".to_string()))
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, content: &str) -> Result<String, GatewayError> {
        let mut history = self.history.lock().await;
        history.add_user_message(content);
        debug!(
            "Sending {} messages to {}",
            history.messages().len(),
            self.model
        );

        match self.complete(history.messages()).await {
            Ok(reply) => {
                history.add_assistant_message(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                history.rollback_user_message();
                Err(e)
            }
        }
    }

    async fn send_streaming(&self, content: &str) -> Result<StreamHandle, GatewayError> {
        let reply = self.send(content).await?;
        let chunks = chunk_text(&reply, self.settings.stream_chunk_size);
        let (tx, rx) = mpsc::channel(chunks.len() + 1);
        for chunk in chunks {
            let _ = tx.send(StreamEvent::Delta(chunk)).await;
        }
        let _ = tx.send(StreamEvent::Completed(reply)).await;
        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the given `(status, body)` replies in order, returning each
    /// request body and Authorization header through the channel.
    async fn serve(
        replies: Vec<(u16, String)>,
    ) -> (String, mpsc::UnboundedReceiver<(Value, Option<String>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            for (status, body) in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                let (head_end, content_length) = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                        let len = head
                            .lines()
                            .find_map(|l| l.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        break (pos + 4, len);
                    }
                };
                while buf.len() < head_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    buf.extend_from_slice(&chunk[..n]);
                }
                let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
                let auth = head
                    .lines()
                    .find(|l| l.to_lowercase().starts_with("authorization:"))
                    .map(|l| l["authorization:".len()..].trim().to_string());
                let request: Value =
                    serde_json::from_slice(&buf[head_end..head_end + content_length]).unwrap();
                tx.send((request, auth)).unwrap();

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), rx)
    }

    fn reply(text: &str) -> (u16, String) {
        (
            200,
            json!({"choices": [{"message": {"role": "assistant", "content": text}}]}).to_string(),
        )
    }

    fn gateway(base_url: String, key_env: &str, chunk: usize) -> OpenAiCompatibleGateway {
        OpenAiCompatibleGateway::new(GatewaySettings {
            base_url,
            api_key_env: key_env.to_string(),
            request_timeout: Duration::from_secs(5),
            stream_chunk_size: chunk,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn history_is_sent_with_system_prompt_first() {
        let (url, mut requests) = serve(vec![reply("first"), reply("second")]).await;
        let gateway = gateway(url, "SHELLPILOT_TEST_UNSET_KEY_VAR", 50);
        let session = gateway
            .create_session_with_system_prompt("test-model", "be terse")
            .await
            .unwrap();

        assert_eq!(session.send("hello").await.unwrap(), "first");
        assert_eq!(session.send("again").await.unwrap(), "second");

        let (first, auth) = requests.recv().await.unwrap();
        assert_eq!(first["model"], "test-model");
        assert_eq!(
            first["messages"],
            json!([
                {"role": "system", "content": "be terse"},
                {"role": "user", "content": "hello"}
            ])
        );
        assert!(auth.is_none());

        let (second, _) = requests.recv().await.unwrap();
        let roles: Vec<&str> = second["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn http_error_rolls_back_the_user_turn() {
        let (url, mut requests) = serve(vec![
            (429, r#"{"error":"rate limited"}"#.to_string()),
            reply("ok"),
        ])
        .await;
        let gateway = gateway(url, "SHELLPILOT_TEST_UNSET_KEY_VAR", 50);
        let session = gateway.create_session("m").await.unwrap();

        let err = session.send("first try").await.unwrap_err();
        assert!(matches!(err, GatewayError::Http { status: 429, .. }));

        session.send("second try").await.unwrap();
        let _ = requests.recv().await.unwrap();
        let (second, _) = requests.recv().await.unwrap();
        assert_eq!(
            second["messages"],
            json!([{"role": "user", "content": "second try"}])
        );
    }

    #[tokio::test]
    async fn streaming_emits_fixed_size_deltas() {
        let (url, _requests) = serve(vec![reply("abcdefg")]).await;
        let gateway = gateway(url, "SHELLPILOT_TEST_UNSET_KEY_VAR", 3);
        let session = gateway.create_session("m").await.unwrap();

        let mut handle = session.send_streaming("go").await.unwrap();
        let mut events = Vec::new();
        while let Some(event) = handle.receiver.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("abc".into()),
                StreamEvent::Delta("def".into()),
                StreamEvent::Delta("g".into()),
                StreamEvent::Completed("abcdefg".into()),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let (url, _requests) = serve(vec![(200, "not json".to_string())]).await;
        let gateway = gateway(url, "SHELLPILOT_TEST_UNSET_KEY_VAR", 50);
        let session = gateway.create_session("m").await.unwrap();

        let err = session.send("x").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let gateway = gateway(url, "SHELLPILOT_TEST_UNSET_KEY_VAR", 50);
        let session = gateway.create_session("m").await.unwrap();

        let err = session.send("x").await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let settings = GatewaySettings {
            base_url: "http://localhost:8080/v1/".to_string(),
            api_key_env: "X".to_string(),
            request_timeout: Duration::from_secs(1),
            stream_chunk_size: 1,
        };
        assert_eq!(settings.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
