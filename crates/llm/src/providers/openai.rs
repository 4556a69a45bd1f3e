//! OpenAI-compatible chat completions (OpenRouter and friends).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::provider::{LlmError, LlmProvider, Message};

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    /// `url` is the full chat-completions endpoint. Every request, body
    /// included, must finish within `timeout`.
    pub fn new(
        api_key: String,
        model: String,
        url: String,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            url,
        })
    }

    fn build_request_body(&self, messages: &[Message], temperature: f32, max_tokens: u32) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|m| {
                json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
        })
    }
}

/// Pull `choices[0].message.content` out of a completion response.
fn first_completion(resp: &Value) -> Result<String, LlmError> {
    let choices = resp
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::MalformedResponse("missing choices".into()))?;

    let first = choices
        .first()
        .ok_or_else(|| LlmError::MalformedResponse("empty choices".into()))?;

    first["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LlmError::MalformedResponse("missing choices[0].message.content".into()))
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = self.build_request_body(&messages, temperature, max_tokens);

        debug!("Chat completion request to {} (model={})", self.url, self.model);
        let started = Instant::now();

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .inspect_err(|e| {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream request failed: {}", e
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let elapsed_ms = started.elapsed().as_millis() as u64;
            warn!(
                status = status.as_u16(),
                elapsed_ms,
                "Upstream returned error status: {}", text
            );
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        let text = response.text().await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(status = status.as_u16(), elapsed_ms, bytes = text.len(), "Upstream responded");

        let resp: Value = serde_json::from_str(&text)
            .map_err(|e| LlmError::MalformedResponse(format!("invalid JSON body: {e}")))?;

        first_completion(&resp)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;

    #[derive(Clone)]
    struct Upstream {
        status: StatusCode,
        body: String,
        delay: Duration,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn handle(
        State(up): State<Upstream>,
        headers: HeaderMap,
        Json(payload): Json<Value>,
    ) -> (StatusCode, String) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        up.seen.lock().unwrap().push((auth, payload));
        tokio::time::sleep(up.delay).await;
        (up.status, up.body.clone())
    }

    /// Serve `body` with `status` on an ephemeral port; returns the endpoint URL.
    async fn spawn_upstream(status: StatusCode, body: &str, delay: Duration) -> (String, Upstream) {
        let up = Upstream {
            status,
            body: body.to_string(),
            delay,
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new()
            .route("/api/v1/chat/completions", post(handle))
            .with_state(up.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/api/v1/chat/completions"), up)
    }

    fn provider(url: String, timeout: Duration) -> OpenAiProvider {
        OpenAiProvider::new("sk-test".into(), "test/model".into(), url, timeout).unwrap()
    }

    fn messages() -> Vec<Message> {
        vec![Message::system("Ringkas."), Message::user("Teks panjang")]
    }

    #[tokio::test]
    async fn returns_first_completion() {
        let body = r#"{"choices":[{"message":{"content":"  Hello  "}},{"message":{"content":"other"}}]}"#;
        let (url, up) = spawn_upstream(StatusCode::OK, body, Duration::ZERO).await;

        let out = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap();
        assert_eq!(out, "  Hello  ");

        let seen = up.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, payload) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(payload["model"], "test/model");
        assert_eq!(payload["max_tokens"], 500);
        let temp = payload["temperature"].as_f64().unwrap();
        assert!((temp - 0.7).abs() < 1e-6, "temperature should be ~0.7, got {temp}");
        assert_eq!(payload["messages"][0]["role"], "system");
        assert_eq!(payload["messages"][1]["role"], "user");
        assert_eq!(payload["messages"][1]["content"], "Teks panjang");
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let (url, _) =
            spawn_upstream(StatusCode::TOO_MANY_REQUESTS, "rate limited", Duration::ZERO).await;
        let err = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        match err {
            LlmError::ApiError { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let (url, _) = spawn_upstream(StatusCode::OK, r#"{"choices":[]}"#, Duration::ZERO).await;
        let err = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_choices_is_malformed() {
        let (url, _) =
            spawn_upstream(StatusCode::OK, r#"{"error":"nope"}"#, Duration::ZERO).await;
        let err = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let (url, _) = spawn_upstream(StatusCode::OK, "<html>ok</html>", Duration::ZERO).await;
        let err = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MalformedResponse(_)), "{err:?}");
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let body = r#"{"choices":[{"message":{"content":"late"}}]}"#;
        let (url, _) = spawn_upstream(StatusCode::OK, body, Duration::from_secs(5)).await;
        let err = provider(url, Duration::from_millis(200))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)), "{err:?}");
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider(format!("http://{addr}/v1/chat/completions"), Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Connect(_)), "{err:?}");
    }

    /// Reads one request, then answers with a 502 whose body is cut short.
    async fn spawn_truncated_error_upstream() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&request[..head_end]).to_lowercase();
                let body_len: usize = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
                if request.len() >= head_end + 4 + body_len {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\n\r\npartial")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/api/v1/chat/completions")
    }

    #[tokio::test]
    async fn error_status_survives_unreadable_body() {
        let url = spawn_truncated_error_upstream().await;
        let err = provider(url, Duration::from_secs(5))
            .complete(messages(), 0.7, 500)
            .await
            .unwrap_err();
        match err {
            LlmError::ApiError { status, .. } => assert_eq!(status, 502),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[test]
    fn first_completion_requires_string_content() {
        let resp = json!({"choices": [{"message": {"content": null}}]});
        assert!(matches!(
            first_completion(&resp),
            Err(LlmError::MalformedResponse(_))
        ));
    }
}
