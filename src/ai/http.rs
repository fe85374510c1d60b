//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;

use super::parse::{parse_assignments, parse_generated};
use super::prompt::{ADJUSTMENT_SYSTEM, GENERATION_SYSTEM, adjustment_prompt, generation_prompt};
use super::{AdjustmentRequest, AiError, CategoryAdjuster, CategoryAssignment, GeneratedTask, TaskGenerator};
use crate::model::config::AiConfig;

/// HTTP client implementing both collaborators against a chat completions API
pub struct HttpAssistant {
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

impl HttpAssistant {
    /// Build from config, reading the API key from the configured env var.
    pub fn from_config(config: &AiConfig) -> Result<Self, AiError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AiError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(
            config.base_url.clone(),
            config.model.clone(),
            api_key,
            config.timeout(),
        ))
    }

    pub fn new(base_url: String, model: String, api_key: String, timeout: Duration) -> Self {
        HttpAssistant {
            base_url,
            model,
            api_key,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    async fn chat(&self, system: &str, user: String) -> Result<String, AiError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ],
            "response_format": { "type": "json_object" }
        });

        tracing::debug!(%url, model = %self.model, "sending chat completion");
        // The timeout covers the body read too; a server may stall after the headers
        let (status, text) = timeout(self.timeout, self.exchange(&url, &body))
            .await
            .map_err(|_| AiError::Timeout(self.timeout.as_secs()))??;

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(AiError::Unavailable(text));
        }
        if !status.is_success() {
            return Err(AiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Malformed("response has no message content".to_string()))
    }

    async fn exchange(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<(reqwest::StatusCode, String), AiError> {
        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| AiError::Transport(e.to_string()))?;
        Ok((status, text))
    }
}

#[async_trait]
impl TaskGenerator for HttpAssistant {
    async fn generate(&self, description: &str) -> Result<Vec<GeneratedTask>, AiError> {
        let content = self.chat(GENERATION_SYSTEM, generation_prompt(description)).await?;
        parse_generated(&content)
    }
}

#[async_trait]
impl CategoryAdjuster for HttpAssistant {
    async fn adjust(&self, request: &AdjustmentRequest) -> Result<Vec<CategoryAssignment>, AiError> {
        let content = self.chat(ADJUSTMENT_SYSTEM, adjustment_prompt(request)).await?;
        parse_assignments(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Accept one connection, read the full request, answer with `response`
    /// verbatim and keep the socket open for `hold`. The handle yields the
    /// raw request text.
    async fn serve_once(response: String, hold: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.flush().await;
            tokio::time::sleep(hold).await;
            request
        });
        (format!("http://{}", addr), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        line.to_ascii_lowercase()
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    fn completion(content: &str) -> String {
        serde_json::json!({ "choices": [{ "message": { "content": content } }] }).to_string()
    }

    fn assistant(base_url: String, timeout: Duration) -> HttpAssistant {
        HttpAssistant {
            base_url,
            model: "test-model".into(),
            api_key: "sk-test".into(),
            timeout,
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
        }
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let config = AiConfig {
            api_key_env: "TASKWISE_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        match HttpAssistant::from_config(&config) {
            Err(AiError::MissingApiKey(var)) => {
                assert_eq!(var, "TASKWISE_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected a missing key error"),
        }
    }

    #[tokio::test]
    async fn test_generate_parses_fenced_content() {
        let content = "```json\n{\"taskList\":[{\"task\":\"Pick a name\",\"category\":\"Plan\",\"priority\":1}]}\n```";
        let (url, server) = serve_once(http_response("200 OK", &completion(content)), Duration::ZERO).await;

        let tasks = assistant(url, Duration::from_secs(5))
            .generate("name a blog")
            .await
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task, "Pick a name");
        assert_eq!(tasks[0].category, "Plan");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("\"model\":\"test-model\""));
        assert!(request.contains("Description: name a blog"));
    }

    #[tokio::test]
    async fn test_adjust_parses_wrapped_assignments() {
        let content = r#"{"tasks":[{"id":"1","title":"Sketch","category":"Design"}]}"#;
        let (url, _server) = serve_once(http_response("200 OK", &completion(content)), Duration::ZERO).await;

        let request = AdjustmentRequest {
            task_list: Vec::new(),
            instructions: "move sketching to design".into(),
        };
        let assignments = assistant(url, Duration::from_secs(5))
            .adjust(&request)
            .await
            .unwrap();
        assert_eq!(assignments, vec![CategoryAssignment {
            id: "1".into(),
            title: "Sketch".into(),
            category: "Design".into(),
        }]);
    }

    #[tokio::test]
    async fn test_503_is_unavailable_and_transient() {
        let (url, _server) =
            serve_once(http_response("503 Service Unavailable", "overloaded"), Duration::ZERO).await;

        let err = assistant(url, Duration::from_secs(5)).generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Unavailable(ref body) if body == "overloaded"));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_other_error_status_is_permanent() {
        let (url, _server) =
            serve_once(http_response("401 Unauthorized", "bad key"), Duration::ZERO).await;

        let err = assistant(url, Duration::from_secs(5)).generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Status { status: 401, ref body } if body == "bad key"));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        // Headers promise 1000 bytes, only one arrives
        let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 1000\r\n\r\n{";
        let (url, _server) = serve_once(response.to_string(), Duration::from_secs(10)).await;

        let started = Instant::now();
        let err = assistant(url, Duration::from_secs(1)).generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Timeout(1)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_unparseable_content_is_malformed() {
        let body = completion("Sorry, I can only answer in prose.");
        let (url, _server) = serve_once(http_response("200 OK", &body), Duration::ZERO).await;
        let err = assistant(url, Duration::from_secs(5)).generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));

        let (url, _server) = serve_once(http_response("200 OK", "<html>"), Duration::ZERO).await;
        let err = assistant(url, Duration::from_secs(5)).generate("x").await.unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }
}
