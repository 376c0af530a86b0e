//! Prompt parsing through a generative language model
//!
//! The prompt is wrapped in an instruction that describes the expected JSON
//! shape, sent to the model's `generateContent` endpoint, and the first JSON
//! object in the reply is parsed as a [`SchemaDraft`]. Every failure on the
//! way is a parse error.

use metaforge_core::{ForgeError, ForgeResult};
use metaforge_ir::SchemaDraft;
use regex::Regex;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::config::ForgeConfig;

/// Greedy match from the first `{` to the last `}`
const JSON_OBJECT_PATTERN: &str = r"\{[\s\S]*\}";

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Base delay before the first retry; doubled on every further attempt
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

// ============================================================================
// PromptParser
// ============================================================================

/// Turns free text into a schema draft
pub trait PromptParser: Send + Sync {
    fn parse(&self, prompt: &str) -> impl Future<Output = ForgeResult<SchemaDraft>> + Send;
}

// ============================================================================
// Prompt
// ============================================================================

/// Wrap the user's prompt in the extraction instruction
pub fn build_prompt(prompt: &str) -> String {
    format!(
        r#"Parse this prompt and return a JSON object with the following structure:
{{
  "object": "ObjectName",
  "pluralLabel": "Object Names",
  "description": "What the object stores",
  "fields": [
    {{
      "name": "fieldName",
      "label": "Field Label",
      "type": "FieldType",
      "length": 100,
      "precision": 18,
      "scale": 2,
      "defaultValue": false,
      "picklistValues": ["Option1", "Option2"],
      "required": false
    }}
  ],
  "profileAccess": [
    {{
      "profile": "ProfileName",
      "objectPermissions": {{ "allowRead": true, "allowCreate": true, "allowEdit": true, "allowDelete": false }},
      "fields": [
        {{ "field": "FieldName", "readable": true, "editable": false }}
      ],
      "userPermissions": [
        {{ "name": "PermissionName", "enabled": true }}
      ]
    }}
  ],
  "permissionSets": [
    {{
      "name": "PermissionSetName",
      "label": "Permission Set Label",
      "objectPermissions": {{ "object": "ObjectName", "allowRead": true, "allowEdit": true }},
      "fieldPermissions": [
        {{ "field": "ObjectName.FieldName", "readable": true, "editable": true }}
      ]
    }}
  ],
  "validationRules": [
    {{
      "name": "ValidationRuleName",
      "errorMessage": "Error message to display",
      "errorConditionFormula": "Formula expression for validation"
    }}
  ]
}}

- Field types are one of: Text, TextArea, LongTextArea, Number, Currency, Percent, Checkbox, Picklist, Date, DateTime, Email, Phone, Url.
- For each profile mentioned, include a profileAccess entry.
- For each field that should have FLS, include a fields array with the field name and readable/editable booleans.
- If a field is only visible, set readable: true, editable: false.
- If a field is visible and editable, set both to true.
- If a field is not visible, set both to false.
- Only include fields in the fields array that should have FLS set for that profile.
- If the prompt mentions permission sets, include a permissionSets array as shown above.
- If the prompt mentions validation rules, include a validationRules array as shown above.

Here's the prompt to parse: {prompt}"#
    )
}

// ============================================================================
// Reply handling
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// Pull `candidates[0].content.parts[0].text` out of a response body
pub fn extract_reply_text(body: &str) -> ForgeResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| ForgeError::parse(format!("Unexpected model response: {}", e)))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ForgeError::parse("Model returned no content"))
}

/// Parse the model's reply text into a draft.
///
/// The reply may wrap the JSON in prose or a code fence; the span from the
/// first `{` to the last `}` is used.
pub fn parse_model_reply(text: &str) -> ForgeResult<SchemaDraft> {
    let pattern = Regex::new(JSON_OBJECT_PATTERN).map_err(|e| ForgeError::internal(e.to_string()))?;

    let json = pattern
        .find(text)
        .ok_or_else(|| ForgeError::parse("No JSON object found in the response"))?
        .as_str();

    let draft = SchemaDraft::from_json(json)
        .map_err(|e| ForgeError::parse(format!("Malformed JSON in model reply: {}", e)))?;

    if draft.object_name().is_none() || draft.fields.is_none() {
        return Err(ForgeError::parse(
            "Invalid response format: missing object name or fields array",
        ));
    }

    Ok(draft)
}

// ============================================================================
// GeminiParser
// ============================================================================

/// Prompt parser backed by the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiParser {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    attempts: u32,
    backoff: Duration,
}

/// Outcome of a failed attempt
enum AttemptError {
    /// Worth retrying (timeouts, connection errors, 429, 5xx)
    Transient(ForgeError),
    Fatal(ForgeError),
}

impl GeminiParser {
    /// Build a parser from the runtime configuration
    pub fn from_config(config: &ForgeConfig) -> ForgeResult<Self> {
        let api_key = config.require_api_key()?.to_string();
        let timeout = config.model_timeout();

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .user_agent(concat!("metaforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ForgeError::with_context("Failed to create HTTP client", e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint_url(&config.api_base, &config.model),
            api_key,
            timeout,
            attempts: config.model_retries.max(1),
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Override the retry backoff base
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Use a preconfigured HTTP client
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, body: &serde_json::Value) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.classify_transport(e))?;

        if !status.is_success() {
            let err = ForgeError::parse(format!(
                "Model API returned HTTP {}: {}",
                status.as_u16(),
                truncate(&text, 300)
            ));
            return Err(if is_transient_status(status.as_u16()) {
                AttemptError::Transient(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        Ok(text)
    }

    fn classify_transport(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Transient(ForgeError::timeout("model call", self.timeout))
        } else if e.is_connect() {
            AttemptError::Transient(ForgeError::parse(format!("Model API unreachable: {}", e)))
        } else {
            AttemptError::Fatal(ForgeError::parse(format!("Model request failed: {}", e)))
        }
    }

    /// Post the request, retrying transient failures with exponential backoff
    async fn send(&self, body: &serde_json::Value) -> ForgeResult<String> {
        let mut attempt = 1;
        loop {
            match self.attempt(body).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(err)) if attempt >= self.attempts => return Err(err),
                Err(AttemptError::Transient(err)) => {
                    let delay = backoff_delay(self.backoff, attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "model call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl PromptParser for GeminiParser {
    async fn parse(&self, prompt: &str) -> ForgeResult<SchemaDraft> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(prompt) }] }]
        });

        tracing::info!(endpoint = %self.endpoint, "sending prompt to model");
        let response = self.send(&body).await?;
        let reply = extract_reply_text(&response)?;
        tracing::debug!(reply = %reply, "model reply");

        let draft = parse_model_reply(&reply)?;
        tracing::info!(
            object = draft.object_name().unwrap_or_default(),
            fields = draft.field_count(),
            "parsed schema draft"
        );
        Ok(draft)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn endpoint_url(api_base: &str, model: &str) -> String {
    format!(
        "{}/models/{}:generateContent",
        api_base.trim_end_matches('/'),
        model
    )
}

/// HTTP statuses worth retrying
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Delay before retry number `attempt` (1-based)
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use metaforge_core::FieldType;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn test_build_prompt_includes_request() {
        let prompt = build_prompt("Create object Car with fields Name (Text), Price (Currency)");
        assert!(prompt.starts_with("Parse this prompt"));
        assert!(prompt.contains("\"profileAccess\""));
        assert!(prompt.ends_with("Create object Car with fields Name (Text), Price (Currency)"));
    }

    #[test]
    fn test_extract_reply_text() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "hello"}]}}]}"#;
        assert_eq!(extract_reply_text(body).unwrap(), "hello");

        let err = extract_reply_text(r#"{"candidates": []}"#).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"object\": \"Car\", \"fields\": [\
                     {\"name\": \"Name\", \"type\": \"Text\"}, \
                     {\"name\": \"Price\", \"type\": \"Currency\"}]}\n```";
        let draft = parse_model_reply(reply).unwrap();

        assert_eq!(draft.object_name(), Some("Car"));
        assert_eq!(draft.field_count(), 2);
        assert_eq!(draft.field_list()[1].field_type, FieldType::Currency);
    }

    #[test]
    fn test_reply_without_json() {
        let err = parse_model_reply("I cannot help with that.").unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("No JSON object found"));
    }

    #[test]
    fn test_malformed_json_reply() {
        let err = parse_model_reply("{\"object\": \"Car\", \"fields\": [}").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_reply_missing_object() {
        let err = parse_model_reply(r#"{"fields": []}"#).unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("missing object name"));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(503));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(403));
    }

    #[test]
    fn test_backoff_doubles() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(400));
    }

    #[test]
    fn test_from_config() {
        let config = ForgeConfig {
            api_key: Some("secret".into()),
            api_base: "http://localhost:9999/v1beta/".into(),
            ..Default::default()
        };
        let parser = GeminiParser::from_config(&config).unwrap();
        assert_eq!(
            parser.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-1.5-flash-latest:generateContent"
        );

        let err = GeminiParser::from_config(&ForgeConfig::default()).unwrap_err();
        assert!(matches!(err, ForgeError::MissingConfig(_)));
    }

    // ------------------------------------------------------------------------
    // Retry loop against a local HTTP server
    // ------------------------------------------------------------------------

    /// Requests received by the server, in order
    type Received = Arc<Mutex<Vec<String>>>;

    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let body_len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + body_len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serve one canned response per connection, in order
    async fn serve(responses: Vec<(u16, String)>) -> (String, Received) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received: Received = Arc::default();
        let log = Arc::clone(&received);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;
                log.lock().unwrap().push(request);
                let response = format!(
                    "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });

        (format!("http://{}/v1beta", addr), received)
    }

    fn reply_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    fn local_parser(api_base: String, retries: u32) -> GeminiParser {
        let config = ForgeConfig {
            api_key: Some("secret".into()),
            api_base,
            model_retries: retries,
            ..Default::default()
        };
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        GeminiParser::from_config(&config)
            .unwrap()
            .with_backoff(Duration::from_millis(1))
            .with_http_client(client)
    }

    const CAR_REPLY: &str = r#"{"object": "Car", "fields": [{"name": "Price", "type": "Currency"}]}"#;

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let (base, received) = serve(vec![
            (503, "{}".into()),
            (429, "{}".into()),
            (200, reply_body(CAR_REPLY)),
        ])
        .await;

        let draft = local_parser(base, 3).parse("Create a Car").await.unwrap();

        assert_eq!(draft.object_name(), Some("Car"));
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 3);
        assert!(received[0].starts_with("POST /v1beta/models/gemini-1.5-flash-latest:generateContent"));
        assert!(received[0].to_lowercase().contains("x-goog-api-key: secret"));
        assert!(received[2].contains("Create a Car"));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (base, received) = serve(vec![
            (400, r#"{"error": "bad request"}"#.into()),
            (200, reply_body(CAR_REPLY)),
        ])
        .await;

        let err = local_parser(base, 3).parse("Create a Car").await.unwrap_err();

        assert!(err.is_parse());
        assert!(err.to_string().contains("HTTP 400"));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (base, received) = serve(vec![
            (500, "{}".into()),
            (502, "{}".into()),
            (200, reply_body(CAR_REPLY)),
        ])
        .await;

        let err = local_parser(base, 2).parse("Create a Car").await.unwrap_err();

        assert!(err.to_string().contains("HTTP 502"));
        assert_eq!(received.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_not_retried() {
        let (base, received) = serve(vec![
            (200, reply_body("Sorry, I cannot help.")),
            (200, reply_body(CAR_REPLY)),
        ])
        .await;

        let err = local_parser(base, 3).parse("Create a Car").await.unwrap_err();

        assert!(err.to_string().contains("No JSON object found"));
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
