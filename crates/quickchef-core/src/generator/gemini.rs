//! Gemini `generateContent` client with JSON-mode structured output.

use std::fmt;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Generator;
use crate::prompt::Prompt;
use crate::schema::Schema;

/// Default model for every generation.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Public endpoint root; overridable for tests and proxies.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Text of the first candidate, or empty if the service returned none.
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default()
    }
}

/// [`Generator`] backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
        }
    }

    /// Point the client at a different endpoint root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &Prompt, schema: &Schema) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &prompt.contents,
                }],
            }],
            system_instruction: prompt.system_instruction.as_deref().map(|text| Content {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema.to_json(),
            },
        };

        let started = Instant::now();
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to reach Gemini model {}", self.model))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.model, %status, "Gemini request rejected");
            bail!("Gemini returned {status}: {}", detail.trim());
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("failed to parse Gemini response envelope")?;
        tracing::debug!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gemini call finished"
        );
        Ok(parsed.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    #[derive(Clone, Default)]
    struct Seen {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    async fn fake_service(reply: (StatusCode, Value)) -> (String, Seen) {
        let seen = Seen::default();
        let app = Router::new()
            .route(
                "/v1beta/models/{call}",
                post(
                    move |State(seen): State<Seen>,
                          Path(call): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let key = headers
                                .get("x-goog-api-key")
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string);
                            seen.calls.lock().unwrap().push((call, key, body));
                            (reply.0, Json(reply.1))
                        }
                    },
                ),
            )
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn candidate(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    }

    #[tokio::test]
    async fn sends_schema_and_instruction() {
        let (url, seen) = fake_service((StatusCode::OK, candidate("{\"ok\":true}"))).await;
        let generator = GeminiGenerator::new("secret", "test-model").with_base_url(&url);
        let prompt = Prompt::new("make lunch").with_system_instruction("be brief");

        let text = generator
            .generate(&prompt, &Schema::object(vec![]))
            .await
            .unwrap();
        assert_eq!(text, "{\"ok\":true}");

        let calls = seen.calls.lock().unwrap();
        let (call, key, body) = &calls[0];
        assert_eq!(call, "test-model:generateContent");
        assert_eq!(key.as_deref(), Some("secret"));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "make lunch");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[tokio::test]
    async fn omits_missing_system_instruction() {
        let (url, seen) = fake_service((StatusCode::OK, candidate("x"))).await;
        let generator = GeminiGenerator::new("k", "m").with_base_url(&url);
        generator
            .generate(&Prompt::new("p"), &Schema::string())
            .await
            .unwrap();
        let calls = seen.calls.lock().unwrap();
        assert!(calls[0].2.get("systemInstruction").is_none());
    }

    #[tokio::test]
    async fn joins_multiple_parts() {
        let parts = json!([{"text": "{\"a\":"}, {"text": "1}"}]);
        let reply = json!({"candidates": [{"content": {"parts": parts}}]});
        let (url, _) = fake_service((StatusCode::OK, reply)).await;
        let generator = GeminiGenerator::new("k", "m").with_base_url(&url);
        let text = generator
            .generate(&Prompt::new("p"), &Schema::string())
            .await
            .unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn no_candidates_yields_empty_text() {
        let (url, _) = fake_service((StatusCode::OK, json!({"promptFeedback": {}}))).await;
        let generator = GeminiGenerator::new("k", "m").with_base_url(&url);
        let text = generator
            .generate(&Prompt::new("p"), &Schema::string())
            .await
            .unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn error_status_is_an_error() {
        let (url, _) = fake_service((
            StatusCode::TOO_MANY_REQUESTS,
            json!({"error": {"message": "quota"}}),
        ))
        .await;
        let generator = GeminiGenerator::new("k", "m").with_base_url(&url);
        let err = generator
            .generate(&Prompt::new("p"), &Schema::string())
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"), "unexpected message: {msg}");
        assert!(msg.contains("quota"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let generator = GeminiGenerator::new("k", "gemini-x").with_base_url("http://host/");
        assert_eq!(
            generator.endpoint(),
            "http://host/v1beta/models/gemini-x:generateContent"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let generator = GeminiGenerator::new("AIza-very-secret", "gemini-x");
        let shown = format!("{generator:?}");
        assert!(!shown.contains("AIza-very-secret"), "key leaked: {shown}");
        assert!(shown.contains("[redacted]"));
        assert!(shown.contains("gemini-x"));
    }
}
