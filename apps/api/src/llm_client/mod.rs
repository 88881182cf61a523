/// LLM Client: the single point of entry for all Gemini API calls in OptimumCV.
///
/// ARCHITECTURAL RULE: No other module may call the GenAI API directly.
/// Features depend on the `LlmGateway` trait; `GeminiClient` is the production
/// implementation, built once at startup and shared through `AppState`.
///
/// No call is retried here. Callers decide between surfacing an error and a
/// local fallback.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;
pub mod sse;

use sse::SseDecoder;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GOOGLE_GENAI_API_KEY is not configured")]
    Config,

    #[error("GenAI quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("GenAI generation failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode GenAI response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Raw image bytes produced by the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// The seam every feature calls through. Swap in a fake for tests.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// True when a credential is present. Does not touch the network.
    fn is_configured(&self) -> bool;

    /// Returns the model's plain text, or `""` when nothing usable came back.
    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError>;

    /// Sends an image plus a prompt to the vision model and returns its text.
    async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, LlmError>;

    /// Requests image-only output. `Ok(None)` means the stream carried no image.
    async fn generate_image(
        &self,
        prompt: &str,
        reference_analysis: &str,
    ) -> Result<Option<GeneratedImage>, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default = "default_image_mime")]
    pub mime_type: String,
    pub data: String,
}

fn default_image_mime() -> String {
    "image/png".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
}

/// The two response shapes the text endpoint is known to produce.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextResponse {
    /// Flattened shape with a top-level `text` field.
    Direct {
        text: String,
        #[serde(default)]
        candidates: Vec<Candidate>,
    },
    Candidates {
        #[serde(default)]
        candidates: Vec<Candidate>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

impl TextResponse {
    /// Prefers the flattened text; otherwise joins the first candidate's text parts.
    pub fn into_text(self) -> String {
        let candidates = match self {
            TextResponse::Direct { text, candidates } => {
                let direct = text.trim();
                if !direct.is_empty() {
                    return direct.to_string();
                }
                candidates
            }
            TextResponse::Candidates { candidates } => candidates,
        };

        candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default()
    }
}

/// One streamed chunk from `streamGenerateContent`.
#[derive(Debug, Default, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Failure classification
// ────────────────────────────────────────────────────────────────────────────

const QUOTA_MARKERS: &[&str] = &[
    "429",
    "resource_exhausted",
    "resource exhausted",
    "quota",
    "rate limit",
    "too many requests",
];

/// The one place that decides whether upstream error text means rate limiting.
pub fn is_quota_exhausted(text: &str) -> bool {
    let text = text.to_lowercase();
    QUOTA_MARKERS.iter().any(|marker| text.contains(marker))
}

fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

fn classify_failure(status: StatusCode, body: &str) -> LlmError {
    let message = upstream_message(body);
    if status == StatusCode::TOO_MANY_REQUESTS || is_quota_exhausted(&message) {
        LlmError::QuotaExceeded(message)
    } else {
        LlmError::Generation(format!("status {}: {message}", status.as_u16()))
    }
}

/// Decodes one SSE payload. Returns the first inline image it carries, if any.
fn image_from_chunk(payload: &str) -> Result<Option<GeneratedImage>, LlmError> {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(payload) {
        let message = match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        };
        return Err(if is_quota_exhausted(&message) {
            LlmError::QuotaExceeded(message)
        } else {
            LlmError::Generation(message)
        });
    }

    let chunk: StreamChunk = serde_json::from_str(payload)?;
    let inline = chunk
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .find_map(|part| part.inline_data);

    match inline {
        Some(inline) => {
            let data = STANDARD.decode(inline.data.as_bytes()).map_err(|e| {
                LlmError::Generation(format!("image payload was not valid base64: {e}"))
            })?;
            Ok(Some(GeneratedImage {
                data,
                mime_type: inline.mime_type,
            }))
        }
        None => Ok(None),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini client
// ────────────────────────────────────────────────────────────────────────────

/// Production gateway over the Gemini REST API.
/// Cheap to clone; the inner `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.genai_api_key.clone(),
            base_url: config.genai_base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
        })
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    fn credential(&self) -> Result<&str, LlmError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::Config)
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<String, LlmError> {
        let api_key = self.credential()?;

        let response = self
            .client
            .post(self.endpoint(model, "generateContent"))
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("GenAI API returned {}: {}", status, body);
            return Err(classify_failure(status, &body));
        }

        let body = response.text().await?;
        let decoded: TextResponse = serde_json::from_str(&body)?;
        let text = decoded.into_text();

        debug!(model, chars = text.len(), "GenAI call succeeded");
        Ok(text)
    }
}

#[async_trait]
impl LlmGateway for GeminiClient {
    fn is_configured(&self) -> bool {
        self.credential().is_ok()
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart::Text { text: prompt }],
            }],
            generation_config: None,
        };
        self.generate_content(&self.text_model, &request).await
    }

    async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: STANDARD.encode(image),
                        },
                    },
                    RequestPart::Text { text: prompt },
                ],
            }],
            generation_config: None,
        };
        self.generate_content(&self.text_model, &request).await
    }

    async fn generate_image(
        &self,
        prompt: &str,
        reference_analysis: &str,
    ) -> Result<Option<GeneratedImage>, LlmError> {
        let api_key = self.credential()?;
        let full_prompt = prompts::with_reference_notes(prompt, reference_analysis);

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart::Text { text: &full_prompt }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE"],
            }),
        };

        let response = self
            .client
            .post(self.endpoint(&self.image_model, "streamGenerateContent"))
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("GenAI image API returned {}: {}", status, body);
            return Err(classify_failure(status, &body));
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut chunks_seen = 0usize;

        while let Some(bytes) = stream.next().await {
            let bytes = bytes?;
            for payload in decoder.push(&bytes) {
                chunks_seen += 1;
                if let Some(image) = image_from_chunk(&payload)? {
                    debug!(chunks_seen, mime = %image.mime_type, "Image chunk received");
                    return Ok(Some(image));
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            chunks_seen += 1;
            if let Some(image) = image_from_chunk(&payload)? {
                return Ok(Some(image));
            }
        }

        warn!(chunks_seen, "Image stream ended without inline image data");
        Ok(None)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test double
// ────────────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_text_is_preferred() {
        let response: TextResponse = serde_json::from_str(
            r#"{"text": "  direct answer  ", "candidates": [{"content": {"parts": [{"text": "ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "direct answer");
    }

    #[test]
    fn test_candidate_parts_are_joined() {
        let response: TextResponse = serde_json::from_str(
            r#"{"candidates": [
                {"content": {"parts": [{"text": " first "}, {"inlineData": {"mimeType": "image/png", "data": ""}}, {"text": ""}, {"text": "second"}]}},
                {"content": {"parts": [{"text": "other candidate"}]}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "first second");
    }

    #[test]
    fn test_blank_direct_falls_back_to_candidates() {
        let response: TextResponse = serde_json::from_str(
            r#"{"text": "   ", "candidates": [{"content": {"parts": [{"text": "from parts"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text(), "from parts");
    }

    #[test]
    fn test_nothing_extractable_is_empty_string() {
        let response: TextResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert_eq!(response.into_text(), "");

        let response: TextResponse =
            serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).unwrap();
        assert_eq!(response.into_text(), "");

        let response: TextResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(response.into_text(), "");
    }

    #[test]
    fn test_quota_predicate() {
        assert!(is_quota_exhausted("RESOURCE_EXHAUSTED: Quota exceeded for metric"));
        assert!(is_quota_exhausted("got status 429 from upstream"));
        assert!(is_quota_exhausted("Rate limit reached"));
        assert!(!is_quota_exhausted("INVALID_ARGUMENT: bad prompt"));
    }

    #[test]
    fn test_classify_failure() {
        let body = r#"{"error": {"code": 400, "message": "Prompt blocked", "status": "INVALID_ARGUMENT"}}"#;
        match classify_failure(StatusCode::BAD_REQUEST, body) {
            LlmError::Generation(message) => assert!(message.contains("Prompt blocked")),
            other => panic!("expected Generation, got {other:?}"),
        }

        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            LlmError::QuotaExceeded(_)
        ));

        let body = r#"{"error": {"code": 403, "message": "Quota exceeded for project", "status": "PERMISSION_DENIED"}}"#;
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, body),
            LlmError::QuotaExceeded(_)
        ));
    }

    #[test]
    fn test_image_from_chunk() {
        let payload = r#"{"candidates": [{"content": {"parts": [{"text": "here you go"}, {"inlineData": {"mimeType": "image/jpeg", "data": "aGVsbG8="}}]}}]}"#;
        let image = image_from_chunk(payload).unwrap().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, b"hello");

        let text_only = r#"{"candidates": [{"content": {"parts": [{"text": "thinking"}]}}]}"#;
        assert!(image_from_chunk(text_only).unwrap().is_none());
    }

    #[test]
    fn test_image_chunk_error_is_classified() {
        let payload = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert!(matches!(
            image_from_chunk(payload),
            Err(LlmError::QuotaExceeded(_))
        ));
    }

    #[test]
    fn test_data_url() {
        let image = GeneratedImage {
            data: b"hello".to_vec(),
            mime_type: "image/png".to_string(),
        };
        assert_eq!(image.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_network() {
        let config = Config {
            genai_api_key: None,
            genai_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = GeminiClient::from_config(&config).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.generate_text("hello").await,
            Err(LlmError::Config)
        ));
        assert!(matches!(
            client.generate_image("headshot", "").await,
            Err(LlmError::Config)
        ));
    }

    /// Serves one canned response for every `POST /models/:call` on a loopback port
    /// and returns a client pointed at it.
    async fn client_for_upstream(
        status: u16,
        content_type: &'static str,
        body: &'static str,
    ) -> GeminiClient {
        use axum::http::{header, StatusCode};

        let status = StatusCode::from_u16(status).unwrap();
        let upstream = axum::Router::new().route(
            "/models/:call",
            axum::routing::post(move || async move {
                (status, [(header::CONTENT_TYPE, content_type)], body)
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });

        let config = Config {
            genai_api_key: Some("test-key".to_string()),
            genai_base_url: format!("http://{addr}"),
            ..Config::default()
        };
        GeminiClient::from_config(&config).unwrap()
    }

    const QUOTA_BODY: &str = r#"{"error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;

    #[tokio::test]
    async fn test_generate_text_joins_candidate_parts() {
        let client = client_for_upstream(
            200,
            "application/json",
            r#"{"candidates": [{"content": {"parts": [{"text": "Led the "}, {"text": "migration"}]}}]}"#,
        )
        .await;
        assert_eq!(client.generate_text("rewrite").await.unwrap(), "Led the migration");
    }

    #[tokio::test]
    async fn test_generate_text_429_is_quota_exceeded() {
        let client = client_for_upstream(429, "application/json", QUOTA_BODY).await;
        match client.generate_text("rewrite").await {
            Err(LlmError::QuotaExceeded(message)) => {
                assert!(message.contains("RESOURCE_EXHAUSTED"))
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_text_server_error_is_generation() {
        let client = client_for_upstream(500, "text/plain", "backend exploded").await;
        match client.generate_text("rewrite").await {
            Err(LlmError::Generation(message)) => assert!(message.contains("500")),
            other => panic!("expected Generation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_image_stream_uses_first_image_chunk() {
        let client = client_for_upstream(
            200,
            "text/event-stream",
            concat!(
                "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"drafting\"}]}}]}\n\n",
                "data: {\"candidates\": [{\"content\": {\"parts\": [{\"inlineData\": {\"mimeType\": \"image/jpeg\", \"data\": \"aGVsbG8=\"}}]}}]}\n\n",
                "data: {\"candidates\": [{\"content\": {\"parts\": [{\"inlineData\": {\"mimeType\": \"image/png\", \"data\": \"d29ybGQ=\"}}]}}]}\n\n",
            ),
        )
        .await;
        let image = client.generate_image("headshot", "notes").await.unwrap().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, b"hello");
    }

    #[tokio::test]
    async fn test_text_only_image_stream_is_none() {
        let client = client_for_upstream(
            200,
            "text/event-stream",
            concat!(
                "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"I cannot\"}]}}]}\n\n",
                "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"do that\"}]}}]}",
            ),
        )
        .await;
        assert!(client.generate_image("headshot", "").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_image_stream_429_is_quota_exceeded() {
        let client = client_for_upstream(429, "application/json", QUOTA_BODY).await;
        assert!(matches!(
            client.generate_image("headshot", "").await,
            Err(LlmError::QuotaExceeded(_))
        ));
    }

    #[test]
    fn test_request_serializes_gemini_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png".to_string(),
                            data: "AAAA".to_string(),
                        },
                    },
                    RequestPart::Text { text: "describe" },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["IMAGE"],
            }),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "describe");
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
    }
}
