/// LLM Client: the single point of entry for all Gemini API calls.
///
/// No other module may call the Gemini API directly; handlers depend on the
/// `TextModel` trait and receive a `GeminiClient` through `AppState`.
///
/// Model: gemini-2.5-flash (hardcoded, not configurable)
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// The model used for all LLM calls.
pub const MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Prompt was blocked: {0}")]
    Blocked(String),

    #[error("Model response has no candidates")]
    NoCandidates,

    #[error("Model candidate has no content")]
    NoContent,

    #[error("Model content has no parts")]
    NoParts,

    #[error("Model part has no text")]
    NoText,

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A text-in, text-out generative model. One call per invocation, no retries.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
pub struct Part {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Extracts `candidates[0].content.parts[0].text`, naming the first missing level.
    pub fn text(&self) -> Result<&str, LlmError> {
        let candidate = match self.candidates.first() {
            Some(c) => c,
            None => {
                return Err(self
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone())
                    .map(LlmError::Blocked)
                    .unwrap_or(LlmError::NoCandidates))
            }
        };
        let content = candidate.content.as_ref().ok_or(LlmError::NoContent)?;
        let part = content.parts.first().ok_or(LlmError::NoParts)?;
        part.text.as_deref().ok_or(LlmError::NoText)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Wraps the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, GEMINI_API_BASE)
    }

    pub fn with_base_url(api_key: String, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL)
    }

    /// Makes a single call to the Gemini API, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, candidate_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(gemini_response)
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response.text().map(str::to_string)
    }
}

/// Calls the model and deserializes its text reply as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn call_json<T: DeserializeOwned>(
    model: &dyn TextModel,
    prompt: &str,
) -> Result<T, LlmError> {
    let text = model.generate(prompt).await?;
    parse_json_reply(&text)
}

/// Strips code fences and parses strictly. No recovery on malformed JSON.
pub fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(&strip_json_fences(text)).map_err(LlmError::Parse)
}

/// Removes every ```json and ``` marker from LLM output and trims the rest.
pub fn strip_json_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_fenced_and_bare_replies_parse_identically() {
        let bare = r#"{"insights": ["Keep it up", "Send reminders"]}"#;
        let fenced = format!("```json\n{bare}\n```");
        let a: Value = parse_json_reply(bare).unwrap();
        let b: Value = parse_json_reply(&fenced).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_reply_is_parse_error() {
        let result: Result<Value, _> = parse_json_reply("```json\nSure! Here is your invoice\n```");
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    fn response(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_text_extracts_first_part() {
        let r = response(
            r#"{"candidates":[{"content":{"parts":[{"text":"Subject: Hi"},{"text":"ignored"}],"role":"model"}}],
                "usageMetadata":{"promptTokenCount":10,"candidatesTokenCount":4}}"#,
        );
        assert_eq!(r.text().unwrap(), "Subject: Hi");
    }

    #[test]
    fn test_text_names_each_missing_level() {
        assert!(matches!(response("{}").text(), Err(LlmError::NoCandidates)));
        assert!(matches!(
            response(r#"{"candidates":[{}]}"#).text(),
            Err(LlmError::NoContent)
        ));
        assert!(matches!(
            response(r#"{"candidates":[{"content":{"parts":[]}}]}"#).text(),
            Err(LlmError::NoParts)
        ));
        assert!(matches!(
            response(r#"{"candidates":[{"content":{"parts":[{}]}}]}"#).text(),
            Err(LlmError::NoText)
        ));
    }

    #[test]
    fn test_text_reports_block_reason() {
        let r = response(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        match r.text() {
            Err(LlmError::Blocked(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gemini_client_returns_candidate_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"hello"}]}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), &server.url()).unwrap();
        let text = client.generate("say hello").await.unwrap();

        assert_eq!(text, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_client_surfaces_api_error_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(503)
            .with_body(r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), &server.url()).unwrap();
        match client.generate("anything").await {
            Err(LlmError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "The model is overloaded.");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_client_rejects_response_without_text() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::with_base_url("test-key".to_string(), &server.url()).unwrap();
        assert!(matches!(
            client.generate("anything").await,
            Err(LlmError::NoContent)
        ));
    }
}
