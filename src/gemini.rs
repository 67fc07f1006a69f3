//! Client for the Gemini `generateContent` endpoint.
//!
//! One request per analysis: the fixed product prompt followed by the image as
//! inline base64 data. No retries, no streaming, no client-side timeout.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::GeminiConfig;
use crate::error::AnalysisError;
use crate::prompt::PRODUCT_PROMPT;

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Text or inline media. Serialized untagged, so each variant is its own JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

/// Response parts may be text, thoughts, or kinds we don't use; only text is read.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

impl GenerateContentRequest {
    pub fn for_image(base64: &str, mime_type: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: PRODUCT_PROMPT.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64.to_string(),
                        },
                    },
                ],
            }],
        }
    }
}

impl GenerateContentResponse {
    /// Concatenated non-thought text of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

// ── Seams ───────────────────────────────────────────────────────────────────

/// Something that can turn an image into analysis text.
pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        base64: &str,
        mime_type: &str,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}

/// Delivers one generation request and returns the decoded response.
pub trait Transport: Send + Sync {
    fn generate(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<GenerateContentResponse, AnalysisError>> + Send;
}

// ── HTTP transport ──────────────────────────────────────────────────────────

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    async fn generate(
        &self,
        url: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnalysisError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let preview: String = body.chars().take(500).collect();
            log::warn!("Gemini returned {}: {}", status, preview);
            return Err(AnalysisError::Transport(error_message(
                status.as_u16(),
                &body,
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| AnalysisError::Transport(format!("Malformed Gemini response: {e}")))
    }
}

/// The URL is dropped from reqwest's text; it never leaves this module.
fn transport_error(err: reqwest::Error) -> AnalysisError {
    AnalysisError::Transport(err.without_url().to_string())
}

/// Prefer the message from Gemini's error envelope over the raw body.
fn error_message(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        error: EnvelopeError,
    }
    #[derive(Deserialize)]
    struct EnvelopeError {
        message: String,
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(env) if !env.error.message.trim().is_empty() => env.error.message,
        _ => format!("API error {status}: {body}"),
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

pub struct GeminiClient<T = HttpTransport> {
    config: GeminiConfig,
    transport: T,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T: Transport> GeminiClient<T> {
    pub fn with_transport(config: GeminiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl<T: Transport> Analyzer for GeminiClient<T> {
    async fn analyze(&self, base64: &str, mime_type: &str) -> Result<String, AnalysisError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(AnalysisError::MissingCredential),
        };

        let request = GenerateContentRequest::for_image(base64, mime_type);
        log::info!(
            "Sending {} image ({} base64 chars) to {}",
            mime_type,
            base64.len(),
            self.config.model
        );

        let response = self
            .transport
            .generate(&self.endpoint(), api_key, &request)
            .await?;

        let text = response.text().ok_or(AnalysisError::EmptyResponse)?;
        log::debug!("Gemini analysis: {} chars", text.len());
        Ok(text)
    }
}
