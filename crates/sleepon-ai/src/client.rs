use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("no API keys configured")]
    NoCredentials,

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("all {attempts} API keys failed, last error: {last}")]
    Exhausted { attempts: usize, last: String },

    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

/// Prompt in, generated text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

// -- Gemini wire format --

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
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
    fn into_text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Gemini `generateContent` client. Holds several API keys and tries each
/// once, in order, until one succeeds.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_keys: Vec<String>,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_keys: Vec<String>,
        timeout: Duration,
    ) -> Result<Self, AiError> {
        let api_keys: Vec<String> = api_keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if api_keys.is_empty() {
            return Err(AiError::NoCredentials);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_keys,
        })
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.len()
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate_with_key(&self, key: &str, prompt: &str) -> Result<String, AiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        parsed
            .into_text()
            .ok_or_else(|| AiError::InvalidResponse("no text in candidates".into()))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        debug!("Sending generate request with model: {}", self.model);

        let mut last = None;
        for key in &self.api_keys {
            match self.generate_with_key(key, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Gemini request failed with key ...{}: {}", key_suffix(key), e);
                    last = Some(e);
                }
            }
        }

        Err(AiError::Exhausted {
            attempts: self.api_keys.len(),
            last: last.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

/// Last four characters of a key, for logs.
fn key_suffix(key: &str) -> &str {
    let start = key
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &key[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    fn client(server: &MockServer, keys: &[&str]) -> GeminiClient {
        GeminiClient::new(
            server.uri(),
            "gemini-test",
            keys.iter().map(|k| k.to_string()).collect(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn blank_keys_are_dropped() {
        let client = GeminiClient::new(
            "http://localhost",
            "m",
            vec![" key-a ".into(), "".into(), "  ".into(), "key-b".into()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.key_count(), 2);
    }

    #[test]
    fn no_keys_is_an_error() {
        let res = GeminiClient::new("http://localhost", "m", vec![" ".into()], Duration::from_secs(1));
        assert!(matches!(res, Err(AiError::NoCredentials)));
    }

    #[test]
    fn key_suffix_keeps_last_four_chars() {
        assert_eq!(key_suffix("AIzaSyExample1234"), "1234");
        assert_eq!(key_suffix("abc"), "abc");
    }

    #[tokio::test]
    async fn returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "good"))
            .respond_with(reply("Take a deep breath."))
            .mount(&server)
            .await;

        let text = client(&server, &["good"]).generate("hello").await.unwrap();
        assert_eq!(text, "Take a deep breath.");
    }

    #[tokio::test]
    async fn rotates_to_next_key_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "exhausted"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "good"))
            .respond_with(reply("second key worked"))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server, &["exhausted", "good"])
            .generate("hello")
            .await
            .unwrap();
        assert_eq!(text, "second key worked");
    }

    #[tokio::test]
    async fn fails_after_every_key_is_tried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server, &["a", "b", "c"])
            .generate("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Exhausted { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn empty_candidates_count_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        assert!(client(&server, &["a"]).generate("hello").await.is_err());
    }
}
