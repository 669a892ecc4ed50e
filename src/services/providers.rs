// Remote Model Provider Service
// Implements the Gemini generateContent call used by every analysis prompt

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the config does not name one.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Missing content in response")]
    MissingContent,
    #[error("JSON parse error: {0}")]
    JsonError(String),
    #[error("API key not configured")]
    MissingApiKey,
    #[error("failed to read image payload: {0}")]
    ImageRead(#[from] std::io::Error),
}

/// Raw bytes plus mime type for an image attached to a prompt.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn from_file(path: &Path) -> Result<Self, ProviderError> {
        let data = std::fs::read(path)?;
        Ok(Self {
            mime_type: mime_for_extension(path),
            data,
        })
    }
}

fn mime_for_extension(path: &Path) -> String {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// One remote reply: the model text plus request latency for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    pub content: String,
    pub latency_ms: i64,
}

pub struct ProviderClient {
    client: Client,
    base_url: String,
}

impl Default for ProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(80))
        .build()
        .unwrap_or_default()
}

/// Base URL precedence: environment override, then the config file, then the
/// provider default. Blank values are treated as unset.
fn resolve_base_url(env_url: Option<String>, config_url: Option<String>) -> String {
    env_url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| config_url.filter(|u| !u.trim().is_empty()))
        .unwrap_or_else(|| GEMINI_DEFAULT_URL.to_string())
}

impl ProviderClient {
    pub fn new() -> Self {
        let env_url = env::var("GEMINI_API_URL").ok();
        let config_url = super::ConfigStore::default_config_dir()
            .map(super::ConfigStore::new)
            .and_then(|store| store.get_provider_url("gemini").ok().flatten());

        Self {
            client: build_client(),
            base_url: resolve_base_url(env_url, config_url),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
        }
    }

    /// Single synchronous call to the remote multimodal model: prompt text
    /// plus zero or one inline image. No retry; failures propagate to the
    /// caller, which converts them at the verdict boundary.
    pub async fn ask(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
        image: Option<&ImagePayload>,
    ) -> Result<ModelReply, ProviderError> {
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey);
        }

        let mut parts = vec![serde_json::json!({ "text": prompt })];
        if let Some(payload) = image {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&payload.data);
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": payload.mime_type,
                    "data": encoded
                }
            }));
        }

        let request = serde_json::json!({
            "contents": [{ "parts": parts }]
        });

        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let latency_ms = start.elapsed().as_millis() as i64;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        // Response shape: {"candidates":[{"content":{"parts":[{"text":"..."}]}}]}
        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(ProviderError::MissingContent)?;

        Ok(ModelReply {
            content,
            latency_ms,
        })
    }
}

/// Get API key from environment or config file
pub fn get_api_key(provider: &str) -> Option<String> {
    let env_keys = match provider {
        "gemini" => vec!["GEMINI_API_KEY", "VERIFRAME_GEMINI_API_KEY"],
        _ => vec![],
    };

    for key in env_keys {
        if let Ok(val) = env::var(key) {
            let v = val.trim();
            if !v.is_empty() {
                return Some(v.to_string());
            }
        }
    }

    if let Some(config_dir) = super::ConfigStore::default_config_dir() {
        let store = super::ConfigStore::new(config_dir);
        if let Ok(Some(key)) = store.get_api_key(provider) {
            return Some(key);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_extension(Path::new("a.png")), "image/png");
        assert_eq!(
            mime_for_extension(Path::new("a.xyz")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("http://env".into()), Some("http://cfg".into())),
            "http://env"
        );
        assert_eq!(
            resolve_base_url(None, Some("http://cfg".into())),
            "http://cfg"
        );
        // Blank values count as unset.
        assert_eq!(
            resolve_base_url(Some("  ".into()), None),
            GEMINI_DEFAULT_URL
        );
        assert_eq!(resolve_base_url(None, None), GEMINI_DEFAULT_URL);
    }

    #[test]
    fn test_provider_client_default_url() {
        let client = ProviderClient::with_base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[tokio::test]
    async fn test_ask_rejects_empty_api_key() {
        let client = ProviderClient::with_base_url("http://localhost:9999");
        let err = client
            .ask(DEFAULT_MODEL, "  ", "prompt", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
