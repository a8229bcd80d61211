// LLM Provider Service
// Chat-completions client for OpenAI-compatible endpoints

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::config_store::{ConfigStore, LlmConfig};

pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const API_KEY_ENV_VARS: &[&str] = &["LLM_API_KEY", "HUMANLY_LLM_API_KEY"];

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
}

/// Where and how to reach the generation endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmSettings {
    /// Config values first, then `HUMANLY_LLM_API_URL` / `HUMANLY_LLM_MODEL` on top.
    pub fn resolve(config: Option<&LlmConfig>) -> Self {
        let mut settings = Self::default();
        if let Some(cfg) = config {
            if !cfg.api_url.trim().is_empty() {
                settings.api_url = cfg.api_url.trim().to_string();
            }
            if !cfg.model.trim().is_empty() {
                settings.model = cfg.model.trim().to_string();
            }
            if cfg.timeout_secs > 0 {
                settings.timeout = Duration::from_secs(cfg.timeout_secs);
            }
        }
        if let Some(url) = non_empty_env("HUMANLY_LLM_API_URL") {
            settings.api_url = url;
        }
        if let Some(model) = non_empty_env("HUMANLY_LLM_MODEL") {
            settings.model = model;
        }
        settings
    }

    pub fn completions_url(&self) -> String {
        chat_completions_url(&self.api_url)
    }
}

/// `{base}/chat/completions`, tolerating a trailing slash or a full endpoint URL.
pub fn chat_completions_url(base: &str) -> String {
    let base = base.trim().trim_end_matches('/');
    if base.ends_with("/chat/completions") {
        base.to_string()
    } else {
        format!("{}/chat/completions", base)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResult {
    pub content: String,
    pub latency_ms: i64,
}

/// Build the request body. A system prompt is only sent when non-empty.
fn build_chat_request(model: &str, system: &str, user: &str, max_tokens: u32, temperature: f64) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if !system.is_empty() {
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
    }
    messages.push(ChatMessage {
        role: "user".to_string(),
        content: user.to_string(),
    });

    ChatRequest {
        model: model.to_string(),
        messages,
        max_tokens,
        temperature,
    }
}

fn parse_chat_response(data: ChatResponse) -> Result<String, ProviderError> {
    data.choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or(ProviderError::MissingContent)
}

pub struct ProviderClient {
    client: Client,
    completions_url: String,
}

impl ProviderClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            completions_url: settings.completions_url(),
        })
    }

    pub fn completions_url(&self) -> &str {
        &self.completions_url
    }

    pub async fn call_chat(
        &self,
        model: &str,
        api_key: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<ChatResult, ProviderError> {
        let request = build_chat_request(model, system, user, max_tokens, temperature);

        let start = Instant::now();

        let response = self
            .client
            .post(&self.completions_url)
            .header("Authorization", format!("Bearer {}", api_key))
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

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::JsonError(e.to_string()))?;

        let content = parse_chat_response(data)?;

        Ok(ChatResult { content, latency_ms })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Get the LLM API key from the environment or the config file.
pub fn get_api_key() -> Option<String> {
    if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|name| non_empty_env(name)) {
        return Some(key);
    }

    let store = ConfigStore::new(ConfigStore::default_config_dir()?);
    store.get_api_key().ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            chat_completions_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://localhost:8080/v1/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_skips_empty_system_prompt() {
        let req = build_chat_request("m", "", "hello", 1000, 0.6);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_parse_chat_response() {
        let data: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"rewritten"}}]}"#).unwrap();
        assert_eq!(parse_chat_response(data).unwrap(), "rewritten");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(parse_chat_response(empty), Err(ProviderError::MissingContent)));
    }

    #[test]
    fn test_settings_from_config() {
        let cfg = LlmConfig {
            api_url: "http://localhost:9000/v1".to_string(),
            model: " local-model ".to_string(),
            timeout_secs: 5,
        };
        let settings = LlmSettings::resolve(Some(&cfg));
        if env::var("HUMANLY_LLM_MODEL").is_err() {
            assert_eq!(settings.model, "local-model");
        }
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }
}
