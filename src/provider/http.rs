use super::{CompletionProvider, CompletionRequest, CompletionResponse, TokenUsage};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use keyring::Entry;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// OpenAI-compatible chat completion client.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    endpoint: Url,
    model: Option<String>,
    api_key: Option<String>,
}

impl HttpCompletionProvider {
    /// Client posting to `endpoint` verbatim (e.g. a proxy route such as `/api/openai`).
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid completion endpoint: {}", e),
                ErrorContext::new()
                    .with_field_path("endpoint")
                    .with_details(endpoint.to_string())
                    .with_source("http_provider"),
            )
        })?;

        let timeout_secs = env::var("AI_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model: None,
            api_key: None,
        })
    }

    /// Client for `<base_url>/chat/completions`.
    pub fn openai_compatible(base_url: &str) -> Result<Self> {
        Self::new(&format!("{}/chat/completions", base_url.trim_end_matches('/')))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Resolve the API key from the OS keyring, then `<PROVIDER>_API_KEY`.
    pub fn with_api_key_from(mut self, provider_id: &str) -> Self {
        self.api_key = Self::get_api_key(provider_id);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn get_api_key(provider_id: &str) -> Option<String> {
        if let Ok(entry) = Entry::new("ai-response-cache", provider_id) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }
        let env_var = format!("{}_API_KEY", provider_id.to_uppercase());
        env::var(env_var).ok()
    }

    fn body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if let Some(model) = &self.model {
            body["model"] = serde_json::Value::String(model.clone());
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn remote_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(512).collect())
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let mut req = self
            .client
            .post(self.endpoint.clone())
            .json(&self.body(request));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                message: remote_error_message(&text),
            });
        }

        let parsed: ChatCompletion = serde_json::from_str(&text)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| {
                Error::InvalidResponse("invalid response from completion provider".into())
            })?;
        let usage = parsed.usage.unwrap_or_default();
        debug!(
            endpoint = %self.endpoint,
            total_tokens = usage.total_tokens,
            "completion received"
        );
        Ok(CompletionResponse { content, usage })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
