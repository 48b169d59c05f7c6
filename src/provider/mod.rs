//! 模型调用模块：外部补全服务的抽象接口。
//!
//! # Completion Provider Module
//!
//! The completion endpoint is an external collaborator: it takes a
//! role-tagged message list plus generation parameters and returns text with
//! token-usage metadata. No retries happen here; failures go straight back
//! to the caller.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CompletionProvider`] | Async trait implemented by provider clients |
//! | [`HttpCompletionProvider`] | OpenAI-compatible `chat/completions` over HTTP |
//! | [`CompletionRequest`] / [`CompletionResponse`] | Call payloads |

mod http;

pub use http::HttpCompletionProvider;

use crate::types::Message;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32, temperature: f64) -> Self {
        Self {
            messages,
            max_tokens,
            temperature,
        }
    }
}

/// Provider-reported token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn total(total_tokens: u64) -> Self {
        Self {
            total_tokens,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
    fn name(&self) -> &'static str;
}
