//! External collaborator seams.
//!
//! The pipeline talks to three collaborators through narrow traits:
//!
//! | Trait           | Default (null object) | Network implementation |
//! |-----------------|-----------------------|------------------------|
//! | [`Generator`]   | [`StubGenerator`]     | [`OpenAiGenerator`]    |
//! | [`Retriever`]   | [`NullRetriever`]     | [`HttpRetriever`]      |
//! | [`PromptBuilder`] | `DefaultPromptBuilder` (in `prompts`) | — |
//!
//! Timeouts and cancellation are applied by the callers, not here.

pub mod http_retriever;
pub mod mock;
pub mod openai;

pub use http_retriever::HttpRetriever;
pub use mock::{NullRetriever, StubGenerator};
pub use openai::OpenAiGenerator;

use std::sync::Arc;

use async_trait::async_trait;
use coordination::{
    EvidenceChunk, EvidencePack, LanguageLabel, RetrievalFilters, RouterDecision, Task,
    TokenUsage,
};
use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::errors::{GenerationError, RetrievalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// One call to the generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Completion returned by the generation collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(
        &self,
        query: &str,
        filters: &RetrievalFilters,
        top_k: usize,
    ) -> Result<Vec<EvidenceChunk>, RetrievalError>;
}

/// Inputs available when building the message list.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub task: &'a Task,
    pub language: LanguageLabel,
    pub decision: &'a RouterDecision,
    pub evidence: &'a EvidencePack,
}

/// Turns a task plus its context into a ready-to-send message list.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, ctx: &PromptContext<'_>) -> anyhow::Result<Vec<ChatMessage>>;

    /// Version tag recorded in run metadata.
    fn version(&self) -> &str;
}

/// Pick collaborators from configuration: HTTP clients when an endpoint is
/// configured, null objects otherwise.
pub fn from_config(config: &PipelineConfig) -> (Arc<dyn Generator>, Arc<dyn Retriever>) {
    let generator: Arc<dyn Generator> = match &config.generator.url {
        Some(url) => {
            tracing::info!(url = %url, "using OpenAI-compatible generator");
            Arc::new(OpenAiGenerator::new(url, config.generator.api_key.clone()))
        }
        None => {
            tracing::warn!("no generator endpoint configured; using stub generator");
            Arc::new(StubGenerator::default())
        }
    };
    let retriever: Arc<dyn Retriever> = match &config.retriever.url {
        Some(url) => {
            tracing::info!(url = %url, "using HTTP retriever");
            Arc::new(HttpRetriever::new(url))
        }
        None => {
            tracing::info!("no retriever endpoint configured; retrieval disabled");
            Arc::new(NullRetriever)
        }
    };
    (generator, retriever)
}
