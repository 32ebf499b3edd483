//! Generation service boundary — the external collaborator that turns a
//! chat transcript into streamed text.
//!
//! The crate never runs inference itself. A [`GenerationService`] receives a
//! role-tagged transcript plus sampling options, streams coalesced updates
//! (text fragments and periodic performance stats) back over a channel, and
//! returns the full raw output when generation completes or is cancelled.

pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config;

/// Message role in a chat transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message submitted to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Options controlling a single generation.
#[derive(Debug, Clone)]
pub struct SamplingConfig {
    /// Cap on generated output length.
    pub max_tokens: u32,
    /// Sampling randomness.
    pub temperature: f32,
    /// Whether the model emits visible reasoning before the delimited
    /// final answer.
    pub enable_thinking: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: config::DEFAULT_MAX_TOKENS,
            temperature: config::DEFAULT_TEMPERATURE,
            enable_thinking: true,
        }
    }
}

/// Generation throughput reported by the service at completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfStats {
    pub tokens_per_second: f64,
    pub eval_tokens: u64,
}

/// One coalesced delivery from the service: a batch of generated text
/// and/or performance stats. Fragments arrive in generation order.
#[derive(Debug, Clone, Default)]
pub struct GenerationUpdate {
    pub fragment: Option<String>,
    pub stats: Option<PerfStats>,
}

/// Errors from the generation service.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Required model is not present on the backend. Fatal at startup.
    #[error("model '{0}' is not available on the local instance")]
    ModelMissing(String),

    #[error("cannot reach generation backend at {0}")]
    Connection(String),

    #[error("backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed response from backend: {0}")]
    ResponseParsing(String),

    #[error("generation task failed: {0}")]
    Task(String),
}

/// An external service that streams generated text for a chat transcript.
///
/// Implementations deliver coalesced [`GenerationUpdate`]s through
/// `updates` at a bounded rate and return the full raw output. Cancellation
/// is cooperative: the token is checked at fragment granularity, and a
/// cancelled generation returns whatever was produced so far as `Ok`.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(
        &self,
        chat: Vec<ChatMessage>,
        sampling: SamplingConfig,
        updates: mpsc::Sender<GenerationUpdate>,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_defaults() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.max_tokens, 1000);
        assert!((sampling.temperature - 0.6).abs() < f32::EPSILON);
        assert!(sampling.enable_thinking);
    }

    #[test]
    fn chat_message_roles_serialize_lowercase() {
        let msg = ChatMessage::system("You are a helpful clinician assistant");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"system\""));

        let msg = ChatMessage::user("prompt");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn update_default_is_empty() {
        let update = GenerationUpdate::default();
        assert!(update.fragment.is_none());
        assert!(update.stats.is_none());
    }
}
