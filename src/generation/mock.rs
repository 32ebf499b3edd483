//! Scripted generation service for tests — returns configurable responses,
//! records submitted transcripts, and can fail or stall on demand.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{
    ChatMessage, GenerationError, GenerationService, GenerationUpdate, PerfStats, SamplingConfig,
};

/// One scripted step: a canned raw output or an error message.
pub enum ScriptedStep {
    Respond(String),
    Fail(String),
}

/// Mock generation service driven by a per-call script.
///
/// Each `generate` call pops the next scripted step and records the chat
/// transcript it was given. Responses are streamed as two fragments so
/// consumers exercise their update paths. An optional delay makes the call
/// hold long enough for busy/cancellation tests; delayed calls still react
/// to cancellation immediately.
pub struct MockGenerationService {
    script: Mutex<VecDeque<ScriptedStep>>,
    recorded: Mutex<Vec<Vec<ChatMessage>>>,
    delay: Option<Duration>,
}

impl MockGenerationService {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            script: Mutex::new(
                responses
                    .into_iter()
                    .map(|r| ScriptedStep::Respond(r.into()))
                    .collect(),
            ),
            recorded: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn from_script(script: impl IntoIterator<Item = ScriptedStep>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            recorded: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Hold each call for `delay` before responding.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Chat transcripts submitted so far, in call order.
    pub fn recorded_transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.recorded.lock().unwrap().clone()
    }

    /// Number of `generate` calls made.
    pub fn call_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(
        &self,
        chat: Vec<ChatMessage>,
        _sampling: SamplingConfig,
        updates: mpsc::Sender<GenerationUpdate>,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError> {
        self.recorded.lock().unwrap().push(chat);

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {}
            }
        }
        if cancel.is_cancelled() {
            return Ok(String::new());
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ScriptedStep::Fail("script exhausted".into()));

        match step {
            ScriptedStep::Respond(response) => {
                // Stream in two halves so consumers see multiple updates.
                let mid = response.len() / 2;
                let mid = (0..=mid)
                    .rev()
                    .find(|i| response.is_char_boundary(*i))
                    .unwrap_or(0);
                for part in [&response[..mid], &response[mid..]] {
                    if !part.is_empty() {
                        let _ = updates
                            .send(GenerationUpdate {
                                fragment: Some(part.to_string()),
                                stats: None,
                            })
                            .await;
                    }
                }
                let _ = updates
                    .send(GenerationUpdate {
                        fragment: None,
                        stats: Some(PerfStats {
                            tokens_per_second: 42.0,
                            eval_tokens: response.len() as u64,
                        }),
                    })
                    .await;
                Ok(response)
            }
            ScriptedStep::Fail(message) => Err(GenerationError::Http {
                status: 500,
                body: message,
            }),
        }
    }
}
