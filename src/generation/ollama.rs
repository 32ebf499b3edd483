//! Ollama adapter — streams chat completions from a local Ollama instance.
//!
//! Speaks `/api/chat` with `stream: true`. Each NDJSON chunk carries either
//! reasoning text (`message.thinking`, when thinking mode is on) or answer
//! text (`message.content`); the adapter splices the end-of-reasoning
//! delimiter between the two so downstream extraction sees one contiguous
//! stream, matching the delimiter contract in [`crate::note::reasoning`].
//!
//! Fragments are coalesced on a fixed interval before delivery, so the
//! display surface is updated a few times per second rather than per token.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::config;

use super::{
    ChatMessage, GenerationError, GenerationService, GenerationUpdate, PerfStats, SamplingConfig,
};

/// Streaming chat client for a local Ollama instance.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
    /// Set once the model has been confirmed present (idempotent load).
    ready: OnceCell<()>,
    update_interval: Duration,
}

impl OllamaGenerator {
    /// Create a generator for `model` at `base_url`.
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            // No request timeout: a full generation step can run for minutes.
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            ready: OnceCell::new(),
            update_interval: config::UPDATE_INTERVAL,
        }
    }

    /// Generator for the default local instance, honoring `OLLAMA_HOST`.
    pub fn from_env(model: &str) -> Self {
        Self::new(&config::ollama_base_url(), model)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Confirm the model is present on the backend.
    ///
    /// Idempotent: the check runs once and the result is cached; later calls
    /// return immediately. A missing model is `GenerationError::ModelMissing`,
    /// which the binary treats as a fatal startup condition.
    pub async fn ensure_model(&self) -> Result<(), GenerationError> {
        self.ready
            .get_or_try_init(|| async {
                let models = self.list_models().await?;
                if models.iter().any(|m| m.starts_with(&self.model)) {
                    tracing::info!(model = %self.model, "Model confirmed on backend");
                    Ok(())
                } else {
                    Err(GenerationError::ModelMissing(self.model.clone()))
                }
            })
            .await
            .copied()
    }

    async fn list_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TagsResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;
        Ok(parsed.models.into_iter().map(|m| m.name).collect())
    }

    fn map_request_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_connect() {
            GenerationError::Connection(self.base_url.clone())
        } else {
            GenerationError::ResponseParsing(e.to_string())
        }
    }
}

// ── Wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    think: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    num_predict: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    eval_count: Option<u64>,
    eval_duration: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TaggedModel>,
}

#[derive(Deserialize)]
struct TaggedModel {
    name: String,
}

/// Tokens/second from the final chunk's eval counters (duration is ns).
fn perf_stats(eval_count: u64, eval_duration_ns: u64) -> Option<PerfStats> {
    if eval_duration_ns == 0 {
        return None;
    }
    Some(PerfStats {
        tokens_per_second: eval_count as f64 / (eval_duration_ns as f64 / 1e9),
        eval_tokens: eval_count,
    })
}

/// Buffers raw response bytes and yields complete NDJSON lines.
///
/// `bytes_stream` frames arrive at arbitrary byte offsets, so a multi-byte
/// UTF-8 character can straddle two frames. Decoding therefore happens per
/// complete line, never on a raw frame.
#[derive(Default)]
struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete line, including its newline. `None` until one arrives.
    fn next_line(&mut self) -> Option<Result<String, GenerationError>> {
        let newline = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=newline).collect();
        Some(
            String::from_utf8(line)
                .map_err(|e| GenerationError::ResponseParsing(e.to_string())),
        )
    }
}

/// Accumulates raw output and splices the reasoning delimiter between the
/// thinking stream and the answer stream.
#[derive(Default)]
struct FragmentAssembler {
    full: String,
    pending: String,
    saw_thinking: bool,
    delimiter_emitted: bool,
}

impl FragmentAssembler {
    fn push_chunk(&mut self, msg: &ChunkMessage) {
        if let Some(thinking) = msg.thinking.as_deref() {
            if !thinking.is_empty() {
                self.saw_thinking = true;
                self.push(thinking);
            }
        }
        if !msg.content.is_empty() {
            if self.saw_thinking && !self.delimiter_emitted {
                self.delimiter_emitted = true;
                self.push(config::THINK_DELIMITER);
                self.push("\n");
            }
            self.push(&msg.content);
        }
    }

    fn push(&mut self, text: &str) {
        self.full.push_str(text);
        self.pending.push_str(text);
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

#[async_trait]
impl GenerationService for OllamaGenerator {
    async fn generate(
        &self,
        chat: Vec<ChatMessage>,
        sampling: SamplingConfig,
        updates: mpsc::Sender<GenerationUpdate>,
        cancel: CancellationToken,
    ) -> Result<String, GenerationError> {
        self.ensure_model().await?;

        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: &chat,
            stream: true,
            think: sampling.enable_thinking,
            options: ChatOptions {
                num_predict: sampling.max_tokens,
                temperature: sampling.temperature,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut assembler = FragmentAssembler::default();
        let mut final_stats: Option<PerfStats> = None;
        let mut ticker = tokio::time::interval(self.update_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        'stream: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Generation cancelled mid-stream");
                    break 'stream;
                }
                _ = ticker.tick() => {
                    if let Some(fragment) = assembler.take_pending() {
                        let _ = updates
                            .send(GenerationUpdate { fragment: Some(fragment), stats: None })
                            .await;
                    }
                }
                bytes = stream.next() => {
                    let bytes = match bytes {
                        Some(Ok(bytes)) => bytes,
                        Some(Err(e)) => {
                            return Err(GenerationError::Connection(e.to_string()));
                        }
                        None => break 'stream,
                    };
                    lines.extend(&bytes);
                    while let Some(line) = lines.next_line() {
                        let line = line?;
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        let chunk: ChatChunk = serde_json::from_str(line)
                            .map_err(|e| GenerationError::ResponseParsing(e.to_string()))?;
                        if let Some(msg) = &chunk.message {
                            assembler.push_chunk(msg);
                        }
                        if chunk.done {
                            final_stats = chunk
                                .eval_count
                                .zip(chunk.eval_duration)
                                .and_then(|(count, dur)| perf_stats(count, dur));
                            break 'stream;
                        }
                    }
                }
            }
        }

        // Flush whatever the last coalescing window held, plus stats.
        let fragment = assembler.take_pending();
        if fragment.is_some() || final_stats.is_some() {
            let _ = updates
                .send(GenerationUpdate {
                    fragment,
                    stats: final_stats,
                })
                .await;
        }

        if let Some(stats) = final_stats {
            tracing::debug!(
                tokens_per_second = stats.tokens_per_second,
                eval_tokens = stats.eval_tokens,
                "Generation complete"
            );
        }

        Ok(assembler.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let gen = OllamaGenerator::new("http://localhost:11434/", "qwen3:1.7b");
        assert_eq!(gen.base_url(), "http://localhost:11434");
        assert_eq!(gen.model(), "qwen3:1.7b");
    }

    #[test]
    fn from_env_uses_default_port_when_unset() {
        // OLLAMA_HOST is not set in the test environment.
        if std::env::var("OLLAMA_HOST").is_err() {
            let gen = OllamaGenerator::from_env(config::DEFAULT_MODEL);
            assert_eq!(gen.base_url(), "http://localhost:11434");
        }
    }

    #[test]
    fn update_interval_override() {
        let gen = OllamaGenerator::new("http://localhost:11434", "qwen3:1.7b")
            .with_update_interval(Duration::from_millis(10));
        assert_eq!(gen.update_interval, Duration::from_millis(10));
    }

    #[test]
    fn chat_chunk_parses_content() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"S: The"},"done":false}"#)
                .unwrap();
        assert_eq!(chunk.message.unwrap().content, "S: The");
        assert!(!chunk.done);
    }

    #[test]
    fn chat_chunk_parses_thinking() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"message":{"role":"assistant","content":"","thinking":"Let me see."},"done":false}"#,
        )
        .unwrap();
        assert_eq!(chunk.message.unwrap().thinking.as_deref(), Some("Let me see."));
    }

    #[test]
    fn chat_chunk_parses_done_with_counters() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"done":true,"eval_count":120,"eval_duration":3000000000}"#,
        )
        .unwrap();
        assert!(chunk.done);
        let stats = perf_stats(chunk.eval_count.unwrap(), chunk.eval_duration.unwrap()).unwrap();
        assert!((stats.tokens_per_second - 40.0).abs() < 1e-9);
        assert_eq!(stats.eval_tokens, 120);
    }

    #[test]
    fn perf_stats_zero_duration_is_none() {
        assert!(perf_stats(100, 0).is_none());
    }

    #[test]
    fn line_buffer_decodes_multibyte_char_split_across_frames() {
        let json =
            r#"{"message":{"role":"assistant","content":"Temp +0.4°C, BMI 29.5 kg/m²"},"done":false}"#;
        let bytes = format!("{json}\n").into_bytes();
        // Frame boundary inside the two-byte encoding of '°'.
        let split = json.find('°').unwrap() + 1;

        let mut lines = LineBuffer::default();
        lines.extend(&bytes[..split]);
        assert!(lines.next_line().is_none());
        lines.extend(&bytes[split..]);

        let line = lines.next_line().unwrap().unwrap();
        assert!(!line.contains('\u{FFFD}'));
        let chunk: ChatChunk = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(chunk.message.unwrap().content, "Temp +0.4°C, BMI 29.5 kg/m²");
    }

    #[test]
    fn line_buffer_yields_lines_in_order_and_holds_partial_tail() {
        let mut lines = LineBuffer::default();
        lines.extend(b"{\"done\":false}\n{\"done\":true}\n{\"par");
        assert_eq!(lines.next_line().unwrap().unwrap().trim(), "{\"done\":false}");
        assert_eq!(lines.next_line().unwrap().unwrap().trim(), "{\"done\":true}");
        assert!(lines.next_line().is_none());
        lines.extend(b"tial\":1}\n");
        assert_eq!(lines.next_line().unwrap().unwrap().trim(), "{\"partial\":1}");
    }

    #[test]
    fn assembler_splices_delimiter_between_thinking_and_answer() {
        let mut assembler = FragmentAssembler::default();
        assembler.push_chunk(&ChunkMessage {
            content: String::new(),
            thinking: Some("Reasoning about the case.".into()),
        });
        assembler.push_chunk(&ChunkMessage {
            content: "S: Fatigue.".into(),
            thinking: None,
        });
        assert_eq!(
            assembler.full,
            "Reasoning about the case.</think>\nS: Fatigue."
        );
    }

    #[test]
    fn assembler_no_delimiter_without_thinking() {
        let mut assembler = FragmentAssembler::default();
        assembler.push_chunk(&ChunkMessage {
            content: "O: HR 75 bpm.".into(),
            thinking: None,
        });
        assert_eq!(assembler.full, "O: HR 75 bpm.");
        assert!(!assembler.full.contains(config::THINK_DELIMITER));
    }

    #[test]
    fn assembler_emits_delimiter_once() {
        let mut assembler = FragmentAssembler::default();
        assembler.push_chunk(&ChunkMessage {
            content: String::new(),
            thinking: Some("hmm".into()),
        });
        assembler.push_chunk(&ChunkMessage {
            content: "part one ".into(),
            thinking: None,
        });
        assembler.push_chunk(&ChunkMessage {
            content: "part two".into(),
            thinking: None,
        });
        assert_eq!(
            assembler.full.matches(config::THINK_DELIMITER).count(),
            1
        );
    }

    #[test]
    fn assembler_pending_drains() {
        let mut assembler = FragmentAssembler::default();
        assembler.push_chunk(&ChunkMessage {
            content: "abc".into(),
            thinking: None,
        });
        assert_eq!(assembler.take_pending().as_deref(), Some("abc"));
        assert!(assembler.take_pending().is_none());
        // Full output unaffected by draining.
        assert_eq!(assembler.full, "abc");
    }

    #[test]
    fn chat_request_serializes_options() {
        let messages = vec![ChatMessage::user("hi")];
        let req = ChatRequest {
            model: "qwen3:1.7b",
            messages: &messages,
            stream: true,
            think: false,
            options: ChatOptions {
                num_predict: 1000,
                temperature: 0.6,
            },
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"num_predict\":1000"));
        assert!(json.contains("\"think\":false"));
        assert!(json.contains("\"stream\":true"));
    }
}
