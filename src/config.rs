use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "SoapDraft";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default Qwen3 model tag on the local Ollama instance.
pub const DEFAULT_MODEL: &str = "qwen3:1.7b";

/// Default local Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default output-length cap for a single generation step.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

/// Coalescing window for streamed fragments — the display surface is
/// re-rendered at most once per window, not per token.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Marker separating the model's visible reasoning from its final answer.
pub const THINK_DELIMITER: &str = "</think>";

/// Ollama base URL, overridable via `OLLAMA_HOST`.
pub fn ollama_base_url() -> String {
    std::env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn defaults_match_generation_contract() {
        assert_eq!(DEFAULT_MAX_TOKENS, 1000);
        assert!((DEFAULT_TEMPERATURE - 0.6).abs() < f32::EPSILON);
        assert_eq!(UPDATE_INTERVAL, Duration::from_millis(250));
    }

    #[test]
    fn default_filter_targets_this_crate() {
        assert_eq!(default_log_filter(), "soapdraft=info");
    }
}
