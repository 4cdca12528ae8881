//! Chat message, sampling parameter, and usage types.

use serde::{Deserialize, Serialize};

/// Upper bound on completion length sent to the backend, regardless of
/// caller input.
pub const MAX_TOKENS_CAP: u32 = 256;

/// Allowed temperature range sent to the backend.
pub const TEMPERATURE_MIN: f32 = 0.0;
pub const TEMPERATURE_MAX: f32 = 0.5;

/// One chat turn, as required by the backend's wire contract. An ordered
/// sequence of these forms the full prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion request.
///
/// Callers may pass anything; [`SamplingParams::clamped`] enforces the
/// gateway's hard bounds before the values reach the backend. Out-of-range
/// input is silently clamped, not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    /// Create parameters from raw caller input.
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    /// Clamp to the bounds the backend is allowed to see:
    /// temperature within [0.0, 0.5], max_tokens at most 256.
    pub fn clamped(self) -> Self {
        Self {
            temperature: self.temperature.clamp(TEMPERATURE_MIN, TEMPERATURE_MAX),
            max_tokens: self.max_tokens.min(MAX_TOKENS_CAP),
        }
    }
}

/// Token usage reported by the backend.
///
/// Every field defaults to zero so a missing or partial usage object never
/// fails deserialization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,

    #[serde(default)]
    pub completion_tokens: u64,

    #[serde(default)]
    pub total_tokens: u64,
}

/// A completed generation: the first choice's content plus usage counts.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}
