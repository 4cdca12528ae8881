//! Generation backend integration for the Citegate gateway.
//!
//! This crate provides the chat message model, sampling parameter clamping,
//! and a client for OpenAI-chat-compatible completion backends. Streaming is
//! intentionally unsupported; the gateway expects one complete response per
//! request.
//!
//! # Example
//! ```no_run
//! use citegate_generation::{ChatMessage, Generator, OpenAiCompatClient, SamplingParams};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiCompatClient::new("http://localhost:8000")?;
//! let messages = vec![ChatMessage::user("What is Rust?")];
//! let params = SamplingParams::new(0.1, 200).clamped();
//! let completion = client.complete(&messages, "smollm2-135m", params).await?;
//! println!("{}", completion.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod types;

// Re-export main types
pub use client::{Generator, OpenAiCompatClient};
pub use types::{ChatMessage, Completion, SamplingParams, TokenUsage};
