//! OpenAI-compatible LLM client for the campaign workflow.
//!
//! Implements [`tarweej_core::LlmClient`] over the chat completions API,
//! including strict json_schema structured outputs.

pub mod client;
pub mod types;

pub use client::OpenAiChatClient;
