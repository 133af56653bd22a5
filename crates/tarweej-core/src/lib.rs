//! Core campaign workflow engine.
//!
//! Models the conversational marketing-campaign agent as a fixed graph of
//! LLM-driven stages over a shared [`state::WorkflowState`]. Storage and
//! delivery backends plug in through the traits in [`traits`]; the LLM
//! through [`llm::LlmClient`].

pub mod builtin;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod llm;
pub mod message;
pub mod nodes;
pub mod prompts;
pub mod records;
pub mod state;
pub mod tool_types;
pub mod tools;
pub mod traits;

pub use error::{Result, WorkflowError};
pub use graph::{CampaignGraph, NodeId, Transition, DEFAULT_MAX_TOOL_ITERATIONS};
pub use llm::{ChatOptions, ChatResponse, LlmClient};
pub use message::{Message, MessageContent, MessageRole};
pub use state::{Route, StateUpdate, WorkflowState};
pub use tools::{Tool, ToolExecutionResult, ToolRegistry};
