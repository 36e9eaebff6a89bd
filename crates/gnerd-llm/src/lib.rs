// Claude-backed game descriptions: streaming client and prompt templates.

pub mod client;
pub mod prompt;

pub use client::{ClaudeClient, Completion, LlmClient, LlmDescriber, LlmSettings};
