//! Transport-only OpenAI chat-completions client primitives.
//!
//! This crate owns request building, HTTP error mapping, and SSE parsing for the
//! `/chat/completions` streaming endpoint. It contains no credential discovery
//! and no knowledge of what the host does with streamed tool calls.
//!
//! SSE normalization splits each `chat.completion.chunk` into text deltas,
//! per-index tool-call deltas, and finish markers, preserving arrival order.

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::{CancellationSignal, OpenAiApiClient, StreamOutcome, StreamResult};
pub use config::OpenAiApiConfig;
pub use error::OpenAiApiError;
pub use events::ChatStreamEvent;
pub use payload::{ChatCompletionRequest, FunctionDefinition, FunctionTool, RequestMessage};
pub use sse::SseStreamParser;
pub use url::normalize_chat_completions_url;
