//! Minimal provider-agnostic contract for streaming a single chat completion.
//!
//! This crate defines only the message history sent to a model, the host tool
//! definitions advertised alongside it, and the fragments streamed back. It
//! excludes transport details and everything the host does with a response
//! once its fragments are delivered.

use std::fmt;

use serde_json::Value;

/// Error returned while constructing/configuring a provider before any request starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Error raised by a provider while opening or consuming a response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<String> for ProviderError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name shared by chat-completion style APIs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One role-tagged entry of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Generic host-mediated tool definition advertised to a model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Input required to open one response stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// Incremental piece of a streamed model response.
///
/// Tool calls arrive split across many fragments that share one `index`; the
/// name usually arrives once and `arguments` carries consecutive slices of a
/// JSON document that only parses once every slice has been concatenated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFragment {
    Text {
        text: String,
    },
    ToolCall {
        index: usize,
        name: Option<String>,
        arguments: Option<String>,
    },
}

impl ResponseFragment {
    /// Constructs a text delta.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Constructs a tool-call fragment carrying only the call name.
    #[must_use]
    pub fn tool_name(index: usize, name: impl Into<String>) -> Self {
        Self::ToolCall {
            index,
            name: Some(name.into()),
            arguments: None,
        }
    }

    /// Constructs a tool-call fragment carrying only an arguments slice.
    #[must_use]
    pub fn tool_arguments(index: usize, arguments: impl Into<String>) -> Self {
        Self::ToolCall {
            index,
            name: None,
            arguments: Some(arguments.into()),
        }
    }

    /// Returns true for text deltas.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }
}

/// Forward-only stream of fragments for one response.
///
/// The stream ends when the provider has delivered the whole response. An
/// `Err` item is terminal; providers do not yield further items after it.
pub type FragmentStream = Box<dyn Iterator<Item = Result<ResponseFragment, ProviderError>> + Send>;

/// Immutable metadata describing a chat provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for streaming one chat completion.
pub trait ChatProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Sends `req` and returns the response as a lazily consumed fragment stream.
    ///
    /// Fragments are yielded strictly in the order the provider received them.
    fn stream_chat(&self, req: ChatRequest) -> Result<FragmentStream, ProviderError>;
}
