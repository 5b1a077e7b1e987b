use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stream event emitted by the parser after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// Assistant text delta from `choices[0].delta.content`.
    TextDelta { delta: String },
    /// One entry of `choices[0].delta.tool_calls`.
    ToolCallDelta {
        index: usize,
        id: Option<String>,
        name: Option<String>,
        arguments: Option<String>,
    },
    /// `finish_reason` reported for the choice.
    Finished { reason: String },
    /// `data: [DONE]` sentinel.
    Done,
    /// In-band error object sent instead of a chunk.
    Error {
        code: Option<String>,
        message: Option<String>,
    },
}

impl ChatStreamEvent {
    /// Returns true when no further events should be read after this one.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    pub error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ChunkToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkToolCall {
    pub index: usize,
    pub id: Option<String>,
    pub function: Option<ChunkFunction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChunkError {
    pub message: Option<String>,
    pub code: Option<Value>,
}

impl ChatCompletionChunk {
    /// Flattens one chunk into events, keeping the first choice only.
    pub(crate) fn into_events(self) -> Vec<ChatStreamEvent> {
        if let Some(error) = self.error {
            let code = error.code.and_then(|code| match code {
                Value::String(code) => Some(code),
                Value::Null => None,
                other => Some(other.to_string()),
            });
            return vec![ChatStreamEvent::Error {
                code,
                message: error.message,
            }];
        }

        let mut events = Vec::new();
        for choice in self.choices.into_iter().filter(|choice| choice.index == 0) {
            let delta = choice.delta.unwrap_or_default();

            if let Some(content) = delta.content.filter(|content| !content.is_empty()) {
                events.push(ChatStreamEvent::TextDelta { delta: content });
            }

            for call in delta.tool_calls.unwrap_or_default() {
                let (name, arguments) = match call.function {
                    Some(function) => (function.name, function.arguments),
                    None => (None, None),
                };
                events.push(ChatStreamEvent::ToolCallDelta {
                    index: call.index,
                    id: call.id,
                    name,
                    arguments,
                });
            }

            if let Some(reason) = choice.finish_reason {
                events.push(ChatStreamEvent::Finished { reason });
            }
        }

        events
    }
}
