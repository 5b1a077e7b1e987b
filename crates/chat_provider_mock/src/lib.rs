//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing. Responses are scripted
//! as fragment sequences and replayed in FIFO order, one per request.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use chat_provider::{
    ChatProvider, ChatRequest, FragmentStream, ProviderError, ProviderProfile, ResponseFragment,
};
use serde_json::Value;

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

const DEFAULT_ARGUMENT_SLICE_LEN: usize = 7;

/// One scripted response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockResponse {
    fragments: Vec<ResponseFragment>,
    next_tool_index: usize,
    failure: Option<String>,
    rejection: Option<String>,
}

impl MockResponse {
    /// Creates a response replaying `fragments` verbatim.
    #[must_use]
    pub fn new(fragments: Vec<ResponseFragment>) -> Self {
        let next_tool_index = fragments
            .iter()
            .filter_map(|fragment| match fragment {
                ResponseFragment::ToolCall { index, .. } => Some(index + 1),
                ResponseFragment::Text { .. } => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            fragments,
            next_tool_index,
            failure: None,
            rejection: None,
        }
    }

    /// Creates a text-only response streamed word by word.
    #[must_use]
    pub fn text(text: &str) -> Self {
        Self::new(Vec::new()).with_text(text)
    }

    /// Creates a response whose request is rejected before any fragment is streamed.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            rejection: Some(message.into()),
            ..Self::default()
        }
    }

    /// Appends text deltas split after every space and newline.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        let mut pending_token = String::new();
        for ch in text.chars() {
            pending_token.push(ch);
            if matches!(ch, ' ' | '\n') {
                self.fragments
                    .push(ResponseFragment::text(std::mem::take(&mut pending_token)));
            }
        }

        if !pending_token.is_empty() {
            self.fragments.push(ResponseFragment::text(pending_token));
        }

        self
    }

    /// Appends a tool call at the next free index, with its serialized
    /// arguments split into small slices the way streaming APIs deliver them.
    #[must_use]
    pub fn with_tool_call(self, name: &str, arguments: &Value) -> Self {
        self.with_raw_tool_call(name, &arguments.to_string())
    }

    /// Appends a tool call whose arguments are an arbitrary (possibly invalid) string.
    #[must_use]
    pub fn with_raw_tool_call(mut self, name: &str, arguments: &str) -> Self {
        let index = self.next_tool_index;
        self.next_tool_index += 1;

        self.fragments.push(ResponseFragment::tool_name(index, name));
        for slice in split_into_slices(arguments, DEFAULT_ARGUMENT_SLICE_LEN) {
            self.fragments
                .push(ResponseFragment::tool_arguments(index, slice));
        }

        self
    }

    /// Ends the stream with a provider error after all scripted fragments.
    #[must_use]
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns the scripted fragments.
    #[must_use]
    pub fn fragments(&self) -> &[ResponseFragment] {
        &self.fragments
    }

    fn into_stream(self) -> Result<FragmentStream, ProviderError> {
        if let Some(message) = self.rejection {
            return Err(ProviderError::new(message));
        }

        let failure: Option<Result<ResponseFragment, ProviderError>> =
            self.failure.map(|message| Err(ProviderError::new(message)));
        Ok(Box::new(
            self.fragments.into_iter().map(Ok).chain(failure),
        ))
    }
}

/// Deterministic mock provider used by `navvy` tests and offline runs.
#[derive(Debug)]
pub struct MockProvider {
    model_id: String,
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: MockResponse,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Creates a mock provider that replays `responses` in order.
    #[must_use]
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            model_id: "mock".to_string(),
            responses: Mutex::new(responses.into()),
            fallback: Self::offline_response(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues another scripted response.
    pub fn push_response(&self, response: MockResponse) {
        lock_unpoisoned(&self.responses).push_back(response);
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining_responses(&self) -> usize {
        lock_unpoisoned(&self.responses).len()
    }

    fn offline_response() -> MockResponse {
        MockResponse::text(
            "Mock provider active: no model is attached, so no files will change.\n\
             Set NAVVY_PROVIDER=openai and OPENAI_API_KEY to chat with a real model.\n",
        )
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn stream_chat(&self, req: ChatRequest) -> Result<FragmentStream, ProviderError> {
        lock_unpoisoned(&self.requests).push(req);

        let response = lock_unpoisoned(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        response.into_stream()
    }
}

fn split_into_slices(value: &str, slice_len: usize) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    chars
        .chunks(slice_len.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use chat_provider::ChatMessage;
    use serde_json::json;

    use super::*;

    fn request(text: &str) -> ChatRequest {
        ChatRequest {
            messages: vec![ChatMessage::user(text)],
            tools: Vec::new(),
        }
    }

    fn collect(provider: &MockProvider, text: &str) -> Vec<Result<ResponseFragment, ProviderError>> {
        provider
            .stream_chat(request(text))
            .expect("mock stream should open")
            .collect()
    }

    #[test]
    fn profile_exposes_explicit_mock_provider_identity() {
        let profile = MockProvider::default().profile();

        assert_eq!(profile.provider_id, MOCK_PROVIDER_ID);
        assert_eq!(profile.model_id, "mock");
    }

    #[test]
    fn text_responses_split_on_whitespace_without_losing_characters() {
        let response = MockResponse::text("one two\nthree");
        let joined: String = response
            .fragments()
            .iter()
            .map(|fragment| match fragment {
                ResponseFragment::Text { text } => text.as_str(),
                ResponseFragment::ToolCall { .. } => panic!("unexpected tool fragment"),
            })
            .collect();

        assert_eq!(response.fragments().len(), 3);
        assert_eq!(joined, "one two\nthree");
    }

    #[test]
    fn tool_calls_take_consecutive_indices_and_fragment_arguments() {
        let response = MockResponse::text("ok")
            .with_tool_call("edit_file", &json!({ "file_path": "a.txt" }))
            .with_tool_call("delete_file", &json!({ "file_path": "b.txt" }));

        let mut arguments = [String::new(), String::new()];
        let mut names = Vec::new();
        for fragment in response.fragments() {
            if let ResponseFragment::ToolCall {
                index,
                name,
                arguments: slice,
            } = fragment
            {
                if let Some(name) = name {
                    names.push((*index, name.clone()));
                }
                if let Some(slice) = slice {
                    arguments[*index].push_str(slice);
                }
            }
        }

        assert_eq!(
            names,
            vec![(0, "edit_file".to_string()), (1, "delete_file".to_string())]
        );
        assert_eq!(arguments[0], r#"{"file_path":"a.txt"}"#);
        assert_eq!(arguments[1], r#"{"file_path":"b.txt"}"#);
    }

    #[test]
    fn responses_replay_in_fifo_order_then_fall_back_to_offline_text() {
        let provider = MockProvider::new(vec![MockResponse::text("first")]);
        provider.push_response(MockResponse::text("second"));

        assert_eq!(collect(&provider, "a"), vec![Ok(ResponseFragment::text("first"))]);
        assert_eq!(collect(&provider, "b"), vec![Ok(ResponseFragment::text("second"))]);
        assert_eq!(provider.remaining_responses(), 0);

        let fallback = collect(&provider, "c");
        assert!(fallback
            .iter()
            .all(|item| matches!(item, Ok(ResponseFragment::Text { .. }))));
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.requests()[1].messages[0].content, "b");
    }

    #[test]
    fn failing_response_ends_with_provider_error() {
        let provider = MockProvider::new(vec![MockResponse::text("partial").failing_with("reset")]);

        let items = collect(&provider, "go");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok(ResponseFragment::text("partial")));
        assert_eq!(items[1], Err(ProviderError::new("reset")));
    }

    #[test]
    fn rejected_response_fails_before_streaming() {
        let provider = MockProvider::new(vec![MockResponse::rejected("401 unauthorized")]);

        let error = match provider.stream_chat(request("go")) {
            Ok(_) => panic!("rejected responses should not open a stream"),
            Err(error) => error,
        };
        assert_eq!(error.message(), "401 unauthorized");
    }

    #[test]
    fn explicit_fragments_continue_tool_indices_after_the_highest_seen() {
        let response = MockResponse::new(vec![ResponseFragment::tool_name(3, "edit_file")])
            .with_raw_tool_call("delete_file", "{}");

        assert!(response.fragments().iter().any(|fragment| matches!(
            fragment,
            ResponseFragment::ToolCall { index: 4, name: Some(name), .. } if name == "delete_file"
        )));
    }
}
