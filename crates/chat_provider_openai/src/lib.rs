//! OpenAI chat-completions implementation of the shared `chat_provider` contract.
//!
//! The async `openai_api` stream runs on a dedicated thread with its own
//! current-thread runtime. Fragments cross back to the caller over a bounded
//! channel, so the returned `FragmentStream` is a plain blocking iterator.
//! Dropping the iterator flips the cancellation flag and the producer stops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chat_provider::{
    ChatProvider, ChatRequest, FragmentStream, ProviderError, ProviderInitError, ProviderProfile,
    ResponseFragment,
};
use openai_api::{
    CancellationSignal, ChatCompletionRequest, ChatStreamEvent, FunctionTool, OpenAiApiClient,
    OpenAiApiConfig, OpenAiApiError, RequestMessage, StreamOutcome,
};

/// Stable provider identifier used for startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

/// Model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "gpt-4o";

const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

/// Runtime configuration for the OpenAI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub model_id: String,
    pub base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_id: model_id.into(),
            base_url: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> OpenAiApiConfig {
        let mut config = OpenAiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait StreamClient: Send + Sync {
    fn stream_with_handler(
        &self,
        request: &ChatCompletionRequest,
        cancel: &CancellationSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<StreamOutcome, OpenAiApiError>;
}

#[derive(Debug)]
struct DefaultStreamClient {
    client: OpenAiApiClient,
}

impl StreamClient for DefaultStreamClient {
    fn stream_with_handler(
        &self,
        request: &ChatCompletionRequest,
        cancel: &CancellationSignal,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<StreamOutcome, OpenAiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OpenAiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(
            self.client
                .stream_with_handler(request, Some(cancel), |event| on_event(event)),
        )
    }
}

/// `ChatProvider` adapter backed by `openai_api` transport primitives.
pub struct OpenAiChatProvider {
    model_id: String,
    stream_client: Arc<dyn StreamClient>,
}

impl OpenAiChatProvider {
    /// Creates a provider using real OpenAI transport.
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderInitError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderInitError::new(
                "OPENAI_API_KEY is required for the openai provider",
            ));
        }

        let model_id = sanitize_model_id(&config.model_id);
        let stream_client = Arc::new(DefaultStreamClient {
            client: OpenAiApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self {
            model_id,
            stream_client,
        })
    }

    fn build_request(&self, req: ChatRequest) -> ChatCompletionRequest {
        let messages = req
            .messages
            .into_iter()
            .map(|message| RequestMessage::new(message.role.as_str(), message.content))
            .collect();
        let tools = req
            .tools
            .into_iter()
            .map(|tool| FunctionTool::new(tool.name, tool.description, tool.input_schema))
            .collect();

        ChatCompletionRequest::new(self.model_id.clone(), messages).with_tools(tools)
    }

    #[cfg(test)]
    fn with_stream_client_for_tests(model_id: &str, stream_client: Arc<dyn StreamClient>) -> Self {
        Self {
            model_id: sanitize_model_id(model_id),
            stream_client,
        }
    }
}

impl ChatProvider for OpenAiChatProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: OPENAI_PROVIDER_ID.to_string(),
            model_id: self.model_id.clone(),
        }
    }

    fn stream_chat(&self, req: ChatRequest) -> Result<FragmentStream, ProviderError> {
        let request = self.build_request(req);
        let cancel: CancellationSignal = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = mpsc::sync_channel(FRAGMENT_CHANNEL_CAPACITY);

        let stream_client = Arc::clone(&self.stream_client);
        let producer_cancel = Arc::clone(&cancel);
        thread::Builder::new()
            .name("navvy-openai-stream".to_string())
            .spawn(move || {
                produce_fragments(stream_client.as_ref(), &request, &producer_cancel, &sender);
            })
            .map_err(|error| {
                ProviderError::new(format!("failed to start OpenAI stream thread: {error}"))
            })?;

        Ok(Box::new(FragmentReceiver { receiver, cancel }))
    }
}

type FragmentItem = Result<ResponseFragment, ProviderError>;

/// Consumer half of the producer thread's channel.
struct FragmentReceiver {
    receiver: Receiver<FragmentItem>,
    cancel: CancellationSignal,
}

impl Iterator for FragmentReceiver {
    type Item = FragmentItem;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

impl Drop for FragmentReceiver {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Release);
    }
}

fn produce_fragments(
    stream_client: &dyn StreamClient,
    request: &ChatCompletionRequest,
    cancel: &CancellationSignal,
    sender: &SyncSender<FragmentItem>,
) {
    let result = stream_client.stream_with_handler(request, cancel, &mut |event| {
        if cancel.load(Ordering::Acquire) {
            return;
        }
        let Some(fragment) = fragment_from_event(event) else {
            return;
        };
        if sender.send(Ok(fragment)).is_err() {
            cancel.store(true, Ordering::Release);
        }
    });

    let failure = match result {
        Ok(outcome) if outcome.completed => None,
        Ok(outcome) => Some(ProviderError::new(match outcome.finish_reason {
            Some(reason) => format!("OpenAI stream ended before [DONE] (finish_reason: {reason})"),
            None => "OpenAI stream ended before [DONE]".to_string(),
        })),
        Err(OpenAiApiError::Cancelled) => None,
        Err(error) => Some(map_stream_error(error)),
    };

    if let Some(error) = failure {
        if cancel.load(Ordering::Acquire) {
            return;
        }
        tracing::debug!(error = %error, "OpenAI stream failed");
        let _ = sender.send(Err(error));
    }
}

fn fragment_from_event(event: ChatStreamEvent) -> Option<ResponseFragment> {
    match event {
        ChatStreamEvent::TextDelta { delta } if !delta.is_empty() => {
            Some(ResponseFragment::Text { text: delta })
        }
        ChatStreamEvent::ToolCallDelta {
            index,
            name,
            arguments,
            ..
        } if name.is_some() || arguments.is_some() => Some(ResponseFragment::ToolCall {
            index,
            name,
            arguments,
        }),
        _ => None,
    }
}

fn sanitize_model_id(model_id: &str) -> String {
    let trimmed = model_id.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL_ID.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_init_error(error: OpenAiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize openai provider: {error}"))
}

fn map_stream_error(error: OpenAiApiError) -> ProviderError {
    match error {
        OpenAiApiError::Status(status, message) => ProviderError::new(format!(
            "OpenAI request failed (HTTP {}): {message}",
            status.as_u16()
        )),
        error => ProviderError::new(format!("OpenAI request failed: {error}")),
    }
}
