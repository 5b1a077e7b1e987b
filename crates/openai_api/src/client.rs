use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};

use crate::config::OpenAiApiConfig;
use crate::error::{parse_error_message, OpenAiApiError};
use crate::events::ChatStreamEvent;
use crate::headers::build_headers;
use crate::payload::ChatCompletionRequest;
use crate::sse::SseStreamParser;
use crate::url::normalize_chat_completions_url;

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct OpenAiApiClient {
    http: Client,
    config: OpenAiApiConfig,
}

/// How a stream ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Last `finish_reason` reported by the server, if any.
    pub finish_reason: Option<String>,
    /// True once the `[DONE]` sentinel was received.
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<ChatStreamEvent>,
    pub outcome: StreamOutcome,
}

impl OpenAiApiClient {
    pub fn new(config: OpenAiApiConfig) -> Result<Self, OpenAiApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(OpenAiApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_chat_completions_url(&self.config.base_url)
    }

    pub fn build_headers(&self, user_agent: Option<&str>) -> Result<HeaderMap, OpenAiApiError> {
        let headers = build_headers(&self.config, user_agent)?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| OpenAiApiError::InvalidHeader(format!("invalid key: {key}")))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| OpenAiApiError::InvalidHeader(format!("invalid value for {key}")))?,
            );
        }
        Ok(out)
    }

    pub fn build_request(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::RequestBuilder, OpenAiApiError> {
        let headers = self.build_headers(self.config.user_agent.as_deref())?;
        let mut payload = request.clone();
        payload.stream = true;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&payload))
    }

    /// Sends `request` once; non-success statuses are mapped to `Status`.
    pub async fn send(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, OpenAiApiError> {
        if is_cancelled(cancellation) {
            return Err(OpenAiApiError::Cancelled);
        }

        let response = self.build_request(request)?.send();
        let response = await_or_cancel(response, cancellation)
            .await?
            .map_err(OpenAiApiError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = await_or_cancel(response.text(), cancellation)
            .await?
            .unwrap_or_default();
        Err(OpenAiApiError::Status(
            status,
            parse_error_message(status, &body),
        ))
    }

    pub async fn stream_with_handler<F>(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<StreamOutcome, OpenAiApiError>
    where
        F: FnMut(ChatStreamEvent),
    {
        let response = self.send(request, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();
        let mut outcome = StreamOutcome::default();

        'read: loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(OpenAiApiError::Cancelled);
            }
            let chunk = chunk.map_err(OpenAiApiError::from)?;
            for event in parser.feed(&chunk) {
                let terminal = event.is_terminal();
                process_stream_event(event, &mut outcome, &mut on_event)?;
                if terminal {
                    break 'read;
                }
            }
        }

        if is_cancelled(cancellation) {
            return Err(OpenAiApiError::Cancelled);
        }

        Ok(outcome)
    }

    pub async fn stream(
        &self,
        request: &ChatCompletionRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, OpenAiApiError> {
        let mut events = Vec::new();
        let outcome = self
            .stream_with_handler(request, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, outcome })
    }
}

fn process_stream_event<F>(
    event: ChatStreamEvent,
    outcome: &mut StreamOutcome,
    on_event: &mut F,
) -> Result<(), OpenAiApiError>
where
    F: FnMut(ChatStreamEvent),
{
    match &event {
        ChatStreamEvent::Error { code, message } => {
            return Err(OpenAiApiError::StreamFailed {
                code: code.clone(),
                message: message
                    .clone()
                    .or_else(|| code.clone())
                    .unwrap_or_else(|| "chat completion failed".to_owned()),
            });
        }
        ChatStreamEvent::Finished { reason } => outcome.finish_reason = Some(reason.clone()),
        ChatStreamEvent::Done => outcome.completed = true,
        ChatStreamEvent::TextDelta { .. } | ChatStreamEvent::ToolCallDelta { .. } => {}
    }

    on_event(event);
    Ok(())
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, OpenAiApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(OpenAiApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(OpenAiApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
