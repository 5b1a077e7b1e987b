//! Turns a streamed model response into output text and committed mutations.
//!
//! Text fragments are forwarded as they arrive. Tool-call fragments are
//! folded per call index and only executed once the stream has ended, one
//! commit per call in ascending index order.

use std::collections::BTreeMap;
use std::vec;

use chat_provider::{FragmentStream, ResponseFragment};
use project_repo::{CommitInfo, ProjectRepo, RepoError};

use crate::error::NavvyError;
use crate::tools::ToolInvocation;

/// Tool call assembled from fragments sharing one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub index: usize,
    pub name: Option<String>,
    pub arguments: String,
}

impl PendingToolCall {
    fn new(index: usize) -> Self {
        Self {
            index,
            name: None,
            arguments: String::new(),
        }
    }
}

/// Folds tool-call fragments by index; indices may be sparse and arrive in any order.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: BTreeMap<usize, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn push(&mut self, index: usize, name: Option<String>, arguments: Option<String>) {
        let call = self
            .calls
            .entry(index)
            .or_insert_with(|| PendingToolCall::new(index));

        if let Some(name) = name.filter(|name| !name.is_empty()) {
            call.name = Some(name);
        }
        if let Some(arguments) = arguments {
            call.arguments.push_str(&arguments);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Drains every call in ascending index order.
    #[must_use]
    pub fn finish(self) -> Vec<PendingToolCall> {
        self.calls.into_values().collect()
    }
}

/// Applies decoded mutations to the project.
pub trait MutationExecutor {
    fn write_file(&self, path: &str, content: &str, message: &str)
        -> Result<CommitInfo, RepoError>;

    fn delete_file(&self, path: &str, message: &str) -> Result<CommitInfo, RepoError>;
}

impl MutationExecutor for ProjectRepo {
    fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitInfo, RepoError> {
        ProjectRepo::write_file(self, path, content, message)
    }

    fn delete_file(&self, path: &str, message: &str) -> Result<CommitInfo, RepoError> {
        ProjectRepo::delete_file(self, path, message)
    }
}

enum Phase {
    Streaming(FragmentStream),
    Finalizing(vec::IntoIter<PendingToolCall>),
    Done,
}

/// Lazy output of one turn.
///
/// Yields model text while streaming, then one confirmation line per applied
/// tool call. A malformed call yields `Err` and the turn moves on to the next
/// call; a provider or repository error is the last item.
pub struct Turn<'a> {
    executor: &'a dyn MutationExecutor,
    phase: Phase,
    accumulator: ToolCallAccumulator,
}

impl<'a> Turn<'a> {
    pub fn new(fragments: FragmentStream, executor: &'a dyn MutationExecutor) -> Self {
        Self {
            executor,
            phase: Phase::Streaming(fragments),
            accumulator: ToolCallAccumulator::default(),
        }
    }

    /// Returns true once the turn has nothing more to yield.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    fn apply_call(&self, call: PendingToolCall) -> Result<String, NavvyError> {
        let invocation = ToolInvocation::parse(call.name.as_deref(), &call.arguments)
            .map_err(|source| {
                tracing::warn!(index = call.index, error = %source, "skipping invalid tool call");
                NavvyError::InvalidToolCall {
                    index: call.index,
                    source,
                }
            })?;

        let commit = match &invocation {
            ToolInvocation::WriteFile(args) => {
                self.executor
                    .write_file(&args.file_path, &args.file_content, &args.commit_message)?
            }
            ToolInvocation::DeleteFile(args) => self
                .executor
                .delete_file(&args.file_path, &args.commit_message)?,
        };
        tracing::info!(
            index = call.index,
            path = invocation.file_path(),
            commit = %commit.id,
            "applied tool call"
        );

        Ok(invocation.confirmation())
    }
}

impl Iterator for Turn<'_> {
    type Item = Result<String, NavvyError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.phase {
                Phase::Streaming(fragments) => match fragments.next() {
                    Some(Ok(ResponseFragment::Text { text })) => {
                        if !text.is_empty() {
                            return Some(Ok(text));
                        }
                    }
                    Some(Ok(ResponseFragment::ToolCall {
                        index,
                        name,
                        arguments,
                    })) => self.accumulator.push(index, name, arguments),
                    Some(Err(error)) => {
                        self.phase = Phase::Done;
                        return Some(Err(NavvyError::Provider(error)));
                    }
                    None => {
                        let calls = std::mem::take(&mut self.accumulator).finish();
                        tracing::debug!(calls = calls.len(), "response stream finished");
                        self.phase = Phase::Finalizing(calls.into_iter());
                    }
                },
                Phase::Finalizing(calls) => {
                    let Some(call) = calls.next() else {
                        self.phase = Phase::Done;
                        continue;
                    };

                    let result = self.apply_call(call);
                    if matches!(&result, Err(error) if error.is_fatal()) {
                        self.phase = Phase::Done;
                    }
                    return Some(result);
                }
                Phase::Done => return None,
            }
        }
    }
}
