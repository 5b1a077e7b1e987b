use chat_provider::{ProviderError, ProviderInitError};
use project_repo::RepoError;
use thiserror::Error;

use crate::tools::ToolParseError;

#[derive(Debug, Error)]
pub enum NavvyError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("model stream failed: {0}")]
    Provider(#[source] ProviderError),

    #[error("could not start chat provider: {0}")]
    ProviderInit(#[from] ProviderInitError),

    #[error("tool call #{index} was not applied: {source}")]
    InvalidToolCall {
        index: usize,
        #[source]
        source: ToolParseError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl NavvyError {
    /// Returns true when the turn cannot continue after this error.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidToolCall { .. })
    }
}

impl From<ProviderError> for NavvyError {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error)
    }
}
