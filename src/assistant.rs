use std::path::Path;
use std::sync::Arc;

use chat_provider::{ChatMessage, ChatProvider, ProviderProfile};
use project_repo::{CommitInfo, ProjectRepo};

use crate::applier::Turn;
use crate::config::NavvyConfig;
use crate::error::NavvyError;
use crate::providers::provider_for_config;
use crate::session::Session;

/// Number of commits summarized in each request.
pub const RECENT_COMMIT_COUNT: usize = 3;

/// One chat session bound to one project repository.
///
/// Concurrent sessions on the same project directory are not coordinated.
pub struct Navvy {
    repo: ProjectRepo,
    session: Session,
    provider: Arc<dyn ChatProvider>,
}

impl Navvy {
    #[must_use]
    pub fn new(
        repo: ProjectRepo,
        provider: Arc<dyn ChatProvider>,
        seed: Option<Vec<ChatMessage>>,
    ) -> Self {
        Self {
            repo,
            session: Session::new(seed),
            provider,
        }
    }

    /// Opens `project_path` and builds the provider described by `config`.
    pub fn from_config(project_path: impl AsRef<Path>, config: &NavvyConfig) -> Result<Self, NavvyError> {
        let provider = provider_for_config(config)?;
        let repo = ProjectRepo::open(project_path)?;
        let seed = config
            .system_message
            .as_ref()
            .map(|message| vec![ChatMessage::system(message.clone())]);

        Ok(Self::new(repo, provider, seed))
    }

    /// Sends `text` with a fresh snapshot of the project and returns the streamed turn.
    ///
    /// The user message is recorded in history even if the provider rejects the request.
    pub fn send_message(&mut self, text: &str) -> Result<Turn<'_>, NavvyError> {
        let files = self.repo.head_files()?;
        let recent_commits = self.repo.recent_commits(RECENT_COMMIT_COUNT)?;
        let request = self.session.build_request(text, &files, &recent_commits);

        tracing::debug!(
            files = files.len(),
            messages = request.messages.len(),
            "sending message"
        );
        let fragments = self.provider.stream_chat(request)?;

        Ok(Turn::new(fragments, &self.repo))
    }

    #[must_use]
    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.session.history()
    }

    pub fn clear_history(&mut self) {
        self.session.clear(None);
    }

    /// Resets the project to `commit_id`, or to the commit before HEAD.
    pub fn undo(&self, commit_id: Option<&str>) -> Result<CommitInfo, NavvyError> {
        Ok(self.repo.undo(commit_id)?)
    }

    pub fn list_commits(&self) -> Result<Vec<CommitInfo>, NavvyError> {
        Ok(self.repo.list_commits()?)
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        self.repo.root()
    }

    #[must_use]
    pub fn profile(&self) -> ProviderProfile {
        self.provider.profile()
    }
}
