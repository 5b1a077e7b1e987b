//! Chat history and per-turn request assembly.

use chat_provider::{ChatMessage, ChatRequest};
use project_repo::{CommitInfo, ProjectFile};

use crate::tools::tool_definitions;

/// System message seeded into a fresh history when none is configured.
pub const DEFAULT_SYSTEM_MESSAGE: &str =
    "You are a Software Developer, your job is to develop software.";

pub const FILES_PREFIX: &str = "files:";
pub const COMMITS_PREFIX: &str = "Last three commits:";
pub const EMPTY_SNAPSHOT: &str = "No files in the repository.";

/// In-memory conversation state.
///
/// The file snapshot and commit log are attached to each outgoing request but
/// never stored, so history only grows by the user's own messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    seed: Vec<ChatMessage>,
    history: Vec<ChatMessage>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Session {
    #[must_use]
    pub fn new(seed: Option<Vec<ChatMessage>>) -> Self {
        let mut session = Self {
            seed: Vec::new(),
            history: Vec::new(),
        };
        session.clear(seed);
        session
    }

    /// Resets history to `seed`, or to the current seed when `None`.
    ///
    /// An empty seed falls back to [`DEFAULT_SYSTEM_MESSAGE`].
    pub fn clear(&mut self, seed: Option<Vec<ChatMessage>>) {
        if let Some(seed) = seed {
            self.seed = seed;
        }
        if self.seed.is_empty() {
            self.seed = vec![ChatMessage::system(DEFAULT_SYSTEM_MESSAGE)];
        }
        self.history = self.seed.clone();
    }

    #[must_use]
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.clone()
    }

    /// Builds the request for one turn and records `user_text` in history.
    pub fn build_request(
        &mut self,
        user_text: &str,
        files: &[ProjectFile],
        recent_commits: &[CommitInfo],
    ) -> ChatRequest {
        let mut messages = self.history.clone();
        messages.push(ChatMessage::system(format!(
            "{FILES_PREFIX}{}",
            render_snapshot(files)
        )));
        messages.push(ChatMessage::system(format!(
            "{COMMITS_PREFIX}{}",
            render_commits(recent_commits)
        )));
        messages.push(ChatMessage::user(user_text));

        self.history.push(ChatMessage::user(user_text));

        ChatRequest {
            messages,
            tools: tool_definitions(),
        }
    }
}

/// `File:<path>\n<content>\n` per file, joined by a newline.
#[must_use]
pub fn render_snapshot(files: &[ProjectFile]) -> String {
    if files.is_empty() {
        return EMPTY_SNAPSHOT.to_string();
    }

    files
        .iter()
        .map(|file| format!("File:{}\n{}\n", file.path, file.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn render_commits(commits: &[CommitInfo]) -> String {
    commits
        .iter()
        .map(|commit| format!("\n{commit}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use chat_provider::Role;
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(path: &str, content: &str) -> ProjectFile {
        ProjectFile {
            path: path.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn fresh_session_holds_default_system_message() {
        let session = Session::default();
        assert_eq!(
            session.history(),
            vec![ChatMessage::system(DEFAULT_SYSTEM_MESSAGE)]
        );
    }

    #[test]
    fn clear_restores_seed_and_is_idempotent() {
        let seed = vec![ChatMessage::system("Be terse.")];
        let mut session = Session::new(Some(seed.clone()));
        session.build_request("hello", &[], &[]);
        assert_eq!(session.history().len(), 2);

        session.clear(None);
        assert_eq!(session.history(), seed);
        session.clear(None);
        assert_eq!(session.history(), seed);
    }

    #[test]
    fn clear_with_empty_seed_falls_back_to_default() {
        let mut session = Session::new(Some(vec![ChatMessage::system("custom")]));
        session.clear(Some(Vec::new()));
        assert_eq!(
            session.history(),
            vec![ChatMessage::system(DEFAULT_SYSTEM_MESSAGE)]
        );
    }

    #[test]
    fn history_is_an_owned_copy() {
        let session = Session::default();
        let mut copy = session.history();
        copy.push(ChatMessage::user("sneaky"));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn request_layers_context_after_history_and_only_user_turn_persists() {
        let mut session = Session::default();
        let commits = vec![CommitInfo {
            id: "abc".to_string(),
            message: "Starting Repository".to_string(),
        }];

        let request = session.build_request(
            "add a readme",
            &[file("a.txt", "A"), file("src/b.rs", "B")],
            &commits,
        );

        let roles: Vec<Role> = request.messages.iter().map(|message| message.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::System, Role::System, Role::User]
        );
        assert_eq!(
            request.messages[1].content,
            "files:File:a.txt\nA\n\nFile:src/b.rs\nB\n"
        );
        assert_eq!(
            request.messages[2].content,
            "Last three commits:\nabc Starting Repository"
        );
        assert_eq!(request.messages[3].content, "add a readme");
        assert_eq!(request.tools.len(), 2);

        assert_eq!(
            session.history(),
            vec![
                ChatMessage::system(DEFAULT_SYSTEM_MESSAGE),
                ChatMessage::user("add a readme"),
            ]
        );
    }

    #[test]
    fn empty_snapshot_uses_placeholder_text() {
        assert_eq!(render_snapshot(&[]), EMPTY_SNAPSHOT);
        assert_eq!(render_commits(&[]), "");
    }
}
