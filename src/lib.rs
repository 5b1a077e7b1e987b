//! Conversational coding assistant over a git-backed project directory.
//!
//! Invariant: every file mutation requested by the model becomes exactly one
//! commit whose message is the one the model supplied.
//!
//! # Public API Overview
//! - Open a project and talk to it through [`Navvy`].
//! - [`Navvy::send_message`] returns a [`Turn`], a lazy iterator that yields
//!   model text as it streams and one confirmation line per applied mutation.
//! - History lives in [`Session`]; it is never persisted.
//! - Undo and commit listing are delegated to [`ProjectRepo`].

pub mod applier;
pub mod assistant;
pub mod config;
pub mod error;
pub mod providers;
pub mod session;
pub mod tools;

pub use crate::applier::{MutationExecutor, PendingToolCall, ToolCallAccumulator, Turn};
pub use crate::assistant::Navvy;
pub use crate::config::{NavvyConfig, ProviderKind};
pub use crate::error::NavvyError;
pub use crate::session::{Session, DEFAULT_SYSTEM_MESSAGE};
pub use crate::tools::{tool_definitions, DeleteFileArgs, EditFileArgs, ToolInvocation, ToolParseError};

pub use chat_provider::{ChatMessage, ResponseFragment, Role};
pub use project_repo::{CommitInfo, ProjectFile, ProjectRepo, RepoError};
