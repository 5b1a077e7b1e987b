//! Git-backed project directory used by navvy.
//!
//! Every mutation is recorded as exactly one commit on the checked-out
//! branch. Undo is a hard reset plus removal of untracked and ignored files,
//! so the working tree always matches a commit afterwards.

mod error;
mod paths;
mod repo;

pub use error::RepoError;
pub use paths::normalize_relative_path;
pub use repo::{CommitInfo, ProjectFile, ProjectRepo, BOOTSTRAP_COMMIT_MESSAGE, PLACEHOLDER_FILE};
