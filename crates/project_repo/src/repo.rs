use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    Commit, ErrorCode, Index, ObjectType, Repository, ResetType, Signature, Sort, Status,
    StatusOptions, TreeWalkMode, TreeWalkResult,
};

use crate::error::RepoError;
use crate::paths::{ensure_inside_root, normalize_relative_path};

/// Empty file committed to give an unborn repository its first commit.
pub const PLACEHOLDER_FILE: &str = ".gitkeep";

/// Message of the commit created for an unborn repository.
pub const BOOTSTRAP_COMMIT_MESSAGE: &str = "Starting Repository";

const FALLBACK_SIGNATURE_NAME: &str = "navvy";
const FALLBACK_SIGNATURE_EMAIL: &str = "navvy@localhost";

/// Id and message of one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full hex object id.
    pub id: String,
    pub message: String,
}

impl fmt::Display for CommitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.message.trim_end())
    }
}

/// A tracked file read from the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    /// Slash-separated path relative to the project root.
    pub path: String,
    pub content: String,
}

/// A non-bare git repository whose working tree is the project directory.
pub struct ProjectRepo {
    root: PathBuf,
    repo: Repository,
}

impl fmt::Debug for ProjectRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ProjectRepo {
    /// Opens the repository at `path`, creating the bootstrap commit if HEAD is unborn.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|error| match error.code() {
            ErrorCode::NotFound => RepoError::NotARepository {
                path: path.to_path_buf(),
            },
            _ => RepoError::git("opening repository", error),
        })?;

        Self::from_repository(repo, path)
    }

    /// Initializes a repository at `path` (creating the directory) and opens it.
    ///
    /// An existing repository is reopened unchanged.
    pub fn init(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        fs::create_dir_all(path)
            .map_err(|error| RepoError::io("creating project directory", path, error))?;
        let repo =
            Repository::init(path).map_err(|error| RepoError::git("initializing repository", error))?;

        Self::from_repository(repo, path)
    }

    fn from_repository(repo: Repository, path: &Path) -> Result<Self, RepoError> {
        let Some(workdir) = repo.workdir() else {
            return Err(RepoError::BareRepository {
                path: path.to_path_buf(),
            });
        };
        let root = workdir
            .canonicalize()
            .map_err(|error| RepoError::io("resolving project root", workdir, error))?;

        let project = Self { root, repo };
        if project.head_commit()?.is_none() {
            project.bootstrap()?;
        }

        Ok(project)
    }

    /// Canonical project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bootstrap(&self) -> Result<(), RepoError> {
        let placeholder = self.root.join(PLACEHOLDER_FILE);
        if !placeholder.exists() {
            fs::write(&placeholder, b"")
                .map_err(|error| RepoError::io("creating placeholder", &placeholder, error))?;
        }

        let mut index = self.index()?;
        index
            .add_path(Path::new(PLACEHOLDER_FILE))
            .map_err(|error| RepoError::git("staging placeholder", error))?;
        let commit = self.commit_index(&mut index, BOOTSTRAP_COMMIT_MESSAGE)?;
        tracing::info!(commit = %commit.id, "bootstrapped empty repository");
        Ok(())
    }

    /// Reads every file in the HEAD tree from the working tree.
    ///
    /// Unreadable and non-UTF-8 files are skipped with a warning.
    pub fn head_files(&self) -> Result<Vec<ProjectFile>, RepoError> {
        let Some(commit) = self.head_commit()? else {
            return Ok(Vec::new());
        };
        let tree = commit
            .tree()
            .map_err(|error| RepoError::git("reading HEAD tree", error))?;

        let mut paths = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |parent, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    paths.push(format!("{parent}{name}"));
                }
            }
            TreeWalkResult::Ok
        })
        .map_err(|error| RepoError::git("walking HEAD tree", error))?;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let full_path = self.root.join(&path);
            match fs::read(&full_path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(content) => files.push(ProjectFile { path, content }),
                    Err(_) => {
                        tracing::warn!(path = %path, "skipping non-UTF-8 file in project snapshot");
                    }
                },
                Err(error) => {
                    tracing::warn!(path = %path, %error, "skipping unreadable file in project snapshot");
                }
            }
        }

        Ok(files)
    }

    /// Up to `limit` commits reachable from HEAD, newest first.
    pub fn recent_commits(&self, limit: usize) -> Result<Vec<CommitInfo>, RepoError> {
        self.walk_commits(Some(limit))
    }

    /// Every commit reachable from HEAD, newest first.
    pub fn list_commits(&self) -> Result<Vec<CommitInfo>, RepoError> {
        self.walk_commits(None)
    }

    fn walk_commits(&self, limit: Option<usize>) -> Result<Vec<CommitInfo>, RepoError> {
        if self.head_commit()?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|error| RepoError::git("walking history", error))?;
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(|error| RepoError::git("walking history", error))?;
        revwalk
            .push_head()
            .map_err(|error| RepoError::git("walking history", error))?;

        let mut commits = Vec::new();
        for oid in revwalk.take(limit.unwrap_or(usize::MAX)) {
            let oid = oid.map_err(|error| RepoError::git("walking history", error))?;
            let commit = self
                .repo
                .find_commit(oid)
                .map_err(|error| RepoError::git("reading commit", error))?;
            commits.push(commit_info(&commit));
        }

        Ok(commits)
    }

    /// Writes `content` to `path` (creating parent directories), stages it and commits.
    pub fn write_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitInfo, RepoError> {
        let relative = normalize_relative_path(path)?;
        let full_path = self.root.join(&relative);
        ensure_inside_root(&self.root, &full_path)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| RepoError::io("creating parent directories", parent, error))?;
        }
        fs::write(&full_path, content)
            .map_err(|error| RepoError::io("writing file", &full_path, error))?;

        let mut index = self.index()?;
        index
            .add_path(&relative)
            .map_err(|error| RepoError::git("staging file", error))?;
        let commit = self.commit_index(&mut index, message)?;
        tracing::debug!(path = %relative.display(), commit = %commit.id, "committed file write");
        Ok(commit)
    }

    /// Removes `path` if present, stages the removal and commits.
    ///
    /// A missing file is logged and still produces a commit.
    pub fn delete_file(&self, path: &str, message: &str) -> Result<CommitInfo, RepoError> {
        let relative = normalize_relative_path(path)?;
        let full_path = self.root.join(&relative);
        ensure_inside_root(&self.root, &full_path)?;

        if full_path.is_file() || full_path.is_symlink() {
            fs::remove_file(&full_path)
                .map_err(|error| RepoError::io("removing file", &full_path, error))?;
        } else {
            tracing::warn!(path = %full_path.display(), "file not found; committing without removal");
        }

        let mut index = self.index()?;
        if index.get_path(&relative, 0).is_some() {
            index
                .remove_path(&relative)
                .map_err(|error| RepoError::git("staging removal", error))?;
        }
        let commit = self.commit_index(&mut index, message)?;
        tracing::debug!(path = %relative.display(), commit = %commit.id, "committed file removal");
        Ok(commit)
    }

    /// Hard-resets to `commit_id` (default: the second newest commit) and
    /// removes untracked and ignored files.
    pub fn undo(&self, commit_id: Option<&str>) -> Result<CommitInfo, RepoError> {
        let target_id = match commit_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let recent = self.recent_commits(2)?;
                match recent.get(1) {
                    Some(previous) => previous.id.clone(),
                    None => return Err(RepoError::NothingToUndo),
                }
            }
        };

        let target = self
            .repo
            .revparse_single(&target_id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|source| RepoError::UnknownCommit {
                commit: target_id.clone(),
                source,
            })?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(target.as_object(), ResetType::Hard, Some(&mut checkout))
            .map_err(|error| RepoError::git("resetting to commit", error))?;
        self.clean_untracked()?;

        let info = commit_info(&target);
        tracing::info!(commit = %info.id, "reset working tree");
        Ok(info)
    }

    /// Content of `path` as committed in `commit_id`, if present there.
    pub fn committed_content(
        &self,
        commit_id: &str,
        path: &str,
    ) -> Result<Option<String>, RepoError> {
        let relative = normalize_relative_path(path)?;
        let commit = self
            .repo
            .revparse_single(commit_id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|source| RepoError::UnknownCommit {
                commit: commit_id.to_string(),
                source,
            })?;
        let tree = commit
            .tree()
            .map_err(|error| RepoError::git("reading commit tree", error))?;

        let entry = match tree.get_path(&relative) {
            Ok(entry) => entry,
            Err(error) if error.code() == ErrorCode::NotFound => return Ok(None),
            Err(error) => return Err(RepoError::git("looking up committed path", error)),
        };
        let blob = entry
            .to_object(&self.repo)
            .and_then(|object| object.peel_to_blob())
            .map_err(|error| RepoError::git("reading committed blob", error))?;

        Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()))
    }

    fn clean_untracked(&self) -> Result<(), RepoError> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .include_ignored(true)
            .recurse_untracked_dirs(false)
            .recurse_ignored_dirs(false);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .map_err(|error| RepoError::git("listing untracked files", error))?;

        for entry in statuses.iter() {
            if !entry.status().intersects(Status::WT_NEW | Status::IGNORED) {
                continue;
            }
            let Some(path) = entry.path() else {
                continue;
            };

            let full_path = self.root.join(path.trim_end_matches('/'));
            let removal = if path.ends_with('/') || full_path.is_dir() {
                fs::remove_dir_all(&full_path)
            } else {
                fs::remove_file(&full_path)
            };
            removal.map_err(|error| RepoError::io("removing untracked path", &full_path, error))?;
            tracing::debug!(path, "removed untracked path");
        }

        Ok(())
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>, RepoError> {
        match self.repo.head() {
            Ok(head) => head
                .peel_to_commit()
                .map(Some)
                .map_err(|error| RepoError::git("reading HEAD commit", error)),
            Err(error) if matches!(error.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(error) => Err(RepoError::git("reading HEAD", error)),
        }
    }

    fn index(&self) -> Result<Index, RepoError> {
        self.repo
            .index()
            .map_err(|error| RepoError::git("opening index", error))
    }

    fn signature(&self) -> Result<Signature<'static>, RepoError> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Signature::now(FALLBACK_SIGNATURE_NAME, FALLBACK_SIGNATURE_EMAIL)
                .map_err(|error| RepoError::git("creating signature", error)),
        }
    }

    fn commit_index(&self, index: &mut Index, message: &str) -> Result<CommitInfo, RepoError> {
        index
            .write()
            .map_err(|error| RepoError::git("writing index", error))?;
        let tree_id = index
            .write_tree()
            .map_err(|error| RepoError::git("writing tree", error))?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|error| RepoError::git("reading tree", error))?;
        let signature = self.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let id = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .map_err(|error| RepoError::git("creating commit", error))?;

        Ok(CommitInfo {
            id: id.to_string(),
            message: message.to_string(),
        })
    }
}

fn commit_info(commit: &Commit<'_>) -> CommitInfo {
    CommitInfo {
        id: commit.id().to_string(),
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
    }
}
