use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::RepoError;

/// Normalizes a model-supplied path into a clean path relative to the project root.
///
/// Absolute paths, `..` components and anything inside `.git` (in any letter
/// case) are rejected; `.` components are dropped.
pub fn normalize_relative_path(path: &str) -> Result<PathBuf, RepoError> {
    if path.trim().is_empty() {
        return Err(RepoError::invalid_path(path, "path must not be empty"));
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::Normal(part) if part.eq_ignore_ascii_case(".git") => {
                return Err(RepoError::invalid_path(
                    path,
                    "path must not point into the .git directory",
                ));
            }
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(RepoError::invalid_path(
                    path,
                    "path must not contain '..' components",
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(RepoError::invalid_path(path, "path must be relative"));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(RepoError::invalid_path(path, "path must name a file"));
    }

    Ok(normalized)
}

const MAX_SYMLINK_HOPS: usize = 40;

/// Fails when the closest existing ancestor of `candidate` resolves outside `root`.
///
/// `root` must already be canonical. Symlinks are followed even when they
/// dangle, so a link inside the project cannot redirect a write elsewhere.
pub(crate) fn ensure_inside_root(root: &Path, candidate: &Path) -> Result<(), RepoError> {
    let anchor = canonicalize_existing_ancestor(candidate, 0)?;
    if anchor.starts_with(root) {
        Ok(())
    } else {
        Err(RepoError::invalid_path(
            candidate.display().to_string(),
            "path escapes the project root",
        ))
    }
}

fn canonicalize_existing_ancestor(path: &Path, hops: usize) -> Result<PathBuf, RepoError> {
    for ancestor in path.ancestors() {
        let Ok(metadata) = fs::symlink_metadata(ancestor) else {
            continue;
        };

        if !metadata.file_type().is_symlink() {
            return ancestor
                .canonicalize()
                .map_err(|error| RepoError::io("resolving path", ancestor, error));
        }
        if hops >= MAX_SYMLINK_HOPS {
            return Err(RepoError::invalid_path(
                path.display().to_string(),
                "too many levels of symbolic links",
            ));
        }

        let target = fs::read_link(ancestor)
            .map_err(|error| RepoError::io("reading symlink", ancestor, error))?;
        let target = match ancestor.parent() {
            Some(parent) => parent.join(target),
            None => target,
        };
        let rest = path.strip_prefix(ancestor).unwrap_or_else(|_| Path::new(""));
        let resolved = if rest.as_os_str().is_empty() {
            target
        } else {
            target.join(rest)
        };
        return canonicalize_existing_ancestor(&resolved, hops + 1);
    }

    Err(RepoError::invalid_path(
        path.display().to_string(),
        "no existing ancestor directory",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_nested_paths_are_kept() {
        assert_eq!(
            normalize_relative_path("src/main.rs").expect("valid"),
            PathBuf::from("src/main.rs")
        );
        assert_eq!(
            normalize_relative_path("./a/./b.txt").expect("valid"),
            PathBuf::from("a/b.txt")
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        for path in [
            "",
            "  ",
            "/etc/passwd",
            "../x",
            "a/../../x",
            ".git/config",
            ".GIT/config",
            ".",
            "a/.git",
            "a/.Git/HEAD",
        ] {
            assert!(
                matches!(
                    normalize_relative_path(path),
                    Err(RepoError::InvalidPath { .. })
                ),
                "expected {path:?} to be rejected"
            );
        }
    }

    #[test]
    fn symlinked_directory_outside_root_is_rejected() {
        let root = tempfile::tempdir().expect("root");
        let outside = tempfile::tempdir().expect("outside");
        let root_path = root.path().canonicalize().expect("canonical root");

        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(outside.path(), root_path.join("link"))
                .expect("create symlink");
            assert!(ensure_inside_root(&root_path, &root_path.join("link/new.txt")).is_err());
        }

        assert!(ensure_inside_root(&root_path, &root_path.join("fresh/dir/new.txt")).is_ok());
        drop(outside);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_to_outside_file_is_rejected() {
        let root = tempfile::tempdir().expect("root");
        let outside = tempfile::tempdir().expect("outside");
        let root_path = root.path().canonicalize().expect("canonical root");
        let target = outside.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, root_path.join("link")).expect("create symlink");

        assert!(matches!(
            ensure_inside_root(&root_path, &root_path.join("link")),
            Err(RepoError::InvalidPath { .. })
        ));
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_file_inside_root_is_allowed() {
        let root = tempfile::tempdir().expect("root");
        let root_path = root.path().canonicalize().expect("canonical root");
        std::os::unix::fs::symlink(root_path.join("real.txt"), root_path.join("alias"))
            .expect("create symlink");

        assert!(ensure_inside_root(&root_path, &root_path.join("alias")).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_rejected() {
        let root = tempfile::tempdir().expect("root");
        let root_path = root.path().canonicalize().expect("canonical root");
        std::os::unix::fs::symlink(root_path.join("b"), root_path.join("a")).expect("a");
        std::os::unix::fs::symlink(root_path.join("a"), root_path.join("b")).expect("b");

        assert!(ensure_inside_root(&root_path, &root_path.join("a/file.txt")).is_err());
    }
}
