//! [`WorkspaceFiles`] over a directory on this machine.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tether_tools::{FileAccessError, WorkspaceFiles};
use tether_utils::atomic_write;

/// Local directory standing in for the sandbox workspace.
///
/// The dispatcher confines paths lexically. Locally, symlinks can still point
/// outside the root, so every access re-checks the canonical path.
#[derive(Debug, Clone)]
pub struct LocalWorkspace {
    root: PathBuf,
}

impl LocalWorkspace {
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn checked(&self, path: &Path) -> Result<PathBuf, FileAccessError> {
        let canonical = canonicalize_for_create(path)?;
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            tracing::warn!(
                path = %path.display(),
                resolved = %canonical.display(),
                "Path resolves outside the local workspace"
            );
            Err(FileAccessError::Io(format!(
                "resolves outside the workspace ({})",
                canonical.display()
            )))
        }
    }
}

/// Canonicalize the longest existing prefix of `path` and append the rest.
fn canonicalize_for_create(path: &Path) -> Result<PathBuf, FileAccessError> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(base) => {
                return Ok(missing.iter().rev().fold(base, |acc, part| acc.join(part)));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(FileAccessError::NotFound);
                };
                missing.push(name.to_os_string());
                existing = parent;
            }
            Err(err) => return Err(FileAccessError::Io(err.to_string())),
        }
    }
}

fn io_error(err: &std::io::Error) -> FileAccessError {
    match err.kind() {
        ErrorKind::NotFound => FileAccessError::NotFound,
        ErrorKind::InvalidData => FileAccessError::Io("file is not valid UTF-8 text".to_string()),
        _ => FileAccessError::Io(err.to_string()),
    }
}

impl WorkspaceFiles for LocalWorkspace {
    fn read_text(&self, path: &Path) -> Result<String, FileAccessError> {
        let path = self.checked(path)?;
        fs::read_to_string(&path).map_err(|err| io_error(&err))
    }

    fn write_text(&mut self, path: &Path, content: &str) -> Result<(), FileAccessError> {
        let path = self.checked(path)?;
        atomic_write(&path, content.as_bytes()).map_err(|err| io_error(&err))
    }

    fn remove_file(&mut self, path: &Path) -> Result<(), FileAccessError> {
        let path = self.checked(path)?;
        fs::remove_file(&path).map_err(|err| io_error(&err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_writes_inside_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = LocalWorkspace::open(dir.path()).unwrap();
        let path = ws.root().join("nested/file.txt");
        ws.write_text(&path, "hello\n").unwrap();
        assert_eq!(ws.read_text(&path).unwrap(), "hello\n");
        ws.remove_file(&path).unwrap();
        assert_eq!(ws.read_text(&path), Err(FileAccessError::NotFound));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_out_of_the_root_are_refused() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), "s").unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let ws = LocalWorkspace::open(dir.path()).unwrap();
        let err = ws.read_text(&ws.root().join("link/secret")).unwrap_err();
        assert!(matches!(err, FileAccessError::Io(msg) if msg.contains("outside")));
    }

    #[test]
    fn open_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(LocalWorkspace::open(&file).is_err());
    }
}
