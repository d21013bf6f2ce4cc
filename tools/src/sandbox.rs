//! Workspace-root confinement for path arguments.

use std::path::{Component, Path, PathBuf};

use super::{DenialReason, ToolError};

pub const DEFAULT_WORKSPACE_ROOT: &str = "/workspace";

/// Workspace root all filesystem-touching tools are confined to.
///
/// The workspace lives in a remote sandbox, so confinement is lexical: nothing
/// is canonicalized on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceRoot {
    root: PathBuf,
}

impl Default for WorkspaceRoot {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_WORKSPACE_ROOT),
        }
    }
}

impl WorkspaceRoot {
    /// The root must be absolute and free of `..` components.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ToolError> {
        let root = root.into();
        let display = root.to_string_lossy().into_owned();
        if contains_unsafe_path_chars(&display) {
            return Err(ToolError::PolicyViolation(DenialReason::UnsafePath {
                attempted: display,
            }));
        }
        if !root.is_absolute() {
            return Err(ToolError::invalid(
                "workspace.root",
                format!("'{display}' is not an absolute path"),
            ));
        }
        if root.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(ToolError::invalid(
                "workspace.root",
                format!("'{display}' must not contain '..'"),
            ));
        }
        Ok(Self {
            root: normalize(&root),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Validate and resolve a path argument within the workspace.
    ///
    /// Relative paths are joined to the root; absolute paths must already be
    /// inside it. An empty path is the root itself.
    pub fn resolve(&self, path: &str) -> Result<PathBuf, ToolError> {
        if contains_unsafe_path_chars(path) {
            return Err(ToolError::PolicyViolation(DenialReason::UnsafePath {
                attempted: path.to_string(),
            }));
        }
        let input = Path::new(path);
        if input.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(self.outside(input));
        }
        let resolved = if input.is_absolute() {
            normalize(input)
        } else {
            normalize(&self.root.join(input))
        };
        if !resolved.starts_with(&self.root) {
            return Err(self.outside(input));
        }
        Ok(resolved)
    }

    /// Display form of `path` relative to the root, for tool output.
    #[must_use]
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn outside(&self, attempted: &Path) -> ToolError {
        ToolError::PolicyViolation(DenialReason::PathOutsideWorkspace {
            attempted: attempted.to_path_buf(),
            root: self.root.clone(),
        })
    }
}

impl std::fmt::Display for WorkspaceRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// Drop `.` components and trailing separators.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn contains_unsafe_path_chars(input: &str) -> bool {
    input.chars().any(is_unsafe_path_char)
}

/// C0/C1 control characters, DEL, and invisible formatting characters
/// (zero-width, bidi controls, BOM).
fn is_unsafe_path_char(c: char) -> bool {
    matches!(
        c,
        '\u{0000}'..='\u{001f}'
            | '\u{007f}'
            | '\u{0080}'..='\u{009f}'
            | '\u{00ad}'
            | '\u{061c}'
            | '\u{200b}'..='\u{200f}'
            | '\u{202a}'..='\u{202e}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{2069}'
            | '\u{feff}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> WorkspaceRoot {
        WorkspaceRoot::default()
    }

    fn is_outside(result: Result<PathBuf, ToolError>) -> bool {
        matches!(
            result,
            Err(ToolError::PolicyViolation(
                DenialReason::PathOutsideWorkspace { .. }
            ))
        )
    }

    #[test]
    fn safe_chars_not_flagged() {
        for c in ['a', 'Z', '0', '/', '.', '-', '_', ' ', 'é'] {
            assert!(!is_unsafe_path_char(c), "{c:?}");
        }
    }

    #[test]
    fn control_and_invisible_chars_are_unsafe() {
        for c in ['\u{0000}', '\u{001f}', '\u{007f}', '\u{0085}', '\u{200b}', '\u{202e}', '\u{feff}'] {
            assert!(is_unsafe_path_char(c), "{c:?}");
        }
    }

    #[test]
    fn relative_paths_join_the_root() {
        assert_eq!(
            root().resolve("src/main.rs").unwrap(),
            PathBuf::from("/workspace/src/main.rs")
        );
        assert_eq!(
            root().resolve("./src/./main.rs").unwrap(),
            PathBuf::from("/workspace/src/main.rs")
        );
    }

    #[test]
    fn empty_path_is_the_root() {
        assert_eq!(root().resolve("").unwrap(), PathBuf::from("/workspace"));
        assert_eq!(root().resolve(".").unwrap(), PathBuf::from("/workspace"));
    }

    #[test]
    fn absolute_paths_inside_the_root_are_accepted() {
        assert_eq!(
            root().resolve("/workspace/a.txt").unwrap(),
            PathBuf::from("/workspace/a.txt")
        );
    }

    #[test]
    fn escapes_are_rejected() {
        assert!(is_outside(root().resolve("../etc/passwd")));
        assert!(is_outside(root().resolve("src/../../etc")));
        assert!(is_outside(root().resolve("/etc/passwd")));
        assert!(is_outside(root().resolve("/workspace-evil/a")));
        assert!(is_outside(root().resolve("/workspace/../etc")));
    }

    #[test]
    fn unsafe_characters_are_rejected() {
        assert!(matches!(
            root().resolve("a\u{0000}b"),
            Err(ToolError::PolicyViolation(DenialReason::UnsafePath { .. }))
        ));
    }

    #[test]
    fn root_must_be_absolute_and_plain() {
        assert!(WorkspaceRoot::new("relative/dir").is_err());
        assert!(WorkspaceRoot::new("/srv/../etc").is_err());
        let root = WorkspaceRoot::new("/srv/work/").unwrap();
        assert_eq!(root.path(), Path::new("/srv/work"));
        assert_eq!(root.to_string(), "/srv/work");
    }

    #[test]
    fn relative_display() {
        let root = root();
        let resolved = root.resolve("src/lib.rs").unwrap();
        assert_eq!(root.relative(&resolved), Path::new("src/lib.rs"));
    }
}
