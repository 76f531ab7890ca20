use std::path::PathBuf;
use std::process::Command;

use super::ToolError;

/// Supplies the revision identifier printed in generated headers.
pub trait RevisionSource {
    fn revision(&self) -> Result<String, ToolError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedRevision(pub String);

impl RevisionSource for FixedRevision {
    fn revision(&self) -> Result<String, ToolError> {
        Ok(self.0.clone())
    }
}

/// `git rev-parse HEAD`, optionally run inside `dir`.
#[derive(Clone, Debug, Default)]
pub struct GitRevision {
    dir: Option<PathBuf>,
}

impl GitRevision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl RevisionSource for GitRevision {
    fn revision(&self) -> Result<String, ToolError> {
        let mut command = Command::new("git");
        command.args(["rev-parse", "HEAD"]);
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }
        let output = command.output().map_err(|source| ToolError::Spawn {
            program: "git".to_string(),
            source,
        })?;
        if !output.status.success() {
            return Err(ToolError::Revision {
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if revision.is_empty() {
            return Err(ToolError::Revision {
                reason: "git printed no revision".to_string(),
            });
        }
        Ok(revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_revision_is_returned_verbatim() {
        let source = FixedRevision("v1.2.3".to_string());
        assert_eq!(source.revision().expect("revision"), "v1.2.3");
    }

    #[test]
    fn outside_a_repository_git_lookup_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = GitRevision::in_dir(dir.path()).revision();
        // Either git is missing (spawn error) or the directory is not a repository.
        assert!(result.is_err());
    }
}
