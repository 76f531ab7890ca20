//! External collaborators: the source formatter and the revision lookup.

pub mod formatter;
pub mod revision;

use std::path::PathBuf;

use thiserror::Error;

pub use formatter::{ExternalFormatter, Passthrough, SourceFormatter};
pub use revision::{FixedRevision, GitRevision, RevisionSource};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{program}' failed ({status})\nstderr:\n{stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("'{program}' produced output that is not UTF-8")]
    NonUtf8 { program: String },
    #[error("failed to stage style file '{path}': {source}")]
    Style {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("revision lookup failed: {reason}")]
    Revision { reason: String },
}
