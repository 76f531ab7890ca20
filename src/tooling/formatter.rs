//! Pipes generated text through an external pretty printer.
//!
//! The program reads the artifact on stdin and writes the formatted version to stdout. A style
//! file, when present, is written into a private temporary directory that becomes the working
//! directory of the child, so `clang-format --style=file` finds it without touching the tree.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use tempfile::TempDir;
use tracing::debug;

use super::ToolError;

const QEMU_STYLE: &str = include_str!("../../styles/qemu.clang-format");

pub trait SourceFormatter {
    fn name(&self) -> &str;
    fn format(&self, source: &str) -> Result<String, ToolError>;
}

/// Returns its input unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl SourceFormatter for Passthrough {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn format(&self, source: &str) -> Result<String, ToolError> {
        Ok(source.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct StyleFile {
    file_name: String,
    contents: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
    style: Option<StyleFile>,
}

impl ExternalFormatter {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            style: None,
        }
    }

    pub fn gofmt() -> Self {
        Self::new("gofmt", Vec::<String>::new())
    }

    pub fn clang_format_qemu() -> Self {
        Self::new("clang-format", ["--style=file"]).with_style(".clang-format", QEMU_STYLE)
    }

    /// Stages `contents` as `file_name` in the child's working directory.
    pub fn with_style(mut self, file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.style = Some(StyleFile {
            file_name: file_name.into(),
            contents: contents.into(),
        });
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, source: &str, dir: Option<&Path>) -> Result<String, ToolError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        let spawn_error = |source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;

        // Feed stdin from a separate thread so a chatty child cannot fill its stdout pipe
        // while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&input))
        });
        let output = child.wait_with_output().map_err(spawn_error)?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(result) => result.map_err(spawn_error)?,
                Err(_) => {
                    return Err(ToolError::Failed {
                        program: self.program.clone(),
                        status: "stdin writer panicked".to_string(),
                        stderr: String::new(),
                    });
                }
            }
        }

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8(output.stdout).map_err(|_| ToolError::NonUtf8 {
            program: self.program.clone(),
        })
    }
}

impl SourceFormatter for ExternalFormatter {
    fn name(&self) -> &str {
        &self.program
    }

    fn format(&self, source: &str) -> Result<String, ToolError> {
        debug!(program = %self.program, bytes = source.len(), "running formatter");
        let Some(style) = &self.style else {
            return self.run(source, None);
        };
        let dir = TempDir::new().map_err(|source| ToolError::Style {
            path: std::env::temp_dir(),
            source,
        })?;
        let path = dir.path().join(&style.file_name);
        std::fs::write(&path, &style.contents)
            .map_err(|source| ToolError::Style { path, source })?;
        self.run(source, Some(dir.path()))
    }
}
