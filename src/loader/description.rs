//! Line-oriented instruction description files.
//!
//! ```text
//! # word     mnemonic  format   attributes
//! 02c00000   addi.d    DJSk12   @qemu
//! 0x06483800 ertn      EMPTY
//! ```
//!
//! Formats are parsed from their canonical names and interned, so every record naming the same
//! format shares one allocation.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::isa::{InstructionFormat, InstructionRecord, IsaError};

const COMMENT: char = '#';
const ATTRIBUTE_SIGIL: char = '@';

#[derive(Default)]
pub struct DescriptionLoader {
    formats: AHashMap<String, Arc<InstructionFormat>>,
    visited: BTreeSet<PathBuf>,
}

impl DescriptionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file in order. A path seen earlier is skipped.
    pub fn load_files<I, P>(&mut self, paths: I) -> Result<Vec<InstructionRecord>, IsaError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut records = Vec::new();
        for path in paths {
            records.extend(self.load_file(path)?);
        }
        Ok(records)
    }

    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Vec<InstructionRecord>, IsaError> {
        let path = path.as_ref();
        if !self.visited.insert(path.to_path_buf()) {
            debug!(path = %path.display(), "description already loaded");
            return Ok(Vec::new());
        }
        let source = fs::read_to_string(path).map_err(|source| IsaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records = self.parse_str(path, &source)?;
        debug!(path = %path.display(), records = records.len(), "loaded description");
        Ok(records)
    }

    /// Parses description text; `path` is only used for error locations.
    pub fn parse_str(&mut self, path: &Path, source: &str) -> Result<Vec<InstructionRecord>, IsaError> {
        let mut records = Vec::new();
        for (index, raw) in source.lines().enumerate() {
            let line = raw.split(COMMENT).next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let record = self
                .parse_line(line)
                .map_err(|message| IsaError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    message,
                })?;
            records.push(record);
        }
        Ok(records)
    }

    fn parse_line(&mut self, line: &str) -> Result<InstructionRecord, String> {
        let mut tokens = line.split_whitespace();
        let (Some(word), Some(mnemonic), Some(format)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err("expected '<word> <mnemonic> <format> [@attribute...]'".to_string());
        };
        let digits = word
            .strip_prefix("0x")
            .or_else(|| word.strip_prefix("0X"))
            .unwrap_or(word);
        let word = u32::from_str_radix(digits, 16)
            .map_err(|_| format!("'{word}' is not a 32-bit hexadecimal word"))?;

        let attributes = tokens
            .map(|token| match token.strip_prefix(ATTRIBUTE_SIGIL) {
                Some(name) if !name.is_empty() => Ok(name.to_string()),
                _ => Err(format!("expected '@attribute', found '{token}'")),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let format = self.intern(format).map_err(|err| err.to_string())?;
        InstructionRecord::new(mnemonic, word, format, attributes).map_err(|err| err.to_string())
    }

    fn intern(&mut self, name: &str) -> Result<Arc<InstructionFormat>, IsaError> {
        if let Some(format) = self.formats.get(name) {
            return Ok(Arc::clone(format));
        }
        let format = Arc::new(InstructionFormat::parse(name)?);
        self.formats.insert(name.to_string(), Arc::clone(&format));
        Ok(format)
    }
}
