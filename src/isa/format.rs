//! Instruction formats: ordered operand lists with a structural canonical name.
//!
//! The canonical name doubles as the parse syntax used by description files, e.g. `DJSk12`
//! is two general purpose registers in slots `d` and `j` followed by a 12-bit signed immediate
//! in slot `k`. A format with no operands is named [`EMPTY_FORMAT_NAME`].

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use super::argument::{ArgKind, Argument};
use super::error::IsaError;
use super::slot::{self, Slot, offset_for_tag};

pub const EMPTY_FORMAT_NAME: &str = "EMPTY";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InstructionFormat {
    args: Vec<Argument>,
    name: String,
}

impl InstructionFormat {
    /// Validates that no two slots of any arguments overlap and derives the canonical name.
    pub fn new(args: Vec<Argument>) -> Result<Self, IsaError> {
        slot::ensure_disjoint(args.iter().flat_map(|arg| arg.slots()))?;
        let name = if args.is_empty() {
            EMPTY_FORMAT_NAME.to_string()
        } else {
            args.iter().map(Argument::canonical_repr).collect()
        };
        Ok(Self { args, name })
    }

    pub fn empty() -> Self {
        Self {
            args: Vec::new(),
            name: EMPTY_FORMAT_NAME.to_string(),
        }
    }

    pub fn parse(name: &str) -> Result<Self, IsaError> {
        FormatNameParser::new(name).parse()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.args.iter().flat_map(|arg| arg.slots())
    }

    /// Union of every operand bit in the word.
    pub fn slot_mask(&self) -> u32 {
        self.slots().fold(0, |acc, slot| acc | slot.mask())
    }
}

impl FromStr for InstructionFormat {
    type Err = IsaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for InstructionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

struct FormatNameParser<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> FormatNameParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn parse(mut self) -> Result<InstructionFormat, IsaError> {
        if self.source == EMPTY_FORMAT_NAME {
            return Ok(InstructionFormat::empty());
        }
        if self.source.is_empty() {
            return Err(self.malformed("format name is empty"));
        }
        let mut args = Vec::new();
        while let Some((start, ch)) = self.chars.next() {
            let arg = match ch {
                'F' => Argument::register(ArgKind::FpReg, self.expect_tag()?)?,
                'C' => Argument::register(ArgKind::FccReg, self.expect_tag()?)?,
                'S' => self.immediate(ArgKind::SignedImm)?,
                'U' => self.immediate(ArgKind::UnsignedImm)?,
                c if c.is_ascii_uppercase() && offset_for_tag(c).is_some() => {
                    Argument::register(ArgKind::IntReg, c.to_ascii_lowercase())?
                }
                _ => {
                    return Err(IsaError::UnknownArgKind {
                        format: self.source.to_string(),
                        token: self.source[start..].to_string(),
                    });
                }
            };
            args.push(arg);
        }
        InstructionFormat::new(args)
    }

    fn expect_tag(&mut self) -> Result<char, IsaError> {
        match self.chars.next() {
            Some((_, tag)) if tag.is_ascii_lowercase() => Ok(tag),
            _ => Err(self.malformed("register kind must be followed by a lower-case slot name")),
        }
    }

    fn immediate(&mut self, kind: ArgKind) -> Result<Argument, IsaError> {
        let mut parts = Vec::new();
        while let Some(&(_, tag)) = self.chars.peek() {
            if !tag.is_ascii_lowercase() {
                break;
            }
            self.chars.next();
            let width = self.width()?;
            parts.push((tag, width));
        }
        if parts.is_empty() {
            return Err(self.malformed("immediate kind must be followed by at least one slot"));
        }
        Argument::immediate(kind, &parts)
    }

    fn width(&mut self) -> Result<u8, IsaError> {
        let mut digits = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if !ch.is_ascii_digit() {
                break;
            }
            digits.push(ch);
            self.chars.next();
        }
        if digits.is_empty() {
            return Err(self.malformed("immediate slot is missing its width"));
        }
        digits
            .parse::<u8>()
            .map_err(|_| self.malformed(format!("slot width '{digits}' is out of range")))
    }

    fn malformed(&self, reason: impl Into<String>) -> IsaError {
        IsaError::MalformedFormat {
            format: self.source.to_string(),
            reason: reason.into(),
        }
    }
}
