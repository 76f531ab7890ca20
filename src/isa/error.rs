use std::path::PathBuf;

use thiserror::Error;

use super::argument::ArgKind;
use super::slot::SlotError;
use crate::model::validator::BoundViolation;

/// Defects in the instruction description or in values handed to the model. None of these are
/// recoverable: generation stops and nothing is written.
#[derive(Debug, Error)]
pub enum IsaError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("{kind} operand declares no slots")]
    EmptyArgument { kind: ArgKind },
    #[error("{kind} operand must occupy a single {expected_width}-bit slot (found {slots} slot(s))")]
    RegisterShape {
        kind: ArgKind,
        expected_width: u8,
        slots: usize,
    },
    #[error("{kind} is not a register class")]
    NotARegister { kind: ArgKind },
    #[error("format '{format}': unrecognized argument kind at '{token}'")]
    UnknownArgKind { format: String, token: String },
    #[error("format '{format}' is malformed: {reason}")]
    MalformedFormat { format: String, reason: String },
    #[error("instruction record has an empty mnemonic")]
    EmptyMnemonic,
    #[error("'{mnemonic}': opcode bits {word:#010x} overlap operand slots {mask:#010x}")]
    OpcodeOverlap {
        mnemonic: String,
        word: u32,
        mask: u32,
    },
    #[error("mnemonic '{mnemonic}' is defined more than once")]
    DuplicateMnemonic { mnemonic: String },
    #[error("{backend}: '{first}' and '{second}' both map to identifier '{identifier}'")]
    IdentifierCollision {
        backend: &'static str,
        identifier: String,
        first: String,
        second: String,
    },
    #[error("{backend}: format '{format}' cannot be rendered: {reason}")]
    UnsupportedOperand {
        backend: &'static str,
        format: String,
        reason: String,
    },
    #[error("invalid register exception '{entry}': {reason}")]
    InvalidException { entry: String, reason: String },
    #[error("unknown mnemonic '{mnemonic}'")]
    UnknownMnemonic { mnemonic: String },
    #[error("'{mnemonic}' takes {expected} operand(s), {actual} given")]
    Arity {
        mnemonic: String,
        expected: usize,
        actual: usize,
    },
    #[error("'{mnemonic}': {violation}")]
    Bound {
        mnemonic: String,
        #[source]
        violation: BoundViolation,
    },
}
