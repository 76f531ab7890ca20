//! Instruction-format model: slots, typed operands, canonical formats and the records that
//! reference them.
//!
//! Everything here is validated on construction, so the catalog and generators downstream can
//! treat a built [`InstructionFormat`] as well-formed.

pub mod argument;
pub mod error;
pub mod format;
pub mod record;
pub mod register;
pub mod slot;

pub use argument::{ArgClass, ArgKind, Argument, KindRule};
pub use error::IsaError;
pub use format::{EMPTY_FORMAT_NAME, InstructionFormat};
pub use record::InstructionRecord;
pub use register::{RegisterException, RegisterExceptions};
pub use slot::{Fragment, Slot, SlotError, WORD_BITS};
