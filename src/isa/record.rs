use std::collections::BTreeSet;
use std::sync::Arc;

use super::error::IsaError;
use super::format::InstructionFormat;

/// One instruction as handed over by the description loader. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstructionRecord {
    mnemonic: String,
    word: u32,
    format: Arc<InstructionFormat>,
    attributes: BTreeSet<String>,
}

impl InstructionRecord {
    pub fn new<I, S>(
        mnemonic: impl Into<String>,
        word: u32,
        format: Arc<InstructionFormat>,
        attributes: I,
    ) -> Result<Self, IsaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mnemonic = mnemonic.into();
        if mnemonic.is_empty() {
            return Err(IsaError::EmptyMnemonic);
        }
        let mask = format.slot_mask();
        if word & mask != 0 {
            return Err(IsaError::OpcodeOverlap {
                mnemonic,
                word,
                mask,
            });
        }
        Ok(Self {
            mnemonic,
            word,
            format,
            attributes: attributes.into_iter().map(Into::into).collect(),
        })
    }

    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Fixed opcode bits; disjoint from every operand slot.
    pub fn word(&self) -> u32 {
        self.word
    }

    pub fn format(&self) -> &InstructionFormat {
        &self.format
    }

    pub fn shared_format(&self) -> &Arc<InstructionFormat> {
        &self.format
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    /// Assembly-style operand summary, e.g. `addi.d d, j, sk12`.
    pub fn syntax(&self) -> String {
        let params: Vec<String> = self
            .format
            .args()
            .iter()
            .map(|arg| arg.param_name())
            .collect();
        if params.is_empty() {
            self.mnemonic.clone()
        } else {
            format!("{} {}", self.mnemonic, params.join(", "))
        }
    }
}
