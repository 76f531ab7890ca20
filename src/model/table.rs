use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::isa::{InstructionFormat, InstructionRecord, IsaError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub mnemonic: String,
    pub bits: u32,
    pub format: Arc<InstructionFormat>,
}

/// Mnemonic → (opcode bits, format) lookup, ordered by opcode bits.
#[derive(Debug, Clone, Default)]
pub struct MnemonicTable {
    entries: Vec<TableEntry>,
    index: AHashMap<String, usize>,
}

impl MnemonicTable {
    pub fn build<'a, I>(records: I) -> Result<Self, IsaError>
    where
        I: IntoIterator<Item = &'a InstructionRecord>,
    {
        let mut entries = Vec::new();
        let mut seen: AHashSet<&'a str> = AHashSet::new();
        for record in records {
            if !seen.insert(record.mnemonic()) {
                return Err(IsaError::DuplicateMnemonic {
                    mnemonic: record.mnemonic().to_string(),
                });
            }
            entries.push(TableEntry {
                mnemonic: record.mnemonic().to_string(),
                bits: record.word(),
                format: Arc::clone(record.shared_format()),
            });
        }
        entries.sort_by(|a, b| (a.bits, &a.mnemonic).cmp(&(b.bits, &b.mnemonic)));
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.mnemonic.clone(), position))
            .collect();
        Ok(Self { entries, index })
    }

    pub fn get(&self, mnemonic: &str) -> Option<&TableEntry> {
        self.index
            .get(mnemonic)
            .map(|position| &self.entries[*position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
