//! Structural deduplication of instruction formats.

use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::isa::{InstructionFormat, InstructionRecord};

/// Distinct formats referenced by a record set, ordered by canonical name.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalog {
    formats: Vec<Arc<InstructionFormat>>,
    index: AHashMap<String, usize>,
}

impl FormatCatalog {
    /// Keys every record's format by canonical name; the first occurrence of a name is kept.
    pub fn canonicalize<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a InstructionRecord>,
    {
        let mut unique: AHashMap<String, Arc<InstructionFormat>> = AHashMap::new();
        let mut seen = 0usize;
        for record in records {
            seen += 1;
            unique
                .entry(record.format().name().to_string())
                .or_insert_with(|| Arc::clone(record.shared_format()));
        }

        let mut formats: Vec<Arc<InstructionFormat>> = unique.into_values().collect();
        formats.sort_by(|a, b| a.name().cmp(b.name()));
        let index = formats
            .iter()
            .enumerate()
            .map(|(position, format)| (format.name().to_string(), position))
            .collect();

        debug!(records = seen, formats = formats.len(), "format catalog built");
        Self { formats, index }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<InstructionFormat>> {
        self.position(name).map(|position| &self.formats[position])
    }

    /// Index of a format in emission order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<InstructionFormat>> {
        self.formats.iter()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mnemonic: &str, word: u32, format: &str) -> InstructionRecord {
        let format = Arc::new(InstructionFormat::parse(format).expect("format"));
        InstructionRecord::new(mnemonic, word, format, Vec::<String>::new()).expect("record")
    }

    #[test]
    fn records_sharing_a_layout_produce_one_entry() {
        let records = vec![
            record("add.w", 0x0010_0000, "DJK"),
            record("add.d", 0x0010_8000, "DJK"),
            record("sub.w", 0x0011_0000, "DJK"),
            record("addi.w", 0x0280_0000, "DJSk12"),
            record("ld.d", 0x28c0_0000, "DJSk12"),
            record("ertn", 0x0648_3800, "EMPTY"),
        ];
        let catalog = FormatCatalog::canonicalize(&records);
        assert_eq!(catalog.len(), 3, "three distinct signatures");
        let names: Vec<&str> = catalog.iter().map(|format| format.name()).collect();
        assert_eq!(names, vec!["DJK", "DJSk12", "EMPTY"]);
        assert_eq!(catalog.position("DJSk12"), Some(1));
        assert!(catalog.get("FdFjFk").is_none());
    }

    #[test]
    fn first_occurrence_is_kept() {
        let first = record("add.w", 0x0010_0000, "DJK");
        let second = record("add.d", 0x0010_8000, "DJK");
        let catalog = FormatCatalog::canonicalize([&first, &second]);
        let kept = catalog.get("DJK").expect("DJK");
        assert!(Arc::ptr_eq(kept, first.shared_format()));
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let mut records = vec![
            record("fadd.d", 0x0101_0000, "FdFjFk"),
            record("b", 0x5000_0000, "Sd10k16"),
            record("add.w", 0x0010_0000, "DJK"),
        ];
        let forward: Vec<String> = FormatCatalog::canonicalize(&records)
            .iter()
            .map(|format| format.name().to_string())
            .collect();
        records.reverse();
        let backward: Vec<String> = FormatCatalog::canonicalize(&records)
            .iter()
            .map(|format| format.name().to_string())
            .collect();
        assert_eq!(forward, backward);
    }
}
