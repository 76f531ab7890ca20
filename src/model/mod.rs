//! The generation model: everything a renderer needs, derived once from the record set.
//!
//! Building the model runs the whole one-pass pipeline: mnemonic table (rejecting duplicate
//! mnemonics), format catalog, slot combinations, and one validator and encoder plan per
//! catalog format. The model can also validate and encode operands in process, which is how
//! the plans are tested independently of any text output.

pub mod catalog;
pub mod combination;
pub mod encoder;
pub mod table;
pub mod validator;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::isa::{InstructionFormat, InstructionRecord, IsaError, RegisterExceptions};

pub use catalog::FormatCatalog;
pub use combination::{SlotCombination, SlotCombinationRegistry};
pub use encoder::{EncoderPlan, SlotExpr};
pub use table::{MnemonicTable, TableEntry};
pub use validator::{ArgCheck, BoundViolation, ValidatorPlan};

#[derive(Debug, Clone)]
pub struct GenerationModel {
    records: Vec<InstructionRecord>,
    catalog: FormatCatalog,
    combinations: SlotCombinationRegistry,
    validators: Vec<ValidatorPlan>,
    encoders: Vec<EncoderPlan>,
    table: MnemonicTable,
    exceptions: RegisterExceptions,
}

impl GenerationModel {
    pub fn build(
        mut records: Vec<InstructionRecord>,
        exceptions: RegisterExceptions,
    ) -> Result<Self, IsaError> {
        let table = MnemonicTable::build(&records)?;
        records.sort_by(|a, b| (a.word(), a.mnemonic()).cmp(&(b.word(), b.mnemonic())));

        let catalog = FormatCatalog::canonicalize(&records);
        let combinations = SlotCombinationRegistry::derive(&catalog);
        let validators = catalog
            .iter()
            .map(|format| ValidatorPlan::for_format(format))
            .collect();
        let encoders = catalog
            .iter()
            .map(|format| EncoderPlan::for_format(format))
            .collect();

        for (mnemonic, _) in exceptions.iter() {
            if table.get(mnemonic).is_none() {
                warn!(mnemonic, "register exception names an instruction outside the record set");
            }
        }

        info!(
            records = records.len(),
            formats = catalog.len(),
            combinations = combinations.len(),
            "generation model built"
        );
        Ok(Self {
            records,
            catalog,
            combinations,
            validators,
            encoders,
            table,
            exceptions,
        })
    }

    /// Records ordered by opcode bits, then mnemonic.
    pub fn records(&self) -> &[InstructionRecord] {
        &self.records
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn combinations(&self) -> &SlotCombinationRegistry {
        &self.combinations
    }

    pub fn table(&self) -> &MnemonicTable {
        &self.table
    }

    pub fn exceptions(&self) -> &RegisterExceptions {
        &self.exceptions
    }

    /// Catalog formats in emission order with their plans.
    pub fn plans(&self) -> impl Iterator<Item = (&InstructionFormat, &ValidatorPlan, &EncoderPlan)> {
        self.catalog
            .iter()
            .zip(&self.validators)
            .zip(&self.encoders)
            .map(|((format, validator), encoder)| (format.as_ref(), validator, encoder))
    }

    pub fn validator(&self, format: &str) -> Option<&ValidatorPlan> {
        self.catalog
            .position(format)
            .map(|position| &self.validators[position])
    }

    pub fn encoder(&self, format: &str) -> Option<&EncoderPlan> {
        self.catalog
            .position(format)
            .map(|position| &self.encoders[position])
    }

    pub fn record(&self, mnemonic: &str) -> Option<&InstructionRecord> {
        let entry = self.table.get(mnemonic)?;
        self.records
            .binary_search_by(|record| {
                (record.word(), record.mnemonic()).cmp(&(entry.bits, entry.mnemonic.as_str()))
            })
            .ok()
            .map(|position| &self.records[position])
    }

    /// Validates then packs `values` for `mnemonic`, exactly as the generated code would.
    pub fn encode(&self, mnemonic: &str, values: &[i64]) -> Result<u32, IsaError> {
        let record = self
            .record(mnemonic)
            .ok_or_else(|| IsaError::UnknownMnemonic {
                mnemonic: mnemonic.to_string(),
            })?;
        let format = record.format();
        let (Some(validator), Some(encoder)) =
            (self.validator(format.name()), self.encoder(format.name()))
        else {
            return Err(IsaError::UnknownMnemonic {
                mnemonic: mnemonic.to_string(),
            });
        };
        validator
            .validate(record, values, &self.exceptions)
            .map_err(|violation| match violation {
                BoundViolation::Arity { expected, actual } => IsaError::Arity {
                    mnemonic: mnemonic.to_string(),
                    expected,
                    actual,
                },
                violation => IsaError::Bound {
                    mnemonic: mnemonic.to_string(),
                    violation,
                },
            })?;
        Ok(encoder.encode(record.word(), values))
    }

    /// SHA-256 over the ordered record set; identifies the generator input in headers.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for record in &self.records {
            hasher.update(format!(
                "{:08x} {} {}",
                record.word(),
                record.mnemonic(),
                record.format().name()
            ));
            for attribute in record.attributes() {
                hasher.update(format!(" @{attribute}"));
            }
            hasher.update(b"\n");
        }
        hasher.finalize().into()
    }

    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hex_literal::hex;

    use super::*;
    use crate::isa::ArgKind;

    fn record(mnemonic: &str, word: u32, format: &str, attrs: &[&str]) -> InstructionRecord {
        let format = Arc::new(InstructionFormat::parse(format).expect("format"));
        InstructionRecord::new(mnemonic, word, format, attrs.iter().copied()).expect("record")
    }

    fn sample() -> Vec<InstructionRecord> {
        vec![
            record("jirl", 0x4c00_0000, "DJSk16", &["qemu"]),
            record("add.w", 0x0010_0000, "DJK", &["qemu"]),
            record("b", 0x5000_0000, "Sd10k16", &[]),
            record("ertn", 0x0648_3800, "EMPTY", &[]),
        ]
    }

    #[test]
    fn model_orders_records_and_aligns_plans() {
        let model = GenerationModel::build(sample(), RegisterExceptions::new()).expect("model");
        let order: Vec<&str> = model.records().iter().map(|r| r.mnemonic()).collect();
        assert_eq!(order, vec!["add.w", "ertn", "jirl", "b"]);
        for (format, validator, encoder) in model.plans() {
            assert_eq!(format.name(), validator.format_name());
            assert_eq!(format.name(), encoder.format_name());
        }
        assert_eq!(model.combinations().len(), 2);
    }

    #[test]
    fn encode_validates_before_packing() {
        let mut exceptions = RegisterExceptions::new();
        exceptions.exclude("jirl", ArgKind::IntReg, 2).expect("entry");
        let model = GenerationModel::build(sample(), exceptions).expect("model");

        assert_eq!(model.encode("add.w", &[1, 2, 3]).expect("add.w"), 0x0010_0c41);
        assert_eq!(model.encode("ertn", &[]).expect("ertn"), 0x0648_3800);
        assert_eq!(
            model.encode("jirl", &[1, 1, -1]).expect("jirl"),
            0x4c00_0000 | 1 | (1 << 5) | (0xffff << 10)
        );
        assert!(matches!(
            model.encode("jirl", &[2, 1, 0]),
            Err(IsaError::Bound { .. })
        ));
        assert!(matches!(
            model.encode("add.w", &[1, 2]),
            Err(IsaError::Arity {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            model.encode("sub.w", &[]),
            Err(IsaError::UnknownMnemonic { .. })
        ));
    }

    #[test]
    fn duplicate_mnemonics_abort_model_construction() {
        let mut records = sample();
        records.push(record("b", 0x5400_0000, "Sd10k16", &[]));
        assert!(matches!(
            GenerationModel::build(records, RegisterExceptions::new()),
            Err(IsaError::DuplicateMnemonic { .. })
        ));
    }

    #[test]
    fn fingerprint_covers_ordered_records() {
        let records = vec![
            record("add.w", 0x0010_0000, "DJK", &["qemu"]),
            record("ertn", 0x0648_3800, "EMPTY", &[]),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let a = GenerationModel::build(records, RegisterExceptions::new()).expect("model");
        let b = GenerationModel::build(reversed, RegisterExceptions::new()).expect("model");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            a.fingerprint(),
            hex!("a8b6df3c79ee39507454bf0b5b4f5edd2779873530af02c7389a44b9a4d8ff79")
        );
        assert_eq!(a.fingerprint_hex().len(), 64);
    }
}
