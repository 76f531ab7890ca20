//! Per-instruction register exclusions layered over the class-wide register ranges.
//!
//! A register class accepts every index its slot can hold. Some instructions forbid specific
//! registers (for example a reserved link register); those are listed here keyed by mnemonic.
//! The table is empty unless the caller fills it.

use std::collections::{BTreeMap, BTreeSet};

use super::argument::ArgKind;
use super::error::IsaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegisterException {
    pub kind: ArgKind,
    pub register: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterExceptions {
    entries: BTreeMap<String, BTreeSet<RegisterException>>,
}

impl RegisterExceptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(
        &mut self,
        mnemonic: impl Into<String>,
        kind: ArgKind,
        register: u32,
    ) -> Result<&mut Self, IsaError> {
        let width = kind
            .rule()
            .register_width
            .ok_or(IsaError::NotARegister { kind })?;
        let mnemonic = mnemonic.into();
        if register >= 1u32 << width {
            return Err(IsaError::InvalidException {
                entry: format!("{mnemonic}:{kind}:{register}"),
                reason: format!("{kind} has only {} registers", 1u32 << width),
            });
        }
        self.entries
            .entry(mnemonic)
            .or_default()
            .insert(RegisterException { kind, register });
        Ok(self)
    }

    /// Parses and records a `MNEMONIC:CLASS:INDEX` entry, e.g. `jirl:gpr:2`.
    pub fn exclude_entry(&mut self, entry: &str) -> Result<&mut Self, IsaError> {
        let invalid = |reason: &str| IsaError::InvalidException {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };
        let mut parts = entry.split(':');
        let (Some(mnemonic), Some(class), Some(index), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected MNEMONIC:CLASS:INDEX"));
        };
        if mnemonic.is_empty() {
            return Err(invalid("mnemonic is empty"));
        }
        let kind = match class.to_ascii_lowercase().as_str() {
            "gpr" | "int" => ArgKind::IntReg,
            "fpr" | "fp" => ArgKind::FpReg,
            "fcc" => ArgKind::FccReg,
            _ => return Err(invalid("register class must be one of gpr, fpr, fcc")),
        };
        let register = index
            .trim_start_matches(['r', 'f'])
            .parse::<u32>()
            .map_err(|_| invalid("register index is not a number"))?;
        self.exclude(mnemonic, kind, register)
    }

    pub fn is_excluded(&self, mnemonic: &str, kind: ArgKind, register: i64) -> bool {
        let Ok(register) = u32::try_from(register) else {
            return false;
        };
        self.entries
            .get(mnemonic)
            .is_some_and(|set| set.contains(&RegisterException { kind, register }))
    }

    pub fn for_mnemonic<'a>(
        &'a self,
        mnemonic: &str,
    ) -> impl Iterator<Item = &'a RegisterException> + 'a {
        self.entries.get(mnemonic).into_iter().flatten()
    }

    /// All entries ordered by mnemonic, then class, then index.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisterException)> {
        self.entries
            .iter()
            .flat_map(|(mnemonic, set)| set.iter().map(move |entry| (mnemonic.as_str(), entry)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusions_apply_only_to_named_instruction() {
        let mut table = RegisterExceptions::new();
        table.exclude("jirl", ArgKind::IntReg, 2).expect("gpr 2");
        assert!(table.is_excluded("jirl", ArgKind::IntReg, 2));
        assert!(!table.is_excluded("jirl", ArgKind::IntReg, 3));
        assert!(!table.is_excluded("jirl", ArgKind::FpReg, 2));
        assert!(!table.is_excluded("add.w", ArgKind::IntReg, 2));
        assert!(!table.is_excluded("jirl", ArgKind::IntReg, -2));
    }

    #[test]
    fn parses_cli_style_entries() {
        let mut table = RegisterExceptions::new();
        table.exclude_entry("bceqz:fcc:7").expect("fcc entry");
        table.exclude_entry("jirl:gpr:r1").expect("gpr entry");
        let listed: Vec<_> = table
            .iter()
            .map(|(mnemonic, entry)| (mnemonic.to_string(), entry.kind, entry.register))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("bceqz".to_string(), ArgKind::FccReg, 7),
                ("jirl".to_string(), ArgKind::IntReg, 1),
            ]
        );
    }

    #[test]
    fn rejects_malformed_or_out_of_class_entries() {
        let mut table = RegisterExceptions::new();
        assert!(table.exclude_entry("jirl:gpr").is_err());
        assert!(table.exclude_entry("jirl:vec:1").is_err());
        assert!(table.exclude_entry("jirl:gpr:x").is_err());
        assert!(table.exclude_entry("bceqz:fcc:8").is_err(), "fcc has eight registers");
        assert!(matches!(
            table.exclude("addi.w", ArgKind::SignedImm, 0),
            Err(IsaError::NotARegister { .. })
        ));
        assert!(table.is_empty());
    }
}
