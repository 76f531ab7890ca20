//! Typed operands and the per-kind rule table consulted by validation and packing.

use std::fmt;

use bitflags::bitflags;
use smallvec::SmallVec;

use super::error::IsaError;
use super::slot::{self, Slot, mask_for_width};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ArgClass: u8 {
        const REGISTER = 0b001;
        const IMMEDIATE = 0b010;
        const SIGNED = 0b100;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgKind {
    IntReg,
    FpReg,
    FccReg,
    SignedImm,
    UnsignedImm,
}

/// Everything that varies by argument kind. New kinds are added here and nowhere else in the
/// model; renderers only map kinds to dialect spellings.
pub struct KindRule {
    pub kind: ArgKind,
    pub name: &'static str,
    /// Canonical-name prefix; general purpose registers have none and use an upper-case tag.
    pub prefix: &'static str,
    pub class: ArgClass,
    pub register_width: Option<u8>,
    bounds: fn(u8) -> (i64, i64),
    pack: fn(i64, u8) -> u32,
}

static KIND_RULES: [KindRule; 5] = [
    KindRule {
        kind: ArgKind::IntReg,
        name: "GPR",
        prefix: "",
        class: ArgClass::REGISTER,
        register_width: Some(5),
        bounds: unsigned_bounds,
        pack: pack_unsigned,
    },
    KindRule {
        kind: ArgKind::FpReg,
        name: "FPR",
        prefix: "F",
        class: ArgClass::REGISTER,
        register_width: Some(5),
        bounds: unsigned_bounds,
        pack: pack_unsigned,
    },
    KindRule {
        kind: ArgKind::FccReg,
        name: "FCC",
        prefix: "C",
        class: ArgClass::REGISTER,
        register_width: Some(3),
        bounds: unsigned_bounds,
        pack: pack_unsigned,
    },
    KindRule {
        kind: ArgKind::SignedImm,
        name: "signed immediate",
        prefix: "S",
        class: ArgClass::IMMEDIATE.union(ArgClass::SIGNED),
        register_width: None,
        bounds: signed_bounds,
        pack: pack_signed,
    },
    KindRule {
        kind: ArgKind::UnsignedImm,
        name: "unsigned immediate",
        prefix: "U",
        class: ArgClass::IMMEDIATE,
        register_width: None,
        bounds: unsigned_bounds,
        pack: pack_unsigned,
    },
];

fn unsigned_bounds(width: u8) -> (i64, i64) {
    (0, i64::from(mask_for_width(width)))
}

fn signed_bounds(width: u8) -> (i64, i64) {
    if width == 0 {
        return (0, 0);
    }
    let half = 1i64 << (width - 1);
    (-half, half - 1)
}

fn pack_unsigned(value: i64, _width: u8) -> u32 {
    value as u32
}

fn pack_signed(value: i64, width: u8) -> u32 {
    (value as u32) & mask_for_width(width)
}

impl ArgKind {
    pub const ALL: [ArgKind; 5] = [
        ArgKind::IntReg,
        ArgKind::FpReg,
        ArgKind::FccReg,
        ArgKind::SignedImm,
        ArgKind::UnsignedImm,
    ];

    pub fn rule(self) -> &'static KindRule {
        &KIND_RULES[self as usize]
    }

    pub fn class(self) -> ArgClass {
        self.rule().class
    }

    pub fn is_register(self) -> bool {
        self.class().contains(ArgClass::REGISTER)
    }

    pub fn is_immediate(self) -> bool {
        self.class().contains(ArgClass::IMMEDIATE)
    }

    pub fn is_signed(self) -> bool {
        self.class().contains(ArgClass::SIGNED)
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule().name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Argument {
    kind: ArgKind,
    slots: SmallVec<[Slot; 2]>,
}

impl Argument {
    pub fn new<I>(kind: ArgKind, slots: I) -> Result<Self, IsaError>
    where
        I: IntoIterator<Item = Slot>,
    {
        let slots: SmallVec<[Slot; 2]> = slots.into_iter().collect();
        if slots.is_empty() {
            return Err(IsaError::EmptyArgument { kind });
        }
        if let Some(width) = kind.rule().register_width
            && (slots.len() != 1 || slots[0].width() != width)
        {
            return Err(IsaError::RegisterShape {
                kind,
                expected_width: width,
                slots: slots.len(),
            });
        }
        slot::ensure_disjoint(&slots)?;
        Ok(Self { kind, slots })
    }

    /// Register operand in the slot named by `tag`, sized by its register class.
    pub fn register(kind: ArgKind, tag: char) -> Result<Self, IsaError> {
        let width = kind
            .rule()
            .register_width
            .ok_or(IsaError::NotARegister { kind })?;
        Self::new(kind, [Slot::tagged(tag, width)?])
    }

    /// Immediate operand from `(tag, width)` pairs, most significant fragment first.
    pub fn immediate(kind: ArgKind, parts: &[(char, u8)]) -> Result<Self, IsaError> {
        let slots = parts
            .iter()
            .map(|(tag, width)| Slot::tagged(*tag, *width))
            .collect::<Result<SmallVec<[Slot; 2]>, _>>()?;
        Self::new(kind, slots)
    }

    pub fn kind(&self) -> ArgKind {
        self.kind
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn is_split(&self) -> bool {
        self.slots.len() > 1
    }

    pub fn total_width(&self) -> u8 {
        slot::total_width(&self.slots)
    }

    /// Inclusive value range accepted for this operand, ignoring per-instruction exceptions.
    pub fn bounds(&self) -> (i64, i64) {
        (self.kind.rule().bounds)(self.total_width())
    }

    /// Converts an operand value to the unsigned bit pattern stored in the word.
    pub fn pack(&self, value: i64) -> u32 {
        (self.kind.rule().pack)(value, self.total_width())
    }

    pub fn canonical_repr(&self) -> String {
        let rule = self.kind.rule();
        let mut repr = String::from(rule.prefix);
        match self.kind {
            ArgKind::IntReg => repr.push(self.slots[0].tag().to_ascii_uppercase()),
            ArgKind::FpReg | ArgKind::FccReg => repr.push(self.slots[0].tag()),
            ArgKind::SignedImm | ArgKind::UnsignedImm => {
                for slot in &self.slots {
                    repr.push(slot.tag());
                    repr.push_str(&slot.width().to_string());
                }
            }
        }
        repr
    }

    /// Lower-cased canonical repr, used as the operand's parameter name.
    pub fn param_name(&self) -> String {
        self.canonical_repr().to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_is_indexed_by_kind() {
        for kind in ArgKind::ALL {
            assert_eq!(kind.rule().kind, kind, "rule slot for {kind:?}");
        }
    }

    #[test]
    fn canonical_reprs_follow_kind_prefixes() {
        let d = Argument::register(ArgKind::IntReg, 'd').expect("gpr");
        let fj = Argument::register(ArgKind::FpReg, 'j').expect("fpr");
        let ca = Argument::register(ArgKind::FccReg, 'a').expect("fcc");
        let offs = Argument::immediate(ArgKind::SignedImm, &[('d', 5), ('k', 16)]).expect("simm");
        let ui = Argument::immediate(ArgKind::UnsignedImm, &[('k', 12)]).expect("uimm");

        assert_eq!(d.canonical_repr(), "D");
        assert_eq!(fj.canonical_repr(), "Fj");
        assert_eq!(ca.canonical_repr(), "Ca");
        assert_eq!(offs.canonical_repr(), "Sd5k16");
        assert_eq!(offs.param_name(), "sd5k16");
        assert_eq!(ui.canonical_repr(), "Uk12");
        assert_eq!(offs.total_width(), 21);
        assert!(offs.is_split());
    }

    #[test]
    fn register_operands_must_match_class_width() {
        let slot = Slot::tagged('d', 4).expect("slot");
        let err = Argument::new(ArgKind::IntReg, [slot]).expect_err("gpr is 5 bits");
        assert!(matches!(
            err,
            IsaError::RegisterShape {
                kind: ArgKind::IntReg,
                expected_width: 5,
                slots: 1
            }
        ));
        assert!(matches!(
            Argument::new(ArgKind::UnsignedImm, []),
            Err(IsaError::EmptyArgument { .. })
        ));
    }

    #[test]
    fn bounds_depend_on_signedness() {
        let s12 = Argument::immediate(ArgKind::SignedImm, &[('k', 12)]).expect("s12");
        let u12 = Argument::immediate(ArgKind::UnsignedImm, &[('k', 12)]).expect("u12");
        let fcc = Argument::register(ArgKind::FccReg, 'd').expect("fcc");
        assert_eq!(s12.bounds(), (-2048, 2047));
        assert_eq!(u12.bounds(), (0, 4095));
        assert_eq!(fcc.bounds(), (0, 7));
    }

    #[test]
    fn signed_values_pack_as_twos_complement() {
        let s12 = Argument::immediate(ArgKind::SignedImm, &[('k', 12)]).expect("s12");
        assert_eq!(s12.pack(-1), 0xfff);
        assert_eq!(s12.pack(-2048), 0x800);
        assert_eq!(s12.pack(2047), 0x7ff);
        let u5 = Argument::immediate(ArgKind::UnsignedImm, &[('k', 5)]).expect("u5");
        assert_eq!(u5.pack(31), 31);
    }
}
