//! Per-format packing of operand values into the instruction word.
//!
//! Each operand contributes one [`SlotExpr`] per slot it occupies. Split operands are cut
//! MSB first: with `remaining` starting at the operand width, every slot of width `w` takes
//! `(value >> (remaining - w)) & mask(w)`. The expressions are kept in offset order so they
//! line up with the parameters of the shared [`SlotCombination`] combinator.

use smallvec::SmallVec;

use crate::isa::slot::{self, mask_for_width};
use crate::isa::{Argument, InstructionFormat};

use super::combination::SlotCombination;

/// `(operand >> shift) & mask`, destined for the slot at `offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotExpr {
    pub offset: u8,
    pub arg: usize,
    pub shift: u8,
    pub mask: Option<u32>,
}

impl SlotExpr {
    pub fn evaluate(&self, operand: u32) -> u32 {
        let shifted = operand >> self.shift;
        match self.mask {
            Some(mask) => shifted & mask,
            None => shifted,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderPlan {
    format: String,
    args: Vec<Argument>,
    exprs: Vec<SlotExpr>,
    combination: Option<SlotCombination>,
}

impl EncoderPlan {
    pub fn for_format(format: &InstructionFormat) -> Self {
        let mut exprs = Vec::new();
        for (index, arg) in format.args().iter().enumerate() {
            if let [only] = arg.slots() {
                // Signed operands are sign-extended in the caller's integer; keep only the
                // bits that belong to the slot.
                let mask = arg
                    .kind()
                    .is_signed()
                    .then(|| mask_for_width(arg.total_width()));
                exprs.push(SlotExpr {
                    offset: only.offset(),
                    arg: index,
                    shift: 0,
                    mask,
                });
                continue;
            }
            for fragment in slot::fragments(arg.slots()) {
                exprs.push(SlotExpr {
                    offset: fragment.slot.offset(),
                    arg: index,
                    shift: fragment.shift,
                    mask: Some(fragment.mask),
                });
            }
        }
        exprs.sort_by_key(|expr| expr.offset);

        Self {
            format: format.name().to_string(),
            args: format.args().to_vec(),
            exprs,
            combination: SlotCombination::for_format(format),
        }
    }

    pub fn format_name(&self) -> &str {
        &self.format
    }

    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Slot expressions in offset order, matching the combinator's parameters.
    pub fn exprs(&self) -> &[SlotExpr] {
        &self.exprs
    }

    pub fn combination(&self) -> Option<&SlotCombination> {
        self.combination.as_ref()
    }

    /// Packs already-validated operands into `base`. Performs no bound checks.
    ///
    /// # Panics
    ///
    /// If `values` holds fewer operands than the format has arguments; run the format's
    /// [`ValidatorPlan`](super::ValidatorPlan) first.
    pub fn encode(&self, base: u32, values: &[i64]) -> u32 {
        let Some(combination) = &self.combination else {
            return base;
        };
        let packed: SmallVec<[u32; 4]> = self
            .args
            .iter()
            .zip(values)
            .map(|(arg, value)| arg.pack(*value))
            .collect();
        let fragments: SmallVec<[u32; 6]> = self
            .exprs
            .iter()
            .map(|expr| expr.evaluate(packed[expr.arg]))
            .collect();
        combination.combine(base, &fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str) -> EncoderPlan {
        EncoderPlan::for_format(&InstructionFormat::parse(name).expect("format"))
    }

    #[test]
    fn two_register_scenario() {
        let dj = plan("DJ");
        assert_eq!(dj.encode(0x1000_0000, &[3, 7]), 0x1000_0000 | 3 | (7 << 5));
        assert_eq!(dj.encode(0x1000_0000, &[3, 7]), 0x1000_00e3);
    }

    #[test]
    fn empty_format_returns_base_bits() {
        let empty = plan("EMPTY");
        assert!(empty.combination().is_none());
        assert_eq!(empty.encode(0x0648_3800, &[]), 0x0648_3800);
    }

    #[test]
    fn split_operand_expressions_are_ordered_by_offset() {
        let beqz = plan("JSd5k16");
        let exprs = beqz.exprs();
        assert_eq!(
            exprs,
            &[
                SlotExpr {
                    offset: 0,
                    arg: 1,
                    shift: 16,
                    mask: Some(0x1f)
                },
                SlotExpr {
                    offset: 5,
                    arg: 0,
                    shift: 0,
                    mask: None
                },
                SlotExpr {
                    offset: 10,
                    arg: 1,
                    shift: 0,
                    mask: Some(0xffff)
                },
            ]
        );
        assert_eq!(beqz.combination().map(SlotCombination::code), Some("DJK"));
    }

    #[test]
    fn split_signed_offset_packs_twos_complement() {
        // b -4: offs[25:16] in slot d, offs[15:0] in slot k.
        let b = plan("Sd10k16");
        let word = b.encode(0x5000_0000, &[-4]);
        assert_eq!(word, 0x5000_0000 | 0x3ff | (0xfffc << 10));

        let beqz = plan("JSd5k16");
        let word = beqz.encode(0x4000_0000, &[4, 0x155555]);
        assert_eq!(word, 0x4000_0000 | 0x15 | (4 << 5) | (0x5555 << 10));
    }

    #[test]
    fn single_slot_signed_immediate_is_masked() {
        let addi = plan("DJSk12");
        assert_eq!(addi.exprs()[2].mask, Some(0xfff));
        assert_eq!(
            addi.encode(0x02c0_0000, &[4, 5, -1]),
            0x02c0_0000 | 4 | (5 << 5) | (0xfff << 10)
        );
        assert_eq!(plan("DJUk12").exprs()[2].mask, None);
    }

    #[test]
    fn encoded_operands_never_touch_opcode_bits() {
        let bstrpick = plan("DJUm6Uk6");
        let base = 0x00c0_0000;
        let word = bstrpick.encode(base, &[31, 31, 63, 63]);
        assert_eq!(word & 0xffc0_0000, base, "opcode bits preserved");
        assert_eq!(word & 0x003f_ffff, 0x003f_ffff);
    }

    #[test]
    #[should_panic]
    fn missing_operands_are_a_caller_error() {
        plan("DJK").encode(0x0010_0000, &[1]);
    }
}
