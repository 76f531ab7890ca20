//! Per-format operand bound checks.
//!
//! A [`ValidatorPlan`] is computed once per catalog format. Renderers turn its checks into
//! dialect code and [`ValidatorPlan::validate`] evaluates the same checks in process.

use thiserror::Error;

use crate::isa::{ArgKind, InstructionFormat, InstructionRecord, RegisterExceptions};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundViolation {
    #[error("expected {expected} operands, got {actual}")]
    Arity { expected: usize, actual: usize },
    #[error("operand {index} ({param}): {value} is outside the {kind} range [{min}, {max}]")]
    OutOfRange {
        index: usize,
        param: String,
        kind: ArgKind,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("operand {index} ({param}): {kind} {value} is not permitted by this instruction")]
    ExcludedRegister {
        index: usize,
        param: String,
        kind: ArgKind,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgCheck {
    pub index: usize,
    pub param: String,
    pub kind: ArgKind,
    pub width: u8,
    pub min: i64,
    pub max: i64,
}

impl ArgCheck {
    fn check(
        &self,
        mnemonic: &str,
        value: i64,
        exceptions: &RegisterExceptions,
    ) -> Result<(), BoundViolation> {
        if value < self.min || value > self.max {
            return Err(BoundViolation::OutOfRange {
                index: self.index,
                param: self.param.clone(),
                kind: self.kind,
                value,
                min: self.min,
                max: self.max,
            });
        }
        if self.kind.is_register() && exceptions.is_excluded(mnemonic, self.kind, value) {
            return Err(BoundViolation::ExcludedRegister {
                index: self.index,
                param: self.param.clone(),
                kind: self.kind,
                value,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorPlan {
    format: String,
    checks: Vec<ArgCheck>,
}

impl ValidatorPlan {
    pub fn for_format(format: &InstructionFormat) -> Self {
        let checks = format
            .args()
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                let (min, max) = arg.bounds();
                ArgCheck {
                    index,
                    param: arg.param_name(),
                    kind: arg.kind(),
                    width: arg.total_width(),
                    min,
                    max,
                }
            })
            .collect();
        Self {
            format: format.name().to_string(),
            checks,
        }
    }

    pub fn format_name(&self) -> &str {
        &self.format
    }

    pub fn checks(&self) -> &[ArgCheck] {
        &self.checks
    }

    /// Checks the operand count, then each operand in declaration order, and reports the
    /// first offender only.
    pub fn validate(
        &self,
        record: &InstructionRecord,
        values: &[i64],
        exceptions: &RegisterExceptions,
    ) -> Result<(), BoundViolation> {
        if values.len() != self.checks.len() {
            return Err(BoundViolation::Arity {
                expected: self.checks.len(),
                actual: values.len(),
            });
        }
        self.checks
            .iter()
            .zip(values)
            .try_for_each(|(check, value)| check.check(record.mnemonic(), *value, exceptions))
    }
}
