//! Go `cmd/internal/obj` assembler tables.
//!
//! The output plugs into a LoongArch backend that already provides the `instruction` type, the
//! `want*` operand checks, the `reg*` register converters and `encodingForAs`.

use std::collections::BTreeMap;

use tracing::debug;

use super::emitter::{Emitter, emitln};
use super::{Backend, Header, unique_identifiers};
use crate::isa::{ArgKind, Argument, InstructionFormat, InstructionRecord, IsaError};
use crate::model::{
    EncoderPlan, GenerationModel, MnemonicTable, SlotCombination, SlotExpr, ValidatorPlan,
};
use crate::tooling::ExternalFormatter;

const BACKEND: &str = "go-asm";

/// Renders every record; attribute filtering is left to the run configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoAsmBackend;

impl GoAsmBackend {
    pub fn new() -> Self {
        Self
    }
}

/// `slli.w` becomes `ASLLIW`.
pub fn opcode_name(mnemonic: &str) -> String {
    let mut name = String::with_capacity(mnemonic.len() + 1);
    name.push('A');
    name.extend(
        mnemonic
            .chars()
            .filter(|c| *c != '.' && *c != '_')
            .map(|c| c.to_ascii_uppercase()),
    );
    name
}

pub fn combinator_name(combination: &SlotCombination) -> String {
    let plural = if combination.len() > 1 { "s" } else { "" };
    format!("encode{}Slot{plural}", combination.code())
}

fn format_const(format: &str) -> String {
    format!("insnFormat{format}")
}

/// `instruction` struct field carrying each operand: registers by slot, immediates in order.
fn field_names(format: &InstructionFormat) -> Result<Vec<String>, IsaError> {
    let mut immediates = 0;
    format
        .args()
        .iter()
        .map(|arg| {
            if arg.kind().is_immediate() {
                immediates += 1;
                return Ok(format!("imm{immediates}"));
            }
            match arg.slots()[0].tag() {
                tag @ ('d' | 'j' | 'k' | 'a') => Ok(format!("r{tag}")),
                tag => Err(IsaError::UnsupportedOperand {
                    backend: BACKEND,
                    format: format.name().to_string(),
                    reason: format!("no instruction field holds a register in slot '{tag}'"),
                }),
            }
        })
        .collect()
}

fn converter(arg: &Argument, field: &str) -> String {
    match arg.kind() {
        ArgKind::IntReg => format!("regInt(insn.{field})"),
        ArgKind::FpReg => format!("regFP(insn.{field})"),
        ArgKind::FccReg => format!("regFCC(insn.{field})"),
        ArgKind::SignedImm | ArgKind::UnsignedImm => format!("uint32(insn.{field})"),
    }
}

fn class_const(kind: ArgKind) -> &'static str {
    match kind {
        ArgKind::FpReg => "regClassFP",
        ArgKind::FccReg => "regClassFCC",
        _ => "regClassInt",
    }
}

fn slot_expr(expr: &SlotExpr, var: &str) -> String {
    match (expr.shift, expr.mask) {
        (0, None) => var.to_string(),
        (0, Some(mask)) => format!("{var}&{mask:#x}"),
        (shift, Some(mask)) => format!("{var}>>{shift}&{mask:#x}"),
        (shift, None) => format!("{var}>>{shift}"),
    }
}

fn emit_header(out: &mut Emitter, header: &Header) {
    emitln!(
        out,
        "// Code generated by opcodegen from {}; DO NOT EDIT.",
        header.revision
    );
    emitln!(out, "// Input digest: sha256:{}", header.digest);
    out.empty_line();
    out.line("package loong");
    out.empty_line();
    out.line("import \"cmd/internal/obj\"");
    out.empty_line();
}

fn emit_format_enum(out: &mut Emitter, model: &GenerationModel) {
    out.line("type insnFormat int");
    out.empty_line();
    out.block("const (", ")", |out| {
        out.line("insnFormatUnknown insnFormat = iota");
        for format in model.catalog().iter() {
            out.line(format_const(format.name()));
        }
    });
    out.empty_line();
}

fn emit_validator(
    out: &mut Emitter,
    format: &InstructionFormat,
    plan: &ValidatorPlan,
    fields: &[String],
) {
    out.block(
        format!("func validate{}(insn *instruction) error {{", format.name()),
        "}",
        |out| {
            for (check, field) in plan.checks().iter().zip(fields) {
                let call = match check.kind {
                    ArgKind::IntReg => format!("wantIntReg(insn.as, insn.{field})"),
                    ArgKind::FpReg => format!("wantFPReg(insn.as, insn.{field})"),
                    ArgKind::FccReg => format!("wantFCCReg(insn.as, insn.{field})"),
                    ArgKind::SignedImm => {
                        format!("wantSignedImm(insn.as, insn.{field}, {})", check.width)
                    }
                    ArgKind::UnsignedImm => {
                        format!("wantUnsignedImm(insn.as, insn.{field}, {})", check.width)
                    }
                };
                out.block(format!("if err := {call}; err != nil {{"), "}", |out| {
                    out.line("return err");
                });
            }
            out.line("return nil");
        },
    );
    out.empty_line();
}

fn emit_validator_table(out: &mut Emitter, model: &GenerationModel) {
    out.block("var validators = [...]func(*instruction) error{", "}", |out| {
        for format in model.catalog().iter() {
            emitln!(
                out,
                "{}: validate{},",
                format_const(format.name()),
                format.name()
            );
        }
    });
    out.empty_line();
}

fn emit_register_exclusions(
    out: &mut Emitter,
    model: &GenerationModel,
    opcodes: &BTreeMap<&str, String>,
) {
    out.line("type regClass int");
    out.empty_line();
    out.block("const (", ")", |out| {
        out.line("regClassInt regClass = iota");
        out.line("regClassFP");
        out.line("regClassFCC");
    });
    out.empty_line();
    out.block("type regExclusion struct {", "}", |out| {
        out.line("as    obj.As");
        out.line("class regClass");
        out.line("reg   uint32");
    });
    out.empty_line();

    let entries: Vec<_> = model
        .exceptions()
        .iter()
        .filter_map(|(mnemonic, exception)| {
            opcodes.get(mnemonic).map(|opcode| (opcode, exception))
        })
        .collect();
    if entries.is_empty() {
        out.line("var regExclusions = []regExclusion{}");
    } else {
        out.block("var regExclusions = []regExclusion{", "}", |out| {
            for (opcode, exception) in entries {
                emitln!(
                    out,
                    "{{as: {opcode}, class: {}, reg: {}}},",
                    class_const(exception.kind),
                    exception.register
                );
            }
        });
    }
    out.empty_line();
}

fn emit_combinator(out: &mut Emitter, combination: &SlotCombination) {
    let tags: Vec<char> = combination
        .code()
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let params: String = tags.iter().map(|tag| format!(", {tag} uint32")).collect();
    let mut body = String::from("return bits");
    for (tag, offset) in tags.iter().zip(combination.offsets()) {
        if *offset == 0 {
            body.push_str(&format!(" | {tag}"));
        } else {
            body.push_str(&format!(" | {tag}<<{offset}"));
        }
    }
    out.block(
        format!(
            "func {}(bits uint32{params}) uint32 {{",
            combinator_name(combination)
        ),
        "}",
        |out| out.line(body),
    );
    out.empty_line();
}

fn emit_encodings(out: &mut Emitter, table: &MnemonicTable) {
    out.block("type encoding struct {", "}", |out| {
        out.line("bits uint32");
        out.line("fmt  insnFormat");
    });
    out.empty_line();
    out.block("var encodings = [ALAST & obj.AMask]encoding{", "}", |out| {
        for entry in table.iter() {
            emitln!(
                out,
                "{} & obj.AMask: {{bits: {:#010x}, fmt: {}}},",
                opcode_name(&entry.mnemonic),
                entry.bits,
                format_const(entry.format.name())
            );
        }
    });
    out.empty_line();
}

fn emit_dispatch_case(
    out: &mut Emitter,
    format: &InstructionFormat,
    plan: &EncoderPlan,
    fields: &[String],
) {
    emitln!(out, "case {}:", format_const(format.name()));
    out.indent(|out| {
        let Some(combination) = plan.combination() else {
            out.line("return enc.bits, nil");
            return;
        };
        let vars: Vec<String> = plan.args().iter().map(Argument::param_name).collect();
        for ((arg, field), var) in plan.args().iter().zip(fields).zip(&vars) {
            emitln!(out, "{var} := {}", converter(arg, field));
        }
        let exprs: Vec<String> = plan
            .exprs()
            .iter()
            .map(|expr| slot_expr(expr, &vars[expr.arg]))
            .collect();
        emitln!(
            out,
            "return {}(enc.bits, {}), nil",
            combinator_name(combination),
            exprs.join(", ")
        );
    });
}

impl Backend for GoAsmBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn selects(&self, _record: &InstructionRecord) -> bool {
        true
    }

    fn render(
        &self,
        model: &GenerationModel,
        header: &Header,
        out: &mut Emitter,
    ) -> Result<(), IsaError> {
        let opcodes = unique_identifiers(
            BACKEND,
            model.records().iter().map(InstructionRecord::mnemonic),
            opcode_name,
        )?;
        let fields = model
            .catalog()
            .iter()
            .map(|format| field_names(format))
            .collect::<Result<Vec<_>, _>>()?;
        emit_header(out, header);
        emit_format_enum(out, model);
        for ((format, validator, _), fields) in model.plans().zip(&fields) {
            emit_validator(out, format, validator, fields);
        }
        emit_validator_table(out, model);
        emit_register_exclusions(out, model, &opcodes);
        for combination in model.combinations().iter() {
            emit_combinator(out, combination);
        }
        emit_encodings(out, model.table());

        out.block("func (insn *instruction) encode() (uint32, error) {", "}", |out| {
            out.line("enc, err := encodingForAs(insn.as)");
            out.block("if enc == nil {", "}", |out| out.line("return 0, err"));
            out.empty_line();
            out.line("switch enc.fmt {");
            for ((format, _, encoder), fields) in model.plans().zip(&fields) {
                emit_dispatch_case(out, format, encoder, fields);
            }
            out.line("default:");
            out.indent(|out| out.line("panic(\"should never happen: unknown insn format\")"));
            out.line("}");
        });

        debug!(
            backend = BACKEND,
            records = model.table().len(),
            formats = model.catalog().len(),
            "rendered"
        );
        Ok(())
    }

    fn formatter(&self) -> ExternalFormatter {
        ExternalFormatter::gofmt()
    }
}
