//! QEMU TCG emitter definitions for the LoongArch host backend.

use tracing::debug;

use super::emitter::{Emitter, emitln};
use super::{Backend, Header, unique_identifiers};
use crate::isa::{ArgKind, Argument, InstructionFormat, InstructionRecord, IsaError};
use crate::model::{ArgCheck, EncoderPlan, GenerationModel, SlotCombination, SlotExpr};
use crate::tooling::ExternalFormatter;

const BACKEND: &str = "qemu-tcg";
const DEFAULT_ATTRIBUTE: &str = "qemu";
const UNUSED: &str = "__attribute__((unused))";

/// Only instructions the TCG backend actually emits are generated, selected by attribute tag.
#[derive(Clone, Debug)]
pub struct QemuTcgBackend {
    required_attribute: String,
}

impl QemuTcgBackend {
    pub fn new() -> Self {
        Self {
            required_attribute: DEFAULT_ATTRIBUTE.to_string(),
        }
    }
}

impl Default for QemuTcgBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// `amadd_db.w` becomes `OPC_AMADD_DB_W`.
pub fn opcode_name(mnemonic: &str) -> String {
    format!("OPC_{}", mnemonic.replace('.', "_").to_ascii_uppercase())
}

pub fn combinator_name(combination: &SlotCombination) -> String {
    let plural = if combination.len() > 1 { "s" } else { "" };
    format!(
        "encode_{}_slot{plural}",
        combination.code().to_ascii_lowercase()
    )
}

fn format_encoder_name(format: &InstructionFormat) -> String {
    format!("encode_{}_insn", format.name().to_ascii_lowercase())
}

fn c_type(arg: &Argument) -> &'static str {
    match arg.kind() {
        ArgKind::IntReg | ArgKind::FpReg | ArgKind::FccReg => "TCGReg",
        ArgKind::SignedImm => "int32_t",
        ArgKind::UnsignedImm => "uint32_t",
    }
}

fn params(args: &[Argument]) -> String {
    args.iter()
        .map(|arg| format!(", {} {}", c_type(arg), arg.param_name()))
        .collect()
}

fn bound_assertion(check: &ArgCheck) -> String {
    let name = &check.param;
    match check.kind {
        ArgKind::SignedImm => format!(
            "{name} >= -{:#x} && {name} <= {:#x}",
            check.min.unsigned_abs(),
            check.max
        ),
        ArgKind::UnsignedImm => format!("{name} <= {:#x}", check.max),
        ArgKind::IntReg | ArgKind::FpReg | ArgKind::FccReg => {
            format!("{name} >= 0 && {name} <= {:#x}", check.max)
        }
    }
}

fn slot_expr(expr: &SlotExpr, var: &str) -> String {
    match (expr.shift, expr.mask) {
        (0, None) => var.to_string(),
        (0, Some(mask)) => format!("{var} & {mask:#x}"),
        (shift, Some(mask)) => format!("({var} >> {shift}) & {mask:#x}"),
        (shift, None) => format!("{var} >> {shift}"),
    }
}

fn emit_header(out: &mut Emitter, header: &Header) {
    out.line("/* SPDX-License-Identifier: MIT */");
    out.line("/*");
    out.line(" * LoongArch instruction formats, opcodes, and encoders for TCG use.");
    out.line(" *");
    emitln!(
        out,
        " * This file is auto-generated by opcodegen from revision {}.",
        header.revision
    );
    emitln!(out, " * Input digest: sha256:{}", header.digest);
    out.line(" * DO NOT EDIT.");
    out.line(" */");
}

fn emit_opcode_enum(out: &mut Emitter, model: &GenerationModel) {
    out.empty_line();
    out.block("typedef enum {", "} LoongArchInsn;", |out| {
        for record in model.records() {
            emitln!(
                out,
                "{} = {:#010x},",
                opcode_name(record.mnemonic()),
                record.word()
            );
        }
    });
}

fn emit_combinator(out: &mut Emitter, combination: &SlotCombination) {
    let tags: Vec<char> = combination
        .code()
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let params: String = tags.iter().map(|tag| format!(", uint32_t {tag}")).collect();
    let mut body = String::from("return opc");
    for (tag, offset) in tags.iter().zip(combination.offsets()) {
        if *offset == 0 {
            body.push_str(&format!(" | {tag}"));
        } else {
            body.push_str(&format!(" | {tag} << {offset}"));
        }
    }
    body.push(';');

    out.empty_line();
    emitln!(out, "static int32_t {UNUSED}");
    emitln!(out, "{}(LoongArchInsn opc{params})", combinator_name(combination));
    out.block("{", "}", |out| out.line(body));
}

fn emit_format_encoder(
    out: &mut Emitter,
    model: &GenerationModel,
    format: &InstructionFormat,
    encoder: &EncoderPlan,
) {
    let Some(combination) = encoder.combination() else {
        return;
    };
    let Some(validator) = model.validator(format.name()) else {
        return;
    };
    let vars: Vec<String> = encoder.args().iter().map(Argument::param_name).collect();
    let exprs: Vec<String> = encoder
        .exprs()
        .iter()
        .map(|expr| slot_expr(expr, &vars[expr.arg]))
        .collect();

    out.empty_line();
    emitln!(out, "static int32_t {UNUSED}");
    emitln!(
        out,
        "{}(LoongArchInsn opc{})",
        format_encoder_name(format),
        params(encoder.args())
    );
    out.block("{", "}", |out| {
        for check in validator.checks() {
            emitln!(out, "tcg_debug_assert({});", bound_assertion(check));
        }
        emitln!(
            out,
            "return {}(opc, {});",
            combinator_name(combination),
            exprs.join(", ")
        );
    });
}

fn emit_instruction(out: &mut Emitter, model: &GenerationModel, record: &InstructionRecord) {
    let opcode = opcode_name(record.mnemonic());
    let format = record.format();

    out.empty_line();
    emitln!(out, "/* Emits the `{}` instruction.  */", record.syntax());
    emitln!(out, "static void {UNUSED}");
    emitln!(
        out,
        "tcg_out_{}(TCGContext *s{})",
        opcode.to_ascii_lowercase(),
        params(format.args())
    );
    out.block("{", "}", |out| {
        for exception in model.exceptions().for_mnemonic(record.mnemonic()) {
            for arg in format.args().iter().filter(|arg| arg.kind() == exception.kind) {
                emitln!(
                    out,
                    "tcg_debug_assert({} != {});",
                    arg.param_name(),
                    exception.register
                );
            }
        }
        if format.is_empty() {
            emitln!(out, "tcg_out32(s, {opcode});");
            return;
        }
        let args: String = format
            .args()
            .iter()
            .map(|arg| format!(", {}", arg.param_name()))
            .collect();
        emitln!(
            out,
            "tcg_out32(s, {}({opcode}{args}));",
            format_encoder_name(format)
        );
    });
}

impl Backend for QemuTcgBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn selects(&self, record: &InstructionRecord) -> bool {
        record.has_attribute(&self.required_attribute)
    }

    fn render(
        &self,
        model: &GenerationModel,
        header: &Header,
        out: &mut Emitter,
    ) -> Result<(), IsaError> {
        unique_identifiers(
            BACKEND,
            model.records().iter().map(InstructionRecord::mnemonic),
            opcode_name,
        )?;

        emit_header(out, header);
        emit_opcode_enum(out, model);
        for combination in model.combinations().iter() {
            emit_combinator(out, combination);
        }
        for (format, _, encoder) in model.plans() {
            emit_format_encoder(out, model, format, encoder);
        }
        for record in model.records() {
            emit_instruction(out, model, record);
        }
        out.empty_line();
        out.line("/* End of generated code.  */");

        debug!(
            backend = BACKEND,
            records = model.records().len(),
            formats = model.catalog().len(),
            "rendered"
        );
        Ok(())
    }

    fn formatter(&self) -> ExternalFormatter {
        ExternalFormatter::clang_format_qemu()
    }
}
