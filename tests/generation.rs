use std::fs;
use std::path::{Path, PathBuf};

use hex_literal::hex;
use tempfile::tempdir;

use opcodegen::isa::{InstructionRecord, IsaError, RegisterExceptions};
use opcodegen::loader::DescriptionLoader;
use opcodegen::model::GenerationModel;
use opcodegen::render::{GoAsmBackend, QemuTcgBackend};
use opcodegen::tooling::{ExternalFormatter, FixedRevision, Passthrough, ToolError};
use opcodegen::{Error, Generator, GeneratorConfig};

fn defs() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("defs/loongarch")
}

fn load(files: &[&str]) -> Vec<InstructionRecord> {
    let root = defs();
    DescriptionLoader::new()
        .load_files(files.iter().map(|file| root.join(file)))
        .expect("load fixtures")
}

fn generate_go(records: Vec<InstructionRecord>, config: GeneratorConfig) -> String {
    let backend = GoAsmBackend::new();
    Generator::new(&backend, config)
        .run_with(records, &FixedRevision("0123abcd".into()), &Passthrough)
        .expect("go output")
}

fn generate_qemu(records: Vec<InstructionRecord>, config: GeneratorConfig) -> String {
    let backend = QemuTcgBackend::new();
    Generator::new(&backend, config)
        .run_with(records, &FixedRevision("0123abcd".into()), &Passthrough)
        .expect("qemu output")
}

#[test]
fn output_is_independent_of_input_order() {
    let forward = generate_go(load(&["base.txt", "float.txt"]), GeneratorConfig::new());
    let again = generate_go(load(&["base.txt", "float.txt"]), GeneratorConfig::new());
    let mut reversed_records = load(&["float.txt", "base.txt"]);
    reversed_records.reverse();
    let reversed = generate_go(reversed_records, GeneratorConfig::new());
    assert_eq!(forward, again);
    assert_eq!(forward, reversed);

    let qemu = generate_qemu(load(&["base.txt", "float.txt"]), GeneratorConfig::new());
    let qemu_again = generate_qemu(load(&["float.txt", "base.txt"]), GeneratorConfig::new());
    assert_eq!(qemu, qemu_again);
}

#[test]
fn go_tables_cover_every_record() {
    let text = generate_go(load(&["base.txt", "float.txt"]), GeneratorConfig::new());
    assert!(text.contains("// Code generated by opcodegen from 0123abcd; DO NOT EDIT.\n"));
    assert!(text.contains("\tAADDW & obj.AMask: {bits: 0x00100000, fmt: insnFormatDJK},\n"));
    assert!(text.contains("\tAFADDD & obj.AMask: {bits: 0x01010000, fmt: insnFormatFdFjFk},\n"));
    assert!(text.contains("\tABREAK & obj.AMask: {bits: 0x002a0000, fmt: insnFormatUd15},\n"));
    assert!(text.contains("func validateCjSd5k16(insn *instruction) error {\n"));
    assert!(text.contains("\tif err := wantFCCReg(insn.as, insn.rj); err != nil {\n"));
    assert!(text.contains("func encodeDJKASlots(bits uint32, d uint32, j uint32, k uint32, a uint32) uint32 {\n"));
    assert!(text.contains("\t\treturn encodeDJKSlots(enc.bits, sd5k16>>16&0x1f, cj, sd5k16&0xffff), nil\n"));
    assert!(text.contains("\t\treturn encodeDJKMSlots(enc.bits, d, j, uk6, um6), nil\n"));

    // Formats are listed in name order, each once.
    let formats: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("\tinsnFormat"))
        .filter(|rest| !rest.contains(' '))
        .collect();
    let mut sorted = formats.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(formats, sorted);
}

#[test]
fn qemu_output_is_limited_to_tagged_records() {
    let text = generate_qemu(load(&["base.txt", "float.txt"]), GeneratorConfig::new());
    assert!(text.contains("\tOPC_DBAR = 0x38720000,\n"));
    assert!(!text.contains("OPC_BREAK"));
    assert!(!text.contains("OPC_FADD_D"));
    assert!(text.contains("/* Emits the `addi.d d, j, sk12` instruction.  */\n"));
    assert!(text.contains("tcg_out_opc_bstrpick_d(TCGContext *s, TCGReg d, TCGReg j, uint32_t um6, uint32_t uk6)\n"));
    assert!(text.contains("\treturn encode_dk_slots(opc, (sd10k16 >> 16) & 0x3ff, sd10k16 & 0xffff);\n"));
    assert!(text.ends_with("/* End of generated code.  */\n"));
}

#[test]
fn model_encodes_fixture_instructions() {
    let model =
        GenerationModel::build(load(&["base.txt", "float.txt"]), RegisterExceptions::new())
            .expect("model");
    assert_eq!(model.encode("addi.d", &[4, 3, -1]).expect("addi.d"), 0x02ff_fc64);
    assert_eq!(model.encode("b", &[-4]).expect("b"), 0x53ff_f3ff);
    assert_eq!(model.encode("beqz", &[4, 0x0A_5555]).expect("beqz"), 0x4155_548a);
    assert_eq!(model.encode("ertn", &[]).expect("ertn"), 0x0648_3800);
    assert_eq!(model.encode("fsel", &[1, 2, 3, 7]).expect("fsel"), 0x0d03_8c41);
    assert!(matches!(
        model.encode("addi.d", &[4, 3, 2048]),
        Err(IsaError::Bound { .. })
    ));
}

#[test]
fn header_digest_identifies_selected_records() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tiny.txt");
    fs::write(&path, "06483800 ertn EMPTY\n00100000 add.w DJK @qemu\n").expect("write");
    let records = DescriptionLoader::new().load_file(&path).expect("load");

    let model = GenerationModel::build(records.clone(), RegisterExceptions::new()).expect("model");
    let digest = hex!("a8b6df3c79ee39507454bf0b5b4f5edd2779873530af02c7389a44b9a4d8ff79");
    assert_eq!(model.fingerprint(), digest);

    let text = generate_go(records, GeneratorConfig::new());
    assert!(text.contains(
        "// Input digest: sha256:a8b6df3c79ee39507454bf0b5b4f5edd2779873530af02c7389a44b9a4d8ff79\n"
    ));
}

#[test]
fn register_exclusions_flow_into_both_dialects() {
    let mut exceptions = RegisterExceptions::new();
    exceptions.exclude_entry("jirl:gpr:1").expect("entry");
    let config = GeneratorConfig::new().with_exceptions(exceptions);

    let go = generate_go(load(&["base.txt"]), config.clone());
    assert!(go.contains("\t{as: AJIRL, class: regClassInt, reg: 1},\n"));

    let qemu = generate_qemu(load(&["base.txt"]), config);
    assert!(qemu.contains("\ttcg_debug_assert(d != 1);\n"));
}

#[test]
fn required_attribute_narrows_go_output() {
    let config = GeneratorConfig::new().with_required_attribute("qemu");
    let text = generate_go(load(&["base.txt", "float.txt"]), config);
    assert!(text.contains("AADDW & obj.AMask"));
    assert!(!text.contains("ABREAK & obj.AMask"));
    assert!(!text.contains("insnFormatFdFjFk"));
}

fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn duplicate_mnemonics_across_files_abort_generation() {
    let dir = tempdir().expect("tempdir");
    let extra = write_fixture(dir.path(), "extra.txt", "00100000 add.w DJK @qemu\n");
    let mut records = load(&["base.txt"]);
    records.extend(DescriptionLoader::new().load_file(&extra).expect("extra"));

    let backend = GoAsmBackend::new();
    let err = Generator::new(&backend, GeneratorConfig::new())
        .run_with(records, &FixedRevision("r".into()), &Passthrough)
        .expect_err("duplicate");
    assert!(matches!(
        err,
        Error::Isa(IsaError::DuplicateMnemonic { mnemonic }) if mnemonic == "add.w"
    ));
}

#[cfg(unix)]
#[test]
fn formatter_failure_is_reported_with_its_stderr() {
    let formatter =
        ExternalFormatter::new("sh", ["-c", "cat >/dev/null; echo 'syntax error' >&2; exit 2"]);
    let backend = QemuTcgBackend::new();
    let err = Generator::new(&backend, GeneratorConfig::new())
        .run_with(load(&["base.txt"]), &FixedRevision("r".into()), &formatter)
        .expect_err("formatter fails");
    match err {
        Error::Tool(ToolError::Failed { stderr, .. }) => assert_eq!(stderr, "syntax error\n"),
        other => panic!("unexpected error {other:?}"),
    }
}
