use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn opcodegen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_opcodegen"))
}

#[test]
fn failed_run_exits_nonzero_without_stdout() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("dup.txt");
    fs::write(&path, "00100000 add.w DJK @qemu\n00110000 add.w DJK\n").expect("write");

    let output = opcodegen()
        .args(["go-asm", "--revision", "r", "--no-format"])
        .arg(&path)
        .output()
        .expect("spawn opcodegen");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("add.w"), "stderr: {stderr}");
}

#[test]
fn successful_run_writes_artifact_to_stdout() {
    let defs = concat!(env!("CARGO_MANIFEST_DIR"), "/defs/loongarch/base.txt");
    let output = opcodegen()
        .args(["qemu-tcg", "--revision", "0123abcd", "--no-format", defs])
        .output()
        .expect("spawn opcodegen");

    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(text.contains("0123abcd"));
    assert!(text.ends_with("/* End of generated code.  */\n"));
}
