//! opcodegen: turns instruction description files into assembler or TCG encoder sources.
//!
//! The artifact goes to stdout in a single write; logs go to stderr.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use opcodegen::isa::RegisterExceptions;
use opcodegen::loader::DescriptionLoader;
use opcodegen::render::{Backend, GoAsmBackend, QemuTcgBackend};
use opcodegen::{Generator, GeneratorConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    /// Go cmd/internal/obj assembler tables.
    GoAsm,
    /// QEMU TCG emitter definitions (records tagged @qemu).
    QemuTcg,
}

#[derive(Parser)]
#[command(name = "opcodegen", version, about = "Instruction encoder generator")]
struct Cli {
    /// Output dialect.
    target: Target,

    /// Instruction description files, loaded in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Revision printed in the header instead of `git rev-parse HEAD`.
    #[arg(long)]
    revision: Option<String>,

    /// Skip the external formatter (gofmt / clang-format).
    #[arg(long)]
    no_format: bool,

    /// Only generate records carrying this attribute tag.
    #[arg(long, value_name = "TAG")]
    require_attr: Option<String>,

    /// Forbid a register for one instruction (format: MNEMONIC:CLASS:INDEX, e.g. jirl:gpr:2).
    #[arg(long = "exclude-register", value_name = "ENTRY")]
    exclude_register: Vec<String>,

    /// Enable debug logging (RUST_LOG takes precedence when set).
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut exceptions = RegisterExceptions::new();
    for entry in &cli.exclude_register {
        exceptions.exclude_entry(entry)?;
    }
    let mut config = GeneratorConfig::new()
        .with_format_output(!cli.no_format)
        .with_exceptions(exceptions);
    if let Some(revision) = cli.revision {
        config = config.with_revision(revision);
    }
    if let Some(attribute) = cli.require_attr {
        config = config.with_required_attribute(attribute);
    }

    let records = DescriptionLoader::new().load_files(&cli.files)?;

    let backend: Box<dyn Backend> = match cli.target {
        Target::GoAsm => Box::new(GoAsmBackend::new()),
        Target::QemuTcg => Box::new(QemuTcgBackend::new()),
    };
    let text = Generator::new(backend.as_ref(), config).run(records)?;

    let mut stdout = BufWriter::new(io::stdout().lock());
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
