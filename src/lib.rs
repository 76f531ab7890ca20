//! Generates operand validators, bit-packing encoders and opcode tables for fixed-width
//! instruction sets from a compact description of their encodings.
//!
//! The pipeline is a single pass: records are filtered for the active [`render::Backend`],
//! folded into a [`model::GenerationModel`], rendered to text and piped through the backend's
//! formatter. Any defect aborts the run before output is produced.

pub mod config;
pub mod error;
pub mod isa;
pub mod loader;
pub mod model;
pub mod render;
pub mod tooling;

use tracing::info;

pub use config::GeneratorConfig;
pub use error::{Error, Result};

use isa::InstructionRecord;
use model::GenerationModel;
use render::{Backend, Emitter, Header};
use tooling::{FixedRevision, GitRevision, Passthrough, RevisionSource, SourceFormatter};

/// One backend plus the run configuration.
pub struct Generator<'a> {
    backend: &'a dyn Backend,
    config: GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(backend: &'a dyn Backend, config: GeneratorConfig) -> Self {
        Self { backend, config }
    }

    /// Runs with the configured revision (git otherwise) and the backend's own formatter,
    /// unless formatting is disabled.
    pub fn run(&self, records: Vec<InstructionRecord>) -> Result<String> {
        let revision: Box<dyn RevisionSource> = match &self.config.revision {
            Some(revision) => Box::new(FixedRevision(revision.clone())),
            None => Box::new(GitRevision::new()),
        };
        let formatter: Box<dyn SourceFormatter> = if self.config.format_output {
            Box::new(self.backend.formatter())
        } else {
            Box::new(Passthrough)
        };
        self.run_with(records, revision.as_ref(), formatter.as_ref())
    }

    pub fn run_with(
        &self,
        records: Vec<InstructionRecord>,
        revision: &dyn RevisionSource,
        formatter: &dyn SourceFormatter,
    ) -> Result<String> {
        let total = records.len();
        let selected: Vec<InstructionRecord> = records
            .into_iter()
            .filter(|record| self.backend.selects(record) && self.config.selects(record))
            .collect();
        info!(
            backend = self.backend.name(),
            total,
            selected = selected.len(),
            "selected records"
        );

        let model = GenerationModel::build(selected, self.config.exceptions.clone())?;
        let header = Header::for_model(revision.revision()?, &model);

        let mut out = Emitter::new();
        self.backend.render(&model, &header, &mut out)?;
        let text = formatter.format(&out.finish())?;
        info!(
            backend = self.backend.name(),
            formatter = formatter.name(),
            bytes = text.len(),
            "generated"
        );
        Ok(text)
    }
}
