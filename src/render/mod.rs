//! Text backends over the shared [`GenerationModel`].
//!
//! A backend picks which records it wants, then writes its dialect into an [`Emitter`]. Both
//! dialects consume the same catalog, plans and table, so they differ only in spelling.

pub mod emitter;
pub mod go_asm;
pub mod qemu_tcg;

use std::collections::BTreeMap;

use crate::isa::{InstructionRecord, IsaError};
use crate::model::GenerationModel;
use crate::tooling::ExternalFormatter;

pub use emitter::Emitter;
pub use go_asm::GoAsmBackend;
pub use qemu_tcg::QemuTcgBackend;

/// Provenance printed at the top of every artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub revision: String,
    pub digest: String,
}

impl Header {
    pub fn new(revision: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            digest: digest.into(),
        }
    }

    pub fn for_model(revision: impl Into<String>, model: &GenerationModel) -> Self {
        Self::new(revision, model.fingerprint_hex())
    }
}

pub trait Backend {
    fn name(&self) -> &'static str;

    /// Attribute filter applied before the model is built.
    fn selects(&self, record: &InstructionRecord) -> bool;

    fn render(
        &self,
        model: &GenerationModel,
        header: &Header,
        out: &mut Emitter,
    ) -> Result<(), IsaError>;

    /// Formatter the artifact is normally piped through.
    fn formatter(&self) -> ExternalFormatter;
}

/// Derives one identifier per source name and rejects two names landing on the same one.
pub(crate) fn unique_identifiers<'a, I, F>(
    backend: &'static str,
    names: I,
    derive: F,
) -> Result<BTreeMap<&'a str, String>, IsaError>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> String,
{
    let mut owners: BTreeMap<String, &'a str> = BTreeMap::new();
    let mut identifiers = BTreeMap::new();
    for name in names {
        let identifier = derive(name);
        if let Some(first) = owners.get(&identifier)
            && *first != name
        {
            return Err(IsaError::IdentifierCollision {
                backend,
                identifier,
                first: first.to_string(),
                second: name.to_string(),
            });
        }
        owners.insert(identifier.clone(), name);
        identifiers.insert(name, identifier);
    }
    Ok(identifiers)
}
