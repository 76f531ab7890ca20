use crate::isa::{InstructionRecord, RegisterExceptions};

/// Knobs for one generation run. The defaults look up the revision with git, run the
/// backend's formatter, and apply no extra attribute filter or register exclusions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub revision: Option<String>,
    pub format_output: bool,
    pub require_attr: Option<String>,
    pub exceptions: RegisterExceptions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            revision: None,
            format_output: true,
            require_attr: None,
            exceptions: RegisterExceptions::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_format_output(mut self, enabled: bool) -> Self {
        self.format_output = enabled;
        self
    }

    /// Records must also carry `attribute`, on top of the backend's own selection.
    pub fn with_required_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.require_attr = Some(attribute.into());
        self
    }

    pub fn with_exceptions(mut self, exceptions: RegisterExceptions) -> Self {
        self.exceptions = exceptions;
        self
    }

    pub fn selects(&self, record: &InstructionRecord) -> bool {
        self.require_attr
            .as_deref()
            .is_none_or(|attribute| record.has_attribute(attribute))
    }
}
