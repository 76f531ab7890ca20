use thiserror::Error;

use crate::isa::IsaError;
use crate::tooling::ToolError;

/// Either the description is wrong or a tool around the generator failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Isa(#[from] IsaError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

pub type Result<T> = std::result::Result<T, Error>;
