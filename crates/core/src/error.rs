use thiserror::Error;

use crate::config::ConfigError;
use crate::model::ItemError;

/// Top-level error for domain validation in `lingo-core`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Item(#[from] ItemError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
