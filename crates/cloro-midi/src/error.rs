//! Error types for the routing core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid source index {0} (expected 0-3)")]
    InvalidSource(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
