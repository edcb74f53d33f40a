//! Crate-level error type

use crate::feed::FeedError;
use crate::registry::RegistryError;

/// Any error surfaced by the service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
