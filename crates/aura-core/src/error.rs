//! Error types for aura

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuraError {
    #[error("Unknown instrument type: {0}")]
    UnknownInstrumentType(String),
    #[error("Unknown effect type: {0}")]
    UnknownEffectType(String),
    #[error("Invalid position: {0}")]
    InvalidPosition(String),
}

pub type Result<T> = std::result::Result<T, AuraError>;
