use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Bank error: {0}")]
    Bnk(#[from] bnk::BnkError),
    #[error("Package error: {0}")]
    Pck(#[from] pck::PckError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No {kind} with id {id} found")]
    TargetNotFound { kind: &'static str, id: u32 },
    #[error("Invalid project: {0}")]
    InvalidProject(String),
    #[error("Value out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, PatchError>;
