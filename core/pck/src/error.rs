use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PckError>;

#[derive(Error, Debug)]
pub enum PckError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid PCK magic: expected {expected:#010x}, got {found:#010x}")]
    InvalidMagic { expected: u32, found: u32 },
    #[error("Invalid PCK version: expected {expected}, got {found}")]
    InvalidVersion { expected: u32, found: u32 },
    #[error("Header size {declared} is smaller than the {required} bytes its sections need")]
    HeaderTooSmall { declared: u32, required: u64 },
    #[error("Duplicate {table} entry {id} (language {language_id})")]
    DuplicateEntry {
        table: &'static str,
        id: u64,
        language_id: u32,
    },
    #[error("Replacement file {path:?} could not be read: {source}")]
    Replacement {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("Malformed {0}")]
    Malformed(String),
}
