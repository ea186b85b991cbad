use thiserror::Error;

#[derive(Error, Debug)]
pub enum BnkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid magic: expected {expected}, got {found}")]
    InvalidMagic { expected: String, found: String },
    #[error("{context}{}: declared {declared} bytes but {consumed} were consumed", display_id(.id))]
    SizeMismatch {
        context: String,
        id: Option<u32>,
        declared: u64,
        consumed: u64,
    },
    #[error("Unsupported {structure}: {detail}")]
    Unsupported {
        structure: &'static str,
        detail: String,
    },
    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: u32 },
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}

fn display_id(id: &Option<u32>) -> String {
    match id {
        Some(id) => format!(" (id {})", id),
        None => String::new(),
    }
}

impl BnkError {
    pub(crate) fn unsupported(structure: &'static str, detail: impl Into<String>) -> Self {
        BnkError::Unsupported {
            structure,
            detail: detail.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BnkError>;
