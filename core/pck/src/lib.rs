pub mod entry;
pub mod error;
pub mod lut;
pub mod reader;
pub mod string_map;
pub mod types;
pub mod writer;

pub use entry::{EntryData, FileEntry};
pub use error::{PckError, Result};
pub use lut::{FileLut, LutKey, LutRecord};
pub use string_map::StringMap;
pub use types::*;
