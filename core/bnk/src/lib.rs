pub mod builder;
pub mod chunks;
pub mod codec;
pub mod collections;
pub mod error;
pub mod flags;
pub mod hex_serde;
pub mod hirc;
pub mod props;
mod query;
pub mod reader;
pub mod types;
pub mod writer;

pub use builder::BankBuilder;
pub use codec::BinCodec;
pub use collections::{HircCollection, MediaCollection};
pub use error::{BnkError, Result};
pub use hirc::{HircItem, HircObject};
pub use props::{PropBundle, PropId};
pub use types::*;
