use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::collections::{HircCollection, MediaCollection};
use crate::error::BnkError;

/// Generator version written by banks built from scratch.
pub const DEFAULT_BANK_VERSION: u32 = 134;

/// DATA entries start on this boundary.
pub const MEDIA_ALIGNMENT: u64 = 16;

/// Size of the fixed BKHD fields; anything past this is padding.
pub const BKHD_FIELDS_SIZE: usize = 20;

/// STID string type holding bank names.
pub const STID_TYPE_BANK: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const BKHD: ChunkTag = ChunkTag(*b"BKHD");
    pub const DIDX: ChunkTag = ChunkTag(*b"DIDX");
    pub const DATA: ChunkTag = ChunkTag(*b"DATA");
    pub const HIRC: ChunkTag = ChunkTag(*b"HIRC");
    pub const STID: ChunkTag = ChunkTag(*b"STID");
    pub const STMG: ChunkTag = ChunkTag(*b"STMG");
    pub const ENVS: ChunkTag = ChunkTag(*b"ENVS");
    pub const PLAT: ChunkTag = ChunkTag(*b"PLAT");
    pub const INIT: ChunkTag = ChunkTag(*b"INIT");

    /// Order used for banks that were not loaded from a file.
    pub const DEFAULT_ORDER: [ChunkTag; 9] = [
        ChunkTag::BKHD,
        ChunkTag::DIDX,
        ChunkTag::DATA,
        ChunkTag::HIRC,
        ChunkTag::STID,
        ChunkTag::STMG,
        ChunkTag::ENVS,
        ChunkTag::PLAT,
        ChunkTag::INIT,
    ];

    /// Chunks rebuilt from the bank model rather than kept as raw bytes.
    pub fn is_modeled(self) -> bool {
        matches!(
            self,
            ChunkTag::BKHD | ChunkTag::DIDX | ChunkTag::DATA | ChunkTag::HIRC | ChunkTag::STID
        )
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x{}", hex::encode_upper(self.0))
        }
    }
}

impl From<ChunkTag> for String {
    fn from(tag: ChunkTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for ChunkTag {
    type Error = BnkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if let Some(hex_digits) = value.strip_prefix("0x") {
            let bytes = hex::decode(hex_digits).map_err(|e| BnkError::ParseError(e.to_string()))?;
            let tag: [u8; 4] = bytes
                .try_into()
                .map_err(|_| BnkError::ParseError(format!("chunk tag {} is not 4 bytes", value)))?;
            return Ok(ChunkTag(tag));
        }
        let tag: [u8; 4] = value
            .as_bytes()
            .try_into()
            .map_err(|_| BnkError::ParseError(format!("chunk tag {:?} is not 4 bytes", value)))?;
        Ok(ChunkTag(tag))
    }
}

/// Chunk kept as its original payload and re-emitted unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawChunk {
    pub tag: ChunkTag,
    #[serde(with = "crate::hex_serde")]
    pub data: Vec<u8>,
}

/// A recoverable problem met while loading. The affected structure was kept raw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Absolute offset of the chunk or record the problem belongs to.
    pub offset: u64,
    pub context: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x} {}: {}", self.offset, self.context, self.message)
    }
}

/// DIDX entry: where one media payload sits inside DATA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DidxEntry {
    pub id: u32,
    pub offset: u32,
    pub size: u32,
}

pub const DIDX_ENTRY_SIZE: usize = 12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundBank {
    pub id: u32,
    pub language_id: u32,
    pub version: u32,
    pub project_id: u32,
    #[serde(default)]
    pub feedback_in_bank: u32,
    /// Bytes past the fixed BKHD fields, written back as zeros.
    #[serde(default)]
    pub header_padding: usize,

    #[serde(rename = "hierarchy", default)]
    pub hirc: HircCollection,

    /// Payloads are kept out of the JSON form; `bnk unpack` writes them as files.
    #[serde(skip)]
    pub media: MediaCollection,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bank_names: Option<IndexMap<u32, String>>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra_chunks: Vec<RawChunk>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub chunk_order: Vec<ChunkTag>,

    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl SoundBank {
    pub fn new(id: u32) -> Self {
        SoundBank {
            id,
            version: DEFAULT_BANK_VERSION,
            ..Default::default()
        }
    }

    /// True when every chunk and record decoded without being kept raw.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn extra_chunk(&self, tag: ChunkTag) -> Option<&RawChunk> {
        self.extra_chunks.iter().find(|c| c.tag == tag)
    }

    pub(crate) fn push_diagnostic(&mut self, offset: u64, context: impl Into<String>, error: &BnkError) {
        self.diagnostics.push(Diagnostic {
            offset,
            context: context.into(),
            message: error.to_string(),
        });
    }
}
