use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;
use crate::error::Result;
use crate::lut::FileLut;
use crate::string_map::StringMap;

/// `AKPK` read as a little-endian u32.
pub const PCK_MAGIC: u32 = u32::from_le_bytes(*b"AKPK");
pub const PCK_VERSION: u32 = 1;

/// Header fields after `header_size`: version and the four section sizes.
pub const HEADER_FIELDS_SIZE: u64 = 20;

/// Tag and header-size field, not counted by `header_size`.
pub const HEADER_PREFIX_SIZE: u64 = 8;

pub const SOUND_BANKS: &str = "SoundBanks";
pub const STREAMING_FILES: &str = "StreamingFiles";
pub const EXTERNAL_FILES: &str = "ExternalFiles";

/// An AKPK package: language names plus three lookup tables over block-aligned payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct PckPackage {
    pub languages: StringMap,
    pub sound_banks: FileLut<u32>,
    pub streaming_files: FileLut<u32>,
    pub external_files: FileLut<u64>,
}

impl Default for PckPackage {
    fn default() -> Self {
        Self::new()
    }
}

impl PckPackage {
    pub fn new() -> Self {
        PckPackage {
            languages: StringMap::new(),
            sound_banks: FileLut::new(SOUND_BANKS),
            streaming_files: FileLut::new(STREAMING_FILES),
            external_files: FileLut::new(EXTERNAL_FILES),
        }
    }

    pub fn add_sound_bank(&mut self, id: u32, language_id: u32, block_size: u32, data: Vec<u8>) -> Result<()> {
        self.sound_banks.insert(FileEntry::new(id, language_id, block_size, data))
    }

    pub fn add_streaming_file(&mut self, id: u32, language_id: u32, block_size: u32, data: Vec<u8>) -> Result<()> {
        self.streaming_files.insert(FileEntry::new(id, language_id, block_size, data))
    }

    pub fn add_external_file(&mut self, id: u64, language_id: u32, block_size: u32, data: Vec<u8>) -> Result<()> {
        self.external_files.insert(FileEntry::new(id, language_id, block_size, data))
    }

    pub fn remove_sound_bank(&mut self, id: u32, language_id: u32) -> Option<FileEntry<u32>> {
        self.sound_banks.remove(id, language_id)
    }

    pub fn remove_streaming_file(&mut self, id: u32, language_id: u32) -> Option<FileEntry<u32>> {
        self.streaming_files.remove(id, language_id)
    }

    pub fn remove_external_file(&mut self, id: u64, language_id: u32) -> Option<FileEntry<u64>> {
        self.external_files.remove(id, language_id)
    }

    pub fn language_name(&self, language_id: u32) -> Option<&str> {
        self.languages.get(language_id)
    }

    pub fn is_modified(&self) -> bool {
        self.sound_banks.iter().any(FileEntry::is_modified)
            || self.streaming_files.iter().any(FileEntry::is_modified)
            || self.external_files.iter().any(FileEntry::is_modified)
    }

    pub fn info(&self) -> PackageInfo {
        PackageInfo {
            languages: self
                .languages
                .iter()
                .map(|(id, name)| LanguageInfo {
                    id,
                    name: name.to_string(),
                })
                .collect(),
            sound_banks: self.sound_banks.iter().map(EntryInfo::from_entry).collect(),
            streaming_files: self.streaming_files.iter().map(EntryInfo::from_entry).collect(),
            external_files: self.external_files.iter().map(EntryInfo::from_entry).collect(),
        }
    }
}

/// Listing of a package's tables, for display and JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInfo {
    pub languages: Vec<LanguageInfo>,
    pub sound_banks: Vec<EntryInfo>,
    pub streaming_files: Vec<EntryInfo>,
    pub external_files: Vec<EntryInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    pub id: u64,
    pub language_id: u32,
    pub block_size: u32,
    pub start_block: u32,
    /// `None` for a path replacement that has not been read yet.
    pub size: Option<usize>,
    pub modified: bool,
}

impl EntryInfo {
    fn from_entry<K: crate::lut::LutKey>(entry: &FileEntry<K>) -> Self {
        EntryInfo {
            id: entry.id.into(),
            language_id: entry.language_id,
            block_size: entry.block_size,
            start_block: entry.start_block,
            size: entry.loaded_data().map(<[u8]>::len),
            modified: entry.is_modified(),
        }
    }
}
