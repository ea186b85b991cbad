use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PckError, Result};

/// Payload of one package entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryData {
    /// Bytes loaded from the package.
    Original(Vec<u8>),
    Replaced(Vec<u8>),
    /// Replacement read from `path` on first access, then cached.
    ReplacedPath {
        path: PathBuf,
        cached: Option<Vec<u8>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry<K> {
    pub id: K,
    pub language_id: u32,
    /// Alignment for the payload start. 0 or 1 means unaligned.
    pub block_size: u32,
    /// Absolute byte offset of the payload, assigned on save.
    pub start_block: u32,
    data: EntryData,
}

impl<K: Copy> FileEntry<K> {
    pub fn new(id: K, language_id: u32, block_size: u32, data: Vec<u8>) -> Self {
        FileEntry {
            id,
            language_id,
            block_size,
            start_block: 0,
            data: EntryData::Original(data),
        }
    }

    pub(crate) fn loaded(id: K, language_id: u32, block_size: u32, start_block: u32, data: Vec<u8>) -> Self {
        FileEntry {
            id,
            language_id,
            block_size,
            start_block,
            data: EntryData::Original(data),
        }
    }

    pub fn key(&self) -> (K, u32) {
        (self.id, self.language_id)
    }

    pub fn is_modified(&self) -> bool {
        !matches!(self.data, EntryData::Original(_))
    }

    pub fn source(&self) -> &EntryData {
        &self.data
    }

    pub fn replace_with(&mut self, data: Vec<u8>) {
        self.data = EntryData::Replaced(data);
    }

    /// Defer the replacement to `path`; the file is read the first time the payload is needed.
    pub fn replace_with_path(&mut self, path: impl AsRef<Path>) {
        self.data = EntryData::ReplacedPath {
            path: path.as_ref().to_path_buf(),
            cached: None,
        };
    }

    /// Current payload, reading a path replacement at most once.
    pub fn data(&mut self) -> Result<&[u8]> {
        if let EntryData::ReplacedPath { path, cached } = &mut self.data {
            if cached.is_none() {
                let bytes = fs::read(&*path).map_err(|source| PckError::Replacement {
                    path: path.clone(),
                    source,
                })?;
                *cached = Some(bytes);
            }
        }
        Ok(match &self.data {
            EntryData::Original(bytes) | EntryData::Replaced(bytes) => bytes,
            EntryData::ReplacedPath { cached, .. } => cached.as_deref().unwrap_or_default(),
        })
    }

    /// Payload if it is already in memory.
    pub fn loaded_data(&self) -> Option<&[u8]> {
        match &self.data {
            EntryData::Original(bytes) | EntryData::Replaced(bytes) => Some(bytes),
            EntryData::ReplacedPath { cached, .. } => cached.as_deref(),
        }
    }

    pub fn size(&mut self) -> Result<usize> {
        Ok(self.data()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_replacement_marks_modified() {
        let mut entry = FileEntry::new(5u32, 0, 16, vec![1, 2]);
        assert!(!entry.is_modified());
        entry.replace_with(vec![3]);
        assert!(entry.is_modified());
        assert_eq!(entry.data().unwrap(), &[3]);
    }

    #[test]
    fn path_replacement_reads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.wem");
        fs::write(&path, [9u8; 4]).unwrap();

        let mut entry = FileEntry::new(5u32, 0, 16, vec![1, 2]);
        entry.replace_with_path(&path);
        assert!(entry.loaded_data().is_none());
        assert_eq!(entry.size().unwrap(), 4);

        fs::remove_file(&path).unwrap();
        assert_eq!(entry.data().unwrap(), &[9; 4]);
    }

    #[test]
    fn missing_replacement_file_is_an_error() {
        let mut entry = FileEntry::new(5u32, 0, 16, vec![]);
        entry.replace_with_path("/nonexistent/dir/file.wem");
        assert!(matches!(entry.data(), Err(PckError::Replacement { .. })));
    }
}
