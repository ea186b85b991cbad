use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{Read, Write};

use crate::entry::FileEntry;
use crate::error::{PckError, Result};

/// File id width of a lookup table: u32 for banks and streaming files, u64 for external files.
pub trait LutKey: Copy + Eq + Hash + Debug + Into<u64> {
    const WIDTH: usize;

    fn read_key<R: Read>(reader: &mut R) -> Result<Self>;
    fn write_key<W: Write>(self, writer: &mut W) -> Result<()>;
}

impl LutKey for u32 {
    const WIDTH: usize = 4;

    fn read_key<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u32::<LE>()?)
    }

    fn write_key<W: Write>(self, writer: &mut W) -> Result<()> {
        Ok(writer.write_u32::<LE>(self)?)
    }
}

impl LutKey for u64 {
    const WIDTH: usize = 8;

    fn read_key<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u64::<LE>()?)
    }

    fn write_key<W: Write>(self, writer: &mut W) -> Result<()> {
        Ok(writer.write_u64::<LE>(self)?)
    }
}

/// One LUT record as stored in the header, before its payload is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LutRecord<K> {
    pub id: K,
    pub block_size: u32,
    pub file_size: i32,
    pub start_block: u32,
    pub language_id: u32,
}

impl<K: LutKey> LutRecord<K> {
    /// key, block size, file size, start block, language id
    pub const SIZE: usize = K::WIDTH + 16;

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(LutRecord {
            id: K::read_key(reader)?,
            block_size: reader.read_u32::<LE>()?,
            file_size: reader.read_i32::<LE>()?,
            start_block: reader.read_u32::<LE>()?,
            language_id: reader.read_u32::<LE>()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.id.write_key(writer)?;
        writer.write_u32::<LE>(self.block_size)?;
        writer.write_i32::<LE>(self.file_size)?;
        writer.write_u32::<LE>(self.start_block)?;
        writer.write_u32::<LE>(self.language_id)?;
        Ok(())
    }
}

/// Entries of one table keyed by `(id, language)`, in package order.
#[derive(Debug, Clone, PartialEq)]
pub struct FileLut<K: LutKey> {
    name: &'static str,
    entries: IndexMap<(K, u32), FileEntry<K>>,
}

impl<K: LutKey> FileLut<K> {
    pub fn new(name: &'static str) -> Self {
        FileLut {
            name,
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn insert(&mut self, entry: FileEntry<K>) -> Result<()> {
        let key = entry.key();
        if self.entries.contains_key(&key) {
            return Err(PckError::DuplicateEntry {
                table: self.name,
                id: key.0.into(),
                language_id: key.1,
            });
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Replace in place or append.
    pub fn set(&mut self, entry: FileEntry<K>) -> Option<FileEntry<K>> {
        self.entries.insert(entry.key(), entry)
    }

    pub fn get(&self, id: K, language_id: u32) -> Option<&FileEntry<K>> {
        self.entries.get(&(id, language_id))
    }

    pub fn get_mut(&mut self, id: K, language_id: u32) -> Option<&mut FileEntry<K>> {
        self.entries.get_mut(&(id, language_id))
    }

    /// Every language variant of `id`.
    pub fn find(&self, id: K) -> impl Iterator<Item = &FileEntry<K>> {
        self.entries.values().filter(move |e| e.id == id)
    }

    pub fn find_mut(&mut self, id: K) -> impl Iterator<Item = &mut FileEntry<K>> {
        self.entries.values_mut().filter(move |e| e.id == id)
    }

    pub fn contains_id(&self, id: K) -> bool {
        self.entries.keys().any(|(k, _)| *k == id)
    }

    pub fn remove(&mut self, id: K, language_id: u32) -> Option<FileEntry<K>> {
        self.entries.shift_remove(&(id, language_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry<K>> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileEntry<K>> {
        self.entries.values_mut()
    }

    /// Bytes this table occupies in the header. Depends only on the entry count.
    pub fn header_size(&self) -> usize {
        4 + self.entries.len() * LutRecord::<K>::SIZE
    }

    pub fn parse_records(&self, payload: &[u8]) -> Result<Vec<LutRecord<K>>> {
        if payload.is_empty() {
            return Ok(Vec::new());
        }
        let mut reader = payload;
        let count = reader.read_u32::<LE>()? as usize;
        let needed = 4 + count * LutRecord::<K>::SIZE;
        if needed > payload.len() {
            return Err(PckError::Malformed(format!(
                "{} table: {} entries need {} bytes, section holds {}",
                self.name,
                count,
                needed,
                payload.len()
            )));
        }
        (0..count).map(|_| LutRecord::read(&mut reader)).collect()
    }

    /// Write the table header. Payloads must be resolved and `start_block` assigned.
    pub fn write_records<W: Write>(&self, writer: &mut W) -> Result<()> {
        let count = u32::try_from(self.entries.len())
            .map_err(|_| PckError::OutOfRange(format!("{} entry count", self.name)))?;
        writer.write_u32::<LE>(count)?;
        for entry in self.entries.values() {
            let size = entry.loaded_data().map(<[u8]>::len).ok_or_else(|| {
                PckError::Malformed(format!("{} entry {:?} has no resolved payload", self.name, entry.id))
            })?;
            let file_size = i32::try_from(size)
                .map_err(|_| PckError::OutOfRange(format!("{} entry {:?} size {}", self.name, entry.id, size)))?;
            LutRecord {
                id: entry.id,
                block_size: entry.block_size,
                file_size,
                start_block: entry.start_block,
                language_id: entry.language_id,
            }
            .write(writer)?;
        }
        Ok(())
    }
}
