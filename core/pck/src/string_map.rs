//! Language table: `count`, then `(offset, id)` pairs, then the UTF-16 names.
//! Offsets are relative to the start of the map; the whole map is padded to 4 bytes.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;
use std::io::{Cursor, Write};
use utils::{BinReadExt, BinWriteExt, padding_for};

use crate::error::{PckError, Result};

const MAP_ENTRY_SIZE: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringMap {
    names: IndexMap<u32, String>,
}

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Ok(Self::new());
        }
        let mut reader = Cursor::new(payload);
        let count = reader.read_u32::<LE>()? as usize;
        let table_end = 4 + count * MAP_ENTRY_SIZE;
        if table_end > payload.len() {
            return Err(PckError::Malformed(format!(
                "string map: {} entries do not fit {} bytes",
                count,
                payload.len()
            )));
        }
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = reader.read_u32::<LE>()?;
            let id = reader.read_u32::<LE>()?;
            entries.push((offset, id));
        }

        let mut names = IndexMap::with_capacity(count);
        for (offset, id) in entries {
            if (offset as usize) < table_end || offset as usize >= payload.len() {
                return Err(PckError::Malformed(format!(
                    "string map: name offset {:#x} for id {} is outside the string area",
                    offset, id
                )));
            }
            reader.set_position(offset as u64);
            names.insert(id, reader.read_wide_string()?);
        }
        Ok(StringMap { names })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.names.is_empty() {
            let mut out = Vec::new();
            out.write_u32::<LE>(0)?;
            return Ok(out);
        }
        let mut strings = Vec::new();
        let mut offsets = Vec::with_capacity(self.names.len());
        let table_end = 4 + self.names.len() * MAP_ENTRY_SIZE;
        for name in self.names.values() {
            offsets.push(table_end + strings.len());
            strings.write_wide_string(name)?;
        }

        let mut out = Vec::with_capacity(table_end + strings.len() + 3);
        out.write_u32::<LE>(self.names.len() as u32)?;
        for (offset, id) in offsets.iter().zip(self.names.keys()) {
            let offset = u32::try_from(*offset)
                .map_err(|_| PckError::OutOfRange("string map offset".to_string()))?;
            out.write_u32::<LE>(offset)?;
            out.write_u32::<LE>(*id)?;
        }
        out.write_all(&strings)?;
        let pad = padding_for(out.len() as u64, 4);
        out.write_zeros(pad as usize)?;
        Ok(out)
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) -> Option<String> {
        self.names.insert(id, name.into())
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Id for a language name, compared case-insensitively.
    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}
