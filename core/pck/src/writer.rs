use byteorder::{LE, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use tracing::info;
use utils::{BinWriteExt, align_up, patch_u32_at};

use crate::error::{PckError, Result};
use crate::lut::{FileLut, LutKey};
use crate::types::*;

fn section_size(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| PckError::OutOfRange(format!("{} section of {} bytes", what, len)))
}

/// Assign each entry's start offset, aligned to its own block size, advancing `cursor`.
fn assign_offsets<K: LutKey>(lut: &mut FileLut<K>, cursor: &mut u64) -> Result<()> {
    let name = lut.name();
    for entry in lut.iter_mut() {
        let size = entry.size()? as u64;
        let start = align_up(*cursor, entry.block_size as u64);
        entry.start_block = u32::try_from(start)
            .map_err(|_| PckError::OutOfRange(format!("{} entry {:?} offset {:#x}", name, entry.id, start)))?;
        *cursor = start + size;
    }
    Ok(())
}

/// `base` is where the package starts in `writer`.
fn write_payloads<K: LutKey, W: Write + Seek>(lut: &FileLut<K>, writer: &mut W, base: u64) -> Result<()> {
    for entry in lut.iter() {
        let pos = writer.stream_position()? - base;
        let start = entry.start_block as u64;
        let gap = start.checked_sub(pos).ok_or_else(|| {
            PckError::OutOfRange(format!("{} entry {:?} overlaps the previous payload", lut.name(), entry.id))
        })?;
        writer.write_zeros(gap as usize)?;
        writer.write_all(entry.loaded_data().unwrap_or_default())?;
    }
    Ok(())
}

impl PckPackage {
    /// Two passes: payload sizes fix every offset before the tables are written,
    /// and the header sizes are patched in last.
    pub fn write<W: Write + Seek>(&mut self, writer: &mut W) -> Result<()> {
        let map = self.languages.to_bytes()?;
        let bank_size = self.sound_banks.header_size();
        let streaming_size = self.streaming_files.header_size();
        let external_size = self.external_files.header_size();
        let sections = (map.len() + bank_size + streaming_size + external_size) as u64;

        let data_start = HEADER_PREFIX_SIZE + HEADER_FIELDS_SIZE + sections;
        let mut cursor = data_start;
        assign_offsets(&mut self.sound_banks, &mut cursor)?;
        assign_offsets(&mut self.streaming_files, &mut cursor)?;
        assign_offsets(&mut self.external_files, &mut cursor)?;

        let base = writer.stream_position()?;
        writer.write_u32::<LE>(PCK_MAGIC)?;
        let header_size_pos = writer.stream_position()?;
        writer.write_u32::<LE>(0)?;
        writer.write_u32::<LE>(PCK_VERSION)?;
        let sizes_pos = writer.stream_position()?;
        writer.write_zeros(16)?;

        writer.write_all(&map)?;
        self.sound_banks.write_records(writer)?;
        self.streaming_files.write_records(writer)?;
        self.external_files.write_records(writer)?;

        write_payloads(&self.sound_banks, writer, base)?;
        write_payloads(&self.streaming_files, writer, base)?;
        write_payloads(&self.external_files, writer, base)?;

        let header_size = section_size((HEADER_FIELDS_SIZE + sections) as usize, "header")?;
        patch_u32_at(writer, header_size_pos, header_size)?;
        for (i, size) in [
            section_size(map.len(), "language map")?,
            section_size(bank_size, SOUND_BANKS)?,
            section_size(streaming_size, STREAMING_FILES)?,
            section_size(external_size, EXTERNAL_FILES)?,
        ]
        .into_iter()
        .enumerate()
        {
            patch_u32_at(writer, sizes_pos + 4 * i as u64, size)?;
        }

        info!(
            "Wrote package: {} sound banks, {} streaming files, {} external files, {} bytes",
            self.sound_banks.len(),
            self.streaming_files.len(),
            self.external_files.len(),
            cursor
        );
        Ok(())
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
