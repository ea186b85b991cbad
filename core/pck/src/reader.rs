use byteorder::{LE, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info, warn};
use utils::{BinReadExt, stream_len};

use crate::entry::FileEntry;
use crate::error::{PckError, Result};
use crate::lut::{FileLut, LutKey, LutRecord};
use crate::string_map::StringMap;
use crate::types::*;

struct SectionSizes {
    language_map: u32,
    sound_banks: u32,
    streaming_files: u32,
    external_files: u32,
}

impl SectionSizes {
    fn total(&self) -> u64 {
        self.language_map as u64
            + self.sound_banks as u64
            + self.streaming_files as u64
            + self.external_files as u64
    }
}

/// Attach payloads to the table's records. Empty payloads drop that entry only.
fn load_entries<K: LutKey, R: Read + Seek>(
    lut: &mut FileLut<K>,
    records: Vec<LutRecord<K>>,
    reader: &mut R,
    archive_len: u64,
) -> Result<()> {
    for record in records {
        if record.file_size <= 0 {
            warn!(
                "{} entry {:?} has no payload (size {}), dropped",
                lut.name(),
                record.id,
                record.file_size
            );
            continue;
        }
        let end = record.start_block as u64 + record.file_size as u64;
        if end > archive_len {
            return Err(PckError::Malformed(format!(
                "{} entry {:?} spans {:#x}..{:#x} past the end of the package ({:#x})",
                lut.name(),
                record.id,
                record.start_block,
                end,
                archive_len
            )));
        }
        reader.seek(SeekFrom::Start(record.start_block as u64))?;
        let data = reader.read_bytes(record.file_size as usize)?;
        lut.insert(FileEntry::loaded(
            record.id,
            record.language_id,
            record.block_size,
            record.start_block,
            data,
        ))?;
    }
    Ok(())
}

impl PckPackage {
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let archive_len = stream_len(&mut reader)?;
        reader.seek(SeekFrom::Start(0))?;

        let magic = reader.read_u32::<LE>()?;
        if magic != PCK_MAGIC {
            return Err(PckError::InvalidMagic {
                expected: PCK_MAGIC,
                found: magic,
            });
        }
        let header_size = reader.read_u32::<LE>()?;
        let version = reader.read_u32::<LE>()?;
        if version != PCK_VERSION {
            return Err(PckError::InvalidVersion {
                expected: PCK_VERSION,
                found: version,
            });
        }
        let sizes = SectionSizes {
            language_map: reader.read_u32::<LE>()?,
            sound_banks: reader.read_u32::<LE>()?,
            streaming_files: reader.read_u32::<LE>()?,
            external_files: reader.read_u32::<LE>()?,
        };
        // header_size counts from the version field: five u32 fields plus the four
        // sections. Packages in the wild store exactly this sum.
        let required = HEADER_FIELDS_SIZE + sizes.total();
        if (header_size as u64) < required {
            return Err(PckError::HeaderTooSmall {
                declared: header_size,
                required,
            });
        }

        let map_bytes = reader.read_bytes(sizes.language_map as usize)?;
        let bank_bytes = reader.read_bytes(sizes.sound_banks as usize)?;
        let streaming_bytes = reader.read_bytes(sizes.streaming_files as usize)?;
        let external_bytes = reader.read_bytes(sizes.external_files as usize)?;

        let mut package = PckPackage::new();
        package.languages = StringMap::parse(&map_bytes)?;
        debug!("{} languages", package.languages.len());

        let banks = package.sound_banks.parse_records(&bank_bytes)?;
        let streaming = package.streaming_files.parse_records(&streaming_bytes)?;
        let external = package.external_files.parse_records(&external_bytes)?;

        load_entries(&mut package.sound_banks, banks, &mut reader, archive_len)?;
        load_entries(&mut package.streaming_files, streaming, &mut reader, archive_len)?;
        load_entries(&mut package.external_files, external, &mut reader, archive_len)?;

        info!(
            "Loaded package: {} sound banks, {} streaming files, {} external files",
            package.sound_banks.len(),
            package.streaming_files.len(),
            package.external_files.len()
        );
        Ok(package)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}
