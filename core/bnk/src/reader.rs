use byteorder::{LE, ReadBytesExt};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use tracing::{debug, warn};
use utils::BinReadExt;

use crate::chunks::{validate_envs, validate_plat, validate_stmg};
use crate::error::{BnkError, Result};
use crate::hirc::HircObject;
use crate::types::*;

/// Read a chunk tag, or `None` at a clean end of stream.
fn read_tag<R: Read>(reader: &mut R) -> Result<Option<ChunkTag>> {
    let mut tag = [0u8; 4];
    let mut filled = 0;
    while filled < tag.len() {
        let n = reader.read(&mut tag[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(ChunkTag(tag))),
        _ => Err(BnkError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stream ends inside a chunk tag",
        ))),
    }
}

fn parse_bkhd(payload: &[u8], bank: &mut SoundBank) -> Result<()> {
    if payload.len() < BKHD_FIELDS_SIZE {
        return Err(BnkError::SizeMismatch {
            context: "BKHD".to_string(),
            id: None,
            declared: payload.len() as u64,
            consumed: BKHD_FIELDS_SIZE as u64,
        });
    }
    let mut reader = Cursor::new(payload);
    bank.version = reader.read_u32::<LE>()?;
    bank.id = reader.read_u32::<LE>()?;
    bank.language_id = reader.read_u32::<LE>()?;
    bank.feedback_in_bank = reader.read_u32::<LE>()?;
    bank.project_id = reader.read_u32::<LE>()?;
    bank.header_padding = payload.len() - BKHD_FIELDS_SIZE;
    Ok(())
}

fn parse_didx(payload: &[u8]) -> Result<Vec<DidxEntry>> {
    if payload.len() % DIDX_ENTRY_SIZE != 0 {
        return Err(BnkError::SizeMismatch {
            context: "DIDX".to_string(),
            id: None,
            declared: payload.len() as u64,
            consumed: (payload.len() / DIDX_ENTRY_SIZE * DIDX_ENTRY_SIZE) as u64,
        });
    }
    let mut reader = Cursor::new(payload);
    let count = payload.len() / DIDX_ENTRY_SIZE;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        entries.push(DidxEntry {
            id: reader.read_u32::<LE>()?,
            offset: reader.read_u32::<LE>()?,
            size: reader.read_u32::<LE>()?,
        });
    }
    Ok(entries)
}

/// Records are collected first, so a chunk that fails part way adds none of them.
fn parse_hirc(payload: &[u8], chunk_offset: u64, bank: &mut SoundBank) -> Result<Vec<HircObject>> {
    let mut reader = Cursor::new(payload);
    let count = reader.read_u32::<LE>()?;
    let mut objects = Vec::with_capacity((count as usize).min(payload.len() / 9));
    for _ in 0..count {
        let record_offset = chunk_offset + 8 + reader.position();
        let read = HircObject::read(&mut reader)?;
        if let Some(issue) = &read.issue {
            bank.push_diagnostic(
                record_offset,
                format!("HIRC record {} (type {})", read.object.id(), read.object.type_code()),
                issue,
            );
        }
        objects.push(read.object);
    }
    let consumed = reader.position();
    if consumed != payload.len() as u64 {
        return Err(BnkError::SizeMismatch {
            context: "HIRC".to_string(),
            id: None,
            declared: payload.len() as u64,
            consumed,
        });
    }
    Ok(objects)
}

fn parse_stid(payload: &[u8]) -> Result<IndexMap<u32, String>> {
    let mut reader = Cursor::new(payload);
    let string_type = reader.read_u32::<LE>()?;
    if string_type != STID_TYPE_BANK {
        return Err(BnkError::unsupported(
            "STID",
            format!("string type {}", string_type),
        ));
    }
    let count = reader.read_u32::<LE>()?;
    let mut names = IndexMap::with_capacity(count as usize);
    for _ in 0..count {
        let id = reader.read_u32::<LE>()?;
        let name = reader.read_u8_prefixed_string()?;
        names.insert(id, name);
    }
    if reader.position() != payload.len() as u64 {
        return Err(BnkError::SizeMismatch {
            context: "STID".to_string(),
            id: None,
            declared: payload.len() as u64,
            consumed: reader.position(),
        });
    }
    Ok(names)
}

/// Slice each DIDX entry out of DATA, in DIDX order.
fn join_media(entries: &[DidxEntry], data: &[u8], bank: &mut SoundBank) -> Result<()> {
    let mut media = crate::collections::MediaCollection::new();
    for entry in entries {
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        let bytes = data.get(start..end).ok_or_else(|| {
            BnkError::OutOfRange(format!(
                "media {} spans {}..{} but DATA holds {} bytes",
                entry.id,
                start,
                end,
                data.len()
            ))
        })?;
        media.insert(entry.id, bytes.to_vec())?;
    }
    bank.media = media;
    Ok(())
}

fn keep_raw(bank: &mut SoundBank, tag: ChunkTag, payload: Vec<u8>) {
    bank.extra_chunks.push(RawChunk { tag, data: payload });
}

pub(crate) fn parse_bank<R: Read>(reader: &mut R, bank: &mut SoundBank) -> Result<()> {
    let mut offset = 0u64;
    let mut didx: Option<(u64, Vec<u8>)> = None;
    let mut data: Option<(u64, Vec<u8>)> = None;

    while let Some(tag) = read_tag(reader)? {
        if offset == 0 && tag != ChunkTag::BKHD {
            return Err(BnkError::InvalidMagic {
                expected: ChunkTag::BKHD.to_string(),
                found: tag.to_string(),
            });
        }
        let size = reader.read_u32::<LE>()?;
        let payload = reader.read_bytes(size as usize)?;
        debug!("chunk {} at {:#x}, {} bytes", tag, offset, size);
        bank.chunk_order.push(tag);

        match tag {
            ChunkTag::BKHD => parse_bkhd(&payload, bank)?,
            ChunkTag::DIDX => didx = Some((offset, payload)),
            ChunkTag::DATA => data = Some((offset, payload)),
            ChunkTag::HIRC => match parse_hirc(&payload, offset, bank) {
                Ok(objects) => {
                    for object in objects {
                        let id = object.id();
                        if let Err(e) = bank.hirc.insert(object) {
                            warn!("HIRC record {} dropped: {}", id, e);
                            bank.push_diagnostic(offset, "HIRC", &e);
                        }
                    }
                }
                Err(e) => {
                    warn!("HIRC chunk at {:#x} kept raw: {}", offset, e);
                    bank.push_diagnostic(offset, "HIRC", &e);
                    keep_raw(bank, tag, payload);
                }
            },
            ChunkTag::STID => match parse_stid(&payload) {
                Ok(names) => bank.bank_names.get_or_insert_with(IndexMap::new).extend(names),
                Err(e) => {
                    warn!("STID chunk kept raw: {}", e);
                    bank.push_diagnostic(offset, "STID", &e);
                    keep_raw(bank, tag, payload);
                }
            },
            ChunkTag::STMG | ChunkTag::ENVS | ChunkTag::PLAT => {
                let checked = match tag {
                    ChunkTag::STMG => validate_stmg(&payload, bank.version).map(|summary| {
                        debug!(
                            "STMG: {} state groups, {} switch groups, {} game parameters",
                            summary.state_groups, summary.switch_groups, summary.game_parameters
                        )
                    }),
                    ChunkTag::ENVS => validate_envs(&payload, bank.version),
                    _ => validate_plat(&payload).map(|platform| debug!("PLAT: {}", platform)),
                };
                if let Err(e) = checked {
                    warn!("{} chunk did not validate: {}", tag, e);
                    bank.push_diagnostic(offset, tag.to_string(), &e);
                }
                keep_raw(bank, tag, payload);
            }
            ChunkTag::INIT => keep_raw(bank, tag, payload),
            _ => {
                warn!("Unknown chunk {} at {:#x} ({} bytes), kept raw", tag, offset, size);
                keep_raw(bank, tag, payload);
            }
        }

        offset += 8 + size as u64;
    }

    if offset == 0 {
        return Err(BnkError::InvalidMagic {
            expected: ChunkTag::BKHD.to_string(),
            found: "end of stream".to_string(),
        });
    }

    match (didx, data) {
        (Some((didx_offset, didx_payload)), Some((_, data_payload))) => {
            let joined = parse_didx(&didx_payload)
                .and_then(|entries| join_media(&entries, &data_payload, bank));
            if let Err(e) = joined {
                warn!("Embedded media kept raw: {}", e);
                bank.push_diagnostic(didx_offset, "DIDX", &e);
                keep_raw(bank, ChunkTag::DIDX, didx_payload);
                keep_raw(bank, ChunkTag::DATA, data_payload);
            }
        }
        (Some((didx_offset, didx_payload)), None) => {
            let e = BnkError::ParseError("DIDX without DATA".to_string());
            bank.push_diagnostic(didx_offset, "DIDX", &e);
            keep_raw(bank, ChunkTag::DIDX, didx_payload);
        }
        (None, Some((data_offset, data_payload))) => {
            let e = BnkError::ParseError("DATA without DIDX".to_string());
            bank.push_diagnostic(data_offset, "DATA", &e);
            keep_raw(bank, ChunkTag::DATA, data_payload);
        }
        (None, None) => {}
    }

    Ok(())
}

impl SoundBank {
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bank = SoundBank::default();
        parse_bank(&mut reader, &mut bank)?;
        Ok(bank)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Ids listed in a bank's DIDX chunk, found by walking chunk headers only.
    pub fn scan_media_ids(bytes: &[u8]) -> Result<Vec<u32>> {
        let mut reader = Cursor::new(bytes);
        while let Some(tag) = read_tag(&mut reader)? {
            let size = reader.read_u32::<LE>()?;
            if tag == ChunkTag::DIDX {
                let payload = reader.read_bytes(size as usize)?;
                return Ok(parse_didx(&payload)?.into_iter().map(|e| e.id).collect());
            }
            reader.skip_bytes(size as u64)?;
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BankBuilder;

    #[test]
    fn media_ids_without_a_full_parse() {
        let bank = BankBuilder::new()
            .with_id(1)
            .add_media(30, vec![1])
            .add_media(31, vec![2, 3])
            .build()
            .unwrap();
        let bytes = bank.to_bytes().unwrap();
        assert_eq!(SoundBank::scan_media_ids(&bytes).unwrap(), vec![30, 31]);

        let empty = SoundBank::new(2).to_bytes().unwrap();
        assert!(SoundBank::scan_media_ids(&empty).unwrap().is_empty());
        // cut inside the DIDX payload
        assert!(SoundBank::scan_media_ids(&bytes[..40]).is_err());
    }
}
