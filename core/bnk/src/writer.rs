use byteorder::{LE, WriteBytesExt};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use utils::{BinWriteExt, padding_for};

use crate::codec::count_u32;
use crate::error::{BnkError, Result};
use crate::types::*;

fn write_chunk<W: Write>(writer: &mut W, tag: ChunkTag, payload: &[u8]) -> Result<()> {
    writer.write_all(&tag.0)?;
    writer.write_u32::<LE>(count_u32(payload.len(), "chunk payload")?)?;
    writer.write_all(payload)?;
    Ok(())
}

impl SoundBank {
    /// BKHD payload built from the public bank fields.
    pub fn prepare_header(&self) -> Result<Vec<u8>> {
        let mut bkhd = Vec::with_capacity(BKHD_FIELDS_SIZE + self.header_padding);
        bkhd.write_u32::<LE>(self.version)?;
        bkhd.write_u32::<LE>(self.id)?;
        bkhd.write_u32::<LE>(self.language_id)?;
        bkhd.write_u32::<LE>(self.feedback_in_bank)?;
        bkhd.write_u32::<LE>(self.project_id)?;
        bkhd.write_zeros(self.header_padding)?;
        Ok(bkhd)
    }

    /// DIDX and DATA payloads. Entries keep media order, each starting on a 16-byte boundary.
    pub fn prepare_media(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut didx = Vec::with_capacity(self.media.len() * DIDX_ENTRY_SIZE);
        let mut data = Vec::with_capacity(self.media.total_size());
        for (id, bytes) in self.media.iter() {
            let pad = padding_for(data.len() as u64, MEDIA_ALIGNMENT);
            data.write_zeros(pad as usize)?;
            let offset = count_u32(data.len(), "DATA offset")?;
            didx.write_u32::<LE>(id)?;
            didx.write_u32::<LE>(offset)?;
            didx.write_u32::<LE>(count_u32(bytes.len(), "media size")?)?;
            data.write_all(bytes)?;
        }
        Ok((didx, data))
    }

    fn prepare_hirc(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        cursor.write_u32::<LE>(count_u32(self.hirc.len(), "HIRC records")?)?;
        for object in self.hirc.iter() {
            object.write(&mut cursor)?;
        }
        Ok(cursor.into_inner())
    }

    fn prepare_stid(names: &indexmap::IndexMap<u32, String>) -> Result<Vec<u8>> {
        let mut stid = Vec::new();
        stid.write_u32::<LE>(STID_TYPE_BANK)?;
        stid.write_u32::<LE>(count_u32(names.len(), "STID names")?)?;
        for (id, name) in names {
            stid.write_u32::<LE>(*id)?;
            stid.write_u8_prefixed_string(name)?;
        }
        Ok(stid)
    }

    /// Loaded order, with any canonical chunk that is missing slotted in after its
    /// nearest canonical predecessor.
    pub fn resolved_chunk_order(&self) -> Vec<ChunkTag> {
        if self.chunk_order.is_empty() {
            return ChunkTag::DEFAULT_ORDER.to_vec();
        }
        let mut order = self.chunk_order.clone();
        for (i, tag) in ChunkTag::DEFAULT_ORDER.iter().enumerate() {
            if order.contains(tag) {
                continue;
            }
            let pos = ChunkTag::DEFAULT_ORDER[..i]
                .iter()
                .rev()
                .find_map(|prev| order.iter().rposition(|t| t == prev))
                .map_or(0, |p| p + 1);
            order.insert(pos, *tag);
        }
        order
    }

    /// Payload for a modeled chunk, `None` when the bank has nothing to put in it.
    fn modeled_payload(&self, tag: ChunkTag, media: &mut Option<(Vec<u8>, Vec<u8>)>) -> Result<Option<Vec<u8>>> {
        let payload = match tag {
            ChunkTag::BKHD => Some(self.prepare_header()?),
            ChunkTag::DIDX | ChunkTag::DATA if !self.media.is_empty() => {
                if media.is_none() {
                    *media = Some(self.prepare_media()?);
                }
                media
                    .as_ref()
                    .map(|(didx, data)| if tag == ChunkTag::DIDX { didx.clone() } else { data.clone() })
            }
            ChunkTag::HIRC if !self.hirc.is_empty() => Some(self.prepare_hirc()?),
            ChunkTag::STID => match &self.bank_names {
                Some(names) => Some(Self::prepare_stid(names)?),
                None => None,
            },
            _ => None,
        };
        Ok(payload)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut used = vec![false; self.extra_chunks.len()];
        let mut emitted = HashSet::new();
        let mut media = None;

        for tag in self.resolved_chunk_order() {
            let raw = self
                .extra_chunks
                .iter()
                .enumerate()
                .find(|(i, chunk)| !used[*i] && chunk.tag == tag)
                .map(|(i, _)| i);
            if let Some(i) = raw {
                used[i] = true;
                write_chunk(writer, tag, &self.extra_chunks[i].data)?;
                continue;
            }
            if tag.is_modeled() && emitted.insert(tag) {
                if let Some(payload) = self.modeled_payload(tag, &mut media)? {
                    write_chunk(writer, tag, &payload)?;
                }
            }
        }

        for (chunk, _) in self.extra_chunks.iter().zip(&used).filter(|(_, used)| !**used) {
            write_chunk(writer, chunk.tag, &chunk.data)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer)?;
        writer.flush().map_err(BnkError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hirc::{EventValues, HircItem, HircObject};

    #[test]
    fn fresh_bank_writes_header_only() {
        let bank = SoundBank::new(7);
        let bytes = bank.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"BKHD");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 20);
        assert_eq!(bytes.len(), 28);
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), DEFAULT_BANK_VERSION);
    }

    #[test]
    fn media_offsets_are_aligned() {
        let mut bank = SoundBank::new(1);
        bank.media.insert(100, vec![1; 5]).unwrap();
        bank.media.insert(200, vec![2; 3]).unwrap();
        let (didx, data) = bank.prepare_media().unwrap();
        assert_eq!(didx.len(), 24);
        assert_eq!(u32::from_le_bytes(didx[16..20].try_into().unwrap()), 16);
        assert_eq!(data.len(), 19);
        assert_eq!(&data[5..16], &[0; 11]);
    }

    #[test]
    fn missing_canonical_chunks_follow_their_predecessor() {
        let mut bank = SoundBank::new(1);
        bank.chunk_order = vec![ChunkTag::BKHD, ChunkTag(*b"ABCD"), ChunkTag::HIRC];
        let order = bank.resolved_chunk_order();
        assert_eq!(order[0], ChunkTag::BKHD);
        assert_eq!(order[1], ChunkTag::DIDX);
        assert_eq!(order[2], ChunkTag::DATA);
        assert_eq!(order[3], ChunkTag(*b"ABCD"));
        assert_eq!(order[4], ChunkTag::HIRC);
        assert_eq!(order[5], ChunkTag::STID);
    }

    #[test]
    fn raw_chunks_keep_their_slot() {
        let mut bank = SoundBank::new(1);
        bank.hirc
            .insert(HircObject::Event(HircItem::new(5, EventValues { actions: vec![] })))
            .unwrap();
        bank.extra_chunks.push(RawChunk {
            tag: ChunkTag(*b"ABCD"),
            data: vec![9, 9],
        });
        bank.chunk_order = vec![ChunkTag::BKHD, ChunkTag(*b"ABCD"), ChunkTag::HIRC];
        let bytes = bank.to_bytes().unwrap();
        assert_eq!(&bytes[28..32], b"ABCD");
        assert_eq!(&bytes[36..38], &[9, 9]);
        assert_eq!(&bytes[38..42], b"HIRC");
    }
}
