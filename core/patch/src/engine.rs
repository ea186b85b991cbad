use bnk::hirc::patch_raw_hirc_media_size;
use bnk::{ChunkTag, HircObject, SoundBank};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PatchError, Result};

/// What one replacement touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceSummary {
    pub streaming_replaced: bool,
    pub banks_modified: usize,
    pub references_patched: usize,
    /// Raw Sound, MusicTrack or FeedbackNode records whose source list could not be
    /// read, and raw HIRC chunks cut short. A size field inside them may still hold
    /// the old length.
    #[serde(default)]
    pub references_unchecked: usize,
}

impl ReplaceSummary {
    pub fn is_empty(&self) -> bool {
        !self.streaming_replaced && self.banks_modified == 0
    }

    pub fn merge(&mut self, other: ReplaceSummary) {
        self.streaming_replaced |= other.streaming_replaced;
        self.banks_modified += other.banks_modified;
        self.references_patched += other.references_patched;
        self.references_unchecked += other.references_unchecked;
    }
}

/// Swap the embedded media `source_id` and rewrite every in-memory size that mirrors it,
/// in parsed records, in records kept raw and in a HIRC chunk kept raw as a whole.
///
/// A bank that does not embed `source_id` is left alone and yields an empty summary.
/// Only fixed-width size fields change, so no record or chunk length moves.
pub fn replace_wem(bank: &mut SoundBank, source_id: u32, data: &[u8]) -> Result<ReplaceSummary> {
    let mut summary = ReplaceSummary::default();
    if !bank.media.contains(source_id) {
        return Ok(summary);
    }
    let size = u32::try_from(data.len())
        .map_err(|_| PatchError::OutOfRange(format!("media {} of {} bytes", source_id, data.len())))?;
    bank.media.set(source_id, data.to_vec());
    summary.banks_modified = 1;

    let bank_id = bank.id;
    bank.hirc.update_all(|object| match object {
        HircObject::Raw(raw) => match raw.patch_media_size(source_id, size) {
            Ok(patched) => summary.references_patched += patched,
            Err(e) => {
                warn!(
                    "Bank {}: raw record {} (type {}) not checked for media {}: {}",
                    bank_id, raw.id, raw.type_code, source_id, e
                );
                summary.references_unchecked += 1;
            }
        },
        parsed => {
            for info in parsed.media_information_mut() {
                if info.source_id == source_id {
                    info.in_memory_media_size = size;
                    summary.references_patched += 1;
                }
            }
        }
    })?;

    for chunk in bank.extra_chunks.iter_mut().filter(|c| c.tag == ChunkTag::HIRC) {
        let result = patch_raw_hirc_media_size(&mut chunk.data, source_id, size);
        if result.unchecked > 0 {
            warn!(
                "Bank {}: {} records of a raw HIRC chunk not checked for media {}",
                bank_id, result.unchecked, source_id
            );
        }
        summary.references_patched += result.patched;
        summary.references_unchecked += result.unchecked;
    }

    debug!(
        "Bank {}: media {} replaced, {} size fields patched",
        bank_id, source_id, summary.references_patched
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bnk::{BinCodec, HircItem};
    use bnk::hirc::{BankSourceData, RawObject, SoundValues};

    fn bank_with_sounds(count: u32, source_id: u32) -> SoundBank {
        let mut bank = SoundBank::new(1);
        bank.media.insert(source_id, vec![0; 10]).unwrap();
        for id in 0..count {
            let values = SoundValues {
                source: BankSourceData::embedded(0x0004_0001, source_id, 10),
                ..Default::default()
            };
            bank.hirc.insert(HircObject::Sound(HircItem::new(100 + id, values))).unwrap();
        }
        let other = SoundValues {
            source: BankSourceData::embedded(0x0004_0001, source_id + 1, 10),
            ..Default::default()
        };
        bank.hirc.insert(HircObject::Sound(HircItem::new(999, other))).unwrap();
        bank
    }

    #[test]
    fn every_reference_follows_the_new_size() {
        let mut bank = bank_with_sounds(3, 77);
        let summary = replace_wem(&mut bank, 77, &[5; 42]).unwrap();
        assert_eq!(summary.banks_modified, 1);
        assert_eq!(summary.references_patched, 3);
        assert_eq!(bank.media.get(77), Some(&[5u8; 42][..]));
        for sound in bank.hirc.sounds() {
            let info = &sound.values.source.media_information;
            let expected = if info.source_id == 77 { 42 } else { 10 };
            assert_eq!(info.in_memory_media_size, expected);
        }
    }

    #[test]
    fn absent_media_changes_nothing() {
        let mut bank = bank_with_sounds(2, 77);
        let before = bank.clone();
        let summary = replace_wem(&mut bank, 78, &[1]).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.references_patched, 0);
        assert_eq!(bank, before);
    }

    fn raw_sound(id: u32, source_id: u32, size: u32, tail: &[u8]) -> HircObject {
        let mut data = Vec::new();
        BankSourceData::embedded(0x0004_0001, source_id, size)
            .write(&mut data)
            .unwrap();
        data.extend_from_slice(tail);
        HircObject::Raw(RawObject {
            type_code: 2,
            id,
            data,
        })
    }

    #[test]
    fn raw_sounds_follow_the_new_size() {
        let mut bank = bank_with_sounds(1, 77);
        bank.hirc.insert(raw_sound(500, 77, 10, &[0xFF])).unwrap();
        bank.hirc.insert(raw_sound(501, 78, 10, &[0xFF])).unwrap();

        let summary = replace_wem(&mut bank, 77, &[1; 42]).unwrap();
        assert_eq!(summary.references_patched, 2);
        assert_eq!(summary.references_unchecked, 0);

        let size_of = |id: u32| match bank.hirc.get(id) {
            Some(HircObject::Raw(raw)) => u32::from_le_bytes(raw.data[9..13].try_into().unwrap()),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(size_of(500), 42);
        assert_eq!(size_of(501), 10);
    }

    #[test]
    fn unreadable_raw_sound_is_counted() {
        let mut bank = bank_with_sounds(1, 77);
        bank.hirc
            .insert(HircObject::Raw(RawObject {
                type_code: 2,
                id: 600,
                data: vec![0x01, 0x00, 0x04],
            }))
            .unwrap();
        let summary = replace_wem(&mut bank, 77, &[1; 5]).unwrap();
        assert_eq!(summary.references_patched, 1);
        assert_eq!(summary.references_unchecked, 1);
    }
}
