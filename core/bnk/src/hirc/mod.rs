//! HIRC records: the bank's object hierarchy.
//!
//! Every record is `type: u8`, `size: u32`, `id: u32`, payload, where `size` covers the id
//! and the payload. Payloads are decoded from an in-memory slice so a record that is
//! mis-modeled can never desynchronize its siblings: if decoding fails or stops short of
//! the declared size, the record is kept as [`RawObject`] and re-emitted byte for byte.

pub mod action;
pub mod attenuation;
pub mod bus;
pub mod common;
pub mod container;
pub mod decision_tree;
pub mod dialogue;
pub mod event;
pub mod feedback;
pub mod fx;
pub mod modulator;
pub mod music;
pub mod sound;
pub mod state;

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek, Write};
use tracing::{debug, warn};
use utils::{BinReadExt, patch_u32_at};

use crate::codec::BinCodec;
use crate::error::{BnkError, Result};

pub use action::{Action, ActionParams, ActionValues};
pub use attenuation::{Attenuation, AttenuationValues};
pub use bus::{Bus, BusValues};
pub use common::{BankSourceData, MediaInformation, NodeBaseParams};
pub use container::{
    ActorMixer, ActorMixerValues, LayerContainer, LayerContainerValues, RanSeqValues,
    RandomSequenceContainer, SwitchContainer, SwitchContainerValues,
};
pub use decision_tree::{DecisionTree, SwitchTree, TreeData};
pub use dialogue::{DialogueEvent, DialogueEventValues};
pub use event::{Event, EventValues};
pub use feedback::{FeedbackNode, FeedbackNodeValues};
pub use fx::{Fx, FxValues};
pub use modulator::{Modulator, ModulatorValues};
pub use music::{
    MusicRanSeqValues, MusicRandomSequence, MusicSegment, MusicSegmentValues, MusicSwitch,
    MusicSwitchValues, MusicTrack, MusicTrackValues,
};
pub use sound::{Sound, SoundValues};
pub use state::{State, StateValues};

/// A record id paired with its variant-specific payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HircItem<V> {
    pub id: u32,
    pub values: V,
}

impl<V> HircItem<V> {
    pub fn new(id: u32, values: V) -> Self {
        HircItem { id, values }
    }
}

/// Record kept undecoded: unknown type codes and bodies that failed to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObject {
    pub type_code: u8,
    pub id: u32,
    #[serde(with = "crate::hex_serde")]
    pub data: Vec<u8>,
}

const TYPE_SOUND: u8 = 2;
const TYPE_MUSIC_TRACK: u8 = 11;
const TYPE_FEEDBACK_NODE: u8 = 17;

/// `MediaInformation` sits after the plugin id and stream type of a `BankSourceData`.
const MEDIA_INFO_OFFSET: usize = 5;

/// Company id, device id and volume offset ahead of each feedback source.
const FEEDBACK_SOURCE_PREFIX: u64 = 8;

impl RawObject {
    /// Body offsets of each `MediaInformation` in the source list that opens a Sound,
    /// MusicTrack or FeedbackNode body. The list is walked on its own, so it is found
    /// even when a later part of the body failed to decode. Other types have none.
    pub fn media_information_offsets(&self) -> Result<Vec<usize>> {
        let mut reader = Cursor::new(self.data.as_slice());
        let (count, prefix) = match self.type_code {
            TYPE_SOUND => (1, 0),
            TYPE_MUSIC_TRACK => {
                reader.skip_bytes(1)?; // flags
                (reader.read_u32::<LE>()?, 0)
            }
            TYPE_FEEDBACK_NODE => (reader.read_u32::<LE>()?, FEEDBACK_SOURCE_PREFIX),
            _ => return Ok(Vec::new()),
        };
        let mut offsets = Vec::new();
        for _ in 0..count {
            reader.skip_bytes(prefix)?;
            let start = reader.position() as usize;
            BankSourceData::read(&mut reader)?;
            offsets.push(start + MEDIA_INFO_OFFSET);
        }
        Ok(offsets)
    }

    /// Source ids named by the leading source list. Empty when it cannot be walked.
    pub fn media_references(&self) -> Vec<u32> {
        self.media_information_offsets()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|offset| self.data.get(offset..offset + 4))
            .map(|field| u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
            .collect()
    }

    /// Rewrite `in_memory_media_size` of every source naming `source_id`.
    /// Returns how many fields changed.
    pub fn patch_media_size(&mut self, source_id: u32, size: u32) -> Result<usize> {
        let mut patched = 0;
        for offset in self.media_information_offsets()? {
            let Some(field) = self.data.get_mut(offset..offset + 8) else {
                continue;
            };
            if u32::from_le_bytes([field[0], field[1], field[2], field[3]]) == source_id {
                field[4..].copy_from_slice(&size.to_le_bytes());
                patched += 1;
            }
        }
        Ok(patched)
    }
}

/// Size fields rewritten inside a HIRC chunk that was kept raw as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawChunkPatch {
    pub patched: usize,
    /// Records whose source list could not be walked, plus one when the record headers
    /// run past the payload and the rest of the chunk is skipped.
    pub unchecked: usize,
}

fn le_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let field = bytes.get(at..at + 4)?;
    Some(u32::from_le_bytes([field[0], field[1], field[2], field[3]]))
}

/// Rewrite `in_memory_media_size` for `source_id` across the records of a raw HIRC
/// chunk payload. Records are delimited by their headers alone.
pub fn patch_raw_hirc_media_size(payload: &mut [u8], source_id: u32, size: u32) -> RawChunkPatch {
    let mut result = RawChunkPatch::default();
    let Some(count) = le_u32(payload, 0) else {
        result.unchecked = 1;
        return result;
    };
    let mut pos = 4;
    for _ in 0..count {
        let (Some(&type_code), Some(record_size), Some(id)) =
            (payload.get(pos), le_u32(payload, pos + 1), le_u32(payload, pos + 5))
        else {
            result.unchecked += 1;
            break;
        };
        let body_start = pos + 9;
        let body_end = pos + 5 + record_size as usize;
        if record_size < 4 || body_end > payload.len() {
            result.unchecked += 1;
            break;
        }
        let mut record = RawObject {
            type_code,
            id,
            data: payload[body_start..body_end].to_vec(),
        };
        match record.patch_media_size(source_id, size) {
            Ok(0) => {}
            Ok(patched) => {
                payload[body_start..body_end].copy_from_slice(&record.data);
                result.patched += patched;
            }
            Err(e) => {
                debug!("raw HIRC record {} (type {}) not walked: {}", id, type_code, e);
                result.unchecked += 1;
            }
        }
        pos = body_end;
    }
    result
}

/// Outcome of reading one record. `issue` is set when a known type was kept raw.
#[derive(Debug)]
pub struct RecordRead {
    pub object: HircObject,
    pub issue: Option<BnkError>,
}

fn decode_values<V: BinCodec>(id: u32, body: &[u8]) -> Result<V> {
    let mut cursor = Cursor::new(body);
    let values = V::read(&mut cursor)?;
    let consumed = cursor.position();
    if consumed != body.len() as u64 {
        return Err(BnkError::SizeMismatch {
            context: "HIRC record".to_string(),
            id: Some(id),
            declared: body.len() as u64 + 4,
            consumed: consumed + 4,
        });
    }
    Ok(values)
}

macro_rules! hirc_objects {
    ($($variant:ident = $code:literal => $values:ty),+ $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "kind")]
        pub enum HircObject {
            $($variant(HircItem<$values>),)+
            Raw(RawObject),
        }

        impl HircObject {
            pub fn id(&self) -> u32 {
                match self {
                    $(HircObject::$variant(item) => item.id,)+
                    HircObject::Raw(raw) => raw.id,
                }
            }

            pub fn set_id(&mut self, id: u32) {
                match self {
                    $(HircObject::$variant(item) => item.id = id,)+
                    HircObject::Raw(raw) => raw.id = id,
                }
            }

            pub fn type_code(&self) -> u8 {
                match self {
                    $(HircObject::$variant(_) => $code,)+
                    HircObject::Raw(raw) => raw.type_code,
                }
            }

            pub fn kind_name(&self) -> &'static str {
                match self {
                    $(HircObject::$variant(_) => stringify!($variant),)+
                    HircObject::Raw(_) => "Raw",
                }
            }

            /// Type name for a raw type code, `None` when the code is not modeled.
            pub fn kind_name_of(type_code: u8) -> Option<&'static str> {
                match type_code {
                    $($code => Some(stringify!($variant)),)+
                    _ => None,
                }
            }

            /// `None` when the type code is not modeled.
            fn decode(type_code: u8, id: u32, body: &[u8]) -> Option<Result<Self>> {
                match type_code {
                    $($code => Some(
                        decode_values::<$values>(id, body)
                            .map(|values| HircObject::$variant(HircItem { id, values })),
                    ),)+
                    _ => None,
                }
            }

            fn write_values<W: Write>(&self, writer: &mut W) -> Result<()> {
                match self {
                    $(HircObject::$variant(item) => item.values.write(writer),)+
                    HircObject::Raw(raw) => {
                        writer.write_all(&raw.data)?;
                        Ok(())
                    }
                }
            }
        }
    };
}

hirc_objects! {
    State = 1 => state::StateValues,
    Sound = 2 => sound::SoundValues,
    Action = 3 => action::ActionValues,
    Event = 4 => event::EventValues,
    RandomSequenceContainer = 5 => container::RanSeqValues,
    SwitchContainer = 6 => container::SwitchContainerValues,
    ActorMixer = 7 => container::ActorMixerValues,
    Bus = 8 => bus::BusValues,
    LayerContainer = 9 => container::LayerContainerValues,
    MusicSegment = 10 => music::MusicSegmentValues,
    MusicTrack = 11 => music::MusicTrackValues,
    MusicSwitch = 12 => music::MusicSwitchValues,
    MusicRandomSequence = 13 => music::MusicRanSeqValues,
    Attenuation = 14 => attenuation::AttenuationValues,
    DialogueEvent = 15 => dialogue::DialogueEventValues,
    FeedbackBus = 16 => bus::BusValues,
    FeedbackNode = 17 => feedback::FeedbackNodeValues,
    FxShareSet = 18 => fx::FxValues,
    FxCustom = 19 => fx::FxValues,
    AuxBus = 20 => bus::BusValues,
    LfoModulator = 21 => modulator::ModulatorValues,
    EnvelopeModulator = 22 => modulator::ModulatorValues,
    AudioDevice = 23 => fx::FxValues,
    TimeModulator = 24 => modulator::ModulatorValues,
}

impl HircObject {
    /// Read one record. Truncated input is an error; everything else yields a record.
    pub fn read<R: Read>(reader: &mut R) -> Result<RecordRead> {
        let type_code = reader.read_u8()?;
        let size = reader.read_u32::<LE>()?;
        if size < 4 {
            return Err(BnkError::SizeMismatch {
                context: "HIRC record header".to_string(),
                id: None,
                declared: size as u64,
                consumed: 4,
            });
        }
        let id = reader.read_u32::<LE>()?;
        let body = reader.read_bytes(size as usize - 4)?;

        match HircObject::decode(type_code, id, &body) {
            Some(Ok(object)) => Ok(RecordRead {
                object,
                issue: None,
            }),
            Some(Err(e)) => {
                warn!(
                    "HIRC record {} (type {}) kept raw: {}",
                    id, type_code, e
                );
                Ok(RecordRead {
                    object: HircObject::Raw(RawObject {
                        type_code,
                        id,
                        data: body,
                    }),
                    issue: Some(e),
                })
            }
            None => {
                debug!("HIRC record {} has unknown type {}, kept raw", id, type_code);
                Ok(RecordRead {
                    object: HircObject::Raw(RawObject {
                        type_code,
                        id,
                        data: body,
                    }),
                    issue: None,
                })
            }
        }
    }

    /// Write the record, back-patching `size` once the payload length is known.
    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.type_code())?;
        let size_pos = writer.stream_position()?;
        writer.write_u32::<LE>(0)?;
        let id_start = writer.stream_position()?;
        writer.write_u32::<LE>(self.id())?;
        self.write_values(writer)?;
        let end = writer.stream_position()?;
        let size = u32::try_from(end - id_start)
            .map_err(|_| BnkError::OutOfRange(format!("HIRC record {} is too large", self.id())))?;
        patch_u32_at(writer, size_pos, size)?;
        Ok(())
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, HircObject::Raw(_))
    }

    /// Ids this record points at: event actions, action targets, container children
    /// and decision-tree destinations.
    pub fn children(&self) -> Vec<u32> {
        match self {
            HircObject::Event(item) => item.values.actions.clone(),
            HircObject::Action(item) if item.values.ext_id != 0 => vec![item.values.ext_id],
            HircObject::RandomSequenceContainer(item) => item.values.children.clone(),
            HircObject::SwitchContainer(item) => item.values.children.clone(),
            HircObject::ActorMixer(item) => item.values.children.clone(),
            HircObject::LayerContainer(item) => item.values.children.clone(),
            HircObject::MusicSegment(item) => item.values.music.children.clone(),
            HircObject::MusicSwitch(item) => {
                let mut ids = item.values.trans.music.children.clone();
                for id in item.values.tree.audio_node_ids() {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                ids
            }
            HircObject::MusicRandomSequence(item) => {
                let mut ids = item.values.trans.music.children.clone();
                if let Some(root) = &item.values.playlist {
                    let mut segments = Vec::new();
                    root.segment_ids(&mut segments);
                    for id in segments {
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                }
                ids
            }
            HircObject::DialogueEvent(item) => item.values.tree.audio_node_ids(),
            _ => Vec::new(),
        }
    }

    /// Source ids of embedded or streamed media this record plays.
    pub fn media_references(&self) -> Vec<u32> {
        match self {
            HircObject::Sound(item) => vec![item.values.source.media_information.source_id],
            HircObject::MusicTrack(item) => item
                .values
                .sources
                .iter()
                .map(|s| s.media_information.source_id)
                .collect(),
            HircObject::FeedbackNode(item) => item
                .values
                .sources
                .iter()
                .map(|s| s.source.media_information.source_id)
                .collect(),
            HircObject::FxShareSet(item) | HircObject::FxCustom(item) | HircObject::AudioDevice(item) => {
                item.values.media.iter().map(|m| m.source_id).collect()
            }
            HircObject::Raw(raw) => raw.media_references(),
            _ => Vec::new(),
        }
    }

    /// Mutable media descriptors, the fields that duplicate a media entry's length.
    /// Raw records are patched through [`RawObject::patch_media_size`] instead.
    pub fn media_information_mut(&mut self) -> Vec<&mut MediaInformation> {
        match self {
            HircObject::Sound(item) => vec![&mut item.values.source.media_information],
            HircObject::MusicTrack(item) => item
                .values
                .sources
                .iter_mut()
                .map(|s| &mut s.media_information)
                .collect(),
            HircObject::FeedbackNode(item) => item
                .values
                .sources
                .iter_mut()
                .map(|s| &mut s.source.media_information)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes(type_code: u8, id: u32, body: &[u8]) -> Vec<u8> {
        let mut out = vec![type_code];
        out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn write_to_vec(object: &HircObject) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        object.write(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn event_record_roundtrip() {
        let bytes = record_bytes(4, 0x100, &[1, 0x00, 0x02, 0x00, 0x00]);
        let read = HircObject::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(read.issue.is_none());
        match &read.object {
            HircObject::Event(event) => assert_eq!(event.values.actions, vec![0x200]),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(read.object.children(), vec![0x200]);
        assert_eq!(write_to_vec(&read.object), bytes);
    }

    #[test]
    fn unknown_type_is_raw_without_issue() {
        let bytes = record_bytes(0x7E, 9, &[0xDE, 0xAD]);
        let read = HircObject::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(read.issue.is_none());
        assert!(read.object.is_raw());
        assert_eq!(read.object.kind_name(), "Raw");
        assert_eq!(write_to_vec(&read.object), bytes);
    }

    #[test]
    fn trailing_bytes_keep_record_raw() {
        // one action id plus a stray byte
        let bytes = record_bytes(4, 0x100, &[1, 0x00, 0x02, 0x00, 0x00, 0xFF]);
        let read = HircObject::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(read.object.is_raw());
        assert!(matches!(
            read.issue,
            Some(BnkError::SizeMismatch {
                declared: 10,
                consumed: 9,
                ..
            })
        ));
        assert_eq!(write_to_vec(&read.object), bytes);
    }

    #[test]
    fn short_body_keeps_record_raw() {
        let bytes = record_bytes(4, 0x100, &[2, 0x00, 0x02, 0x00, 0x00]);
        let read = HircObject::read(&mut Cursor::new(&bytes)).unwrap();
        assert!(read.object.is_raw());
        assert!(matches!(read.issue, Some(BnkError::Io(_))));
    }

    #[test]
    fn truncated_stream_is_an_error() {
        let mut bytes = record_bytes(4, 0x100, &[1, 0x00, 0x02, 0x00, 0x00]);
        bytes.truncate(bytes.len() - 1);
        assert!(HircObject::read(&mut Cursor::new(&bytes)).is_err());
    }

    #[test]
    fn sound_media_fields_are_mutable() {
        let mut object = HircObject::Sound(HircItem::new(
            1,
            SoundValues {
                source: BankSourceData::embedded(0x0004_0001, 77, 10),
                node_base: NodeBaseParams::default(),
            },
        ));
        assert_eq!(object.media_references(), vec![77]);
        for info in object.media_information_mut() {
            info.in_memory_media_size = 20;
        }
        match object {
            HircObject::Sound(sound) => {
                assert_eq!(sound.values.source.media_information.in_memory_media_size, 20)
            }
            _ => unreachable!(),
        }
    }

    fn source_bytes(plugin_id: u32, source_id: u32, size: u32) -> Vec<u8> {
        let mut out = Vec::new();
        BankSourceData::embedded(plugin_id, source_id, size)
            .write(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn raw_sound_media_size_is_patched_in_place() {
        // a valid source followed by a body that does not decode
        let mut body = source_bytes(0x0004_0001, 0x42, 10);
        body.extend_from_slice(&[0xFF, 0xFF]);
        let bytes = record_bytes(2, 7, &body);
        let mut object = HircObject::read(&mut Cursor::new(&bytes)).unwrap().object;
        assert!(object.is_raw());
        assert_eq!(object.media_references(), vec![0x42]);

        let HircObject::Raw(raw) = &mut object else {
            panic!("expected a raw record");
        };
        assert_eq!(raw.patch_media_size(0x43, 99).unwrap(), 0);
        assert_eq!(raw.patch_media_size(0x42, 42).unwrap(), 1);
        assert_eq!(&raw.data[5..9], &0x42u32.to_le_bytes());
        assert_eq!(&raw.data[9..13], &42u32.to_le_bytes());
        assert_eq!(&raw.data[14..], &[0xFF, 0xFF]);
    }

    #[test]
    fn raw_track_and_feedback_sources_are_walked() {
        let mut track = vec![0x00];
        track.extend_from_slice(&2u32.to_le_bytes());
        track.extend_from_slice(&source_bytes(0x0004_0001, 5, 1));
        track.extend_from_slice(&source_bytes(0x0004_0001, 6, 1));
        track.push(0xEE);
        let mut raw = RawObject {
            type_code: 11,
            id: 1,
            data: track,
        };
        assert_eq!(raw.media_information_offsets().unwrap(), vec![10, 24]);
        assert_eq!(raw.patch_media_size(6, 3).unwrap(), 1);
        assert_eq!(&raw.data[28..32], &3u32.to_le_bytes());

        let mut feedback = 1u32.to_le_bytes().to_vec();
        feedback.extend_from_slice(&[0; 8]);
        feedback.extend_from_slice(&source_bytes(0x0004_0001, 9, 1));
        let raw = RawObject {
            type_code: 17,
            id: 2,
            data: feedback,
        };
        assert_eq!(raw.media_references(), vec![9]);
    }

    #[test]
    fn cut_short_source_list_cannot_be_patched() {
        let mut raw = RawObject {
            type_code: 2,
            id: 3,
            data: vec![0x01, 0x00],
        };
        assert!(raw.media_references().is_empty());
        assert!(raw.patch_media_size(1, 1).is_err());

        let mut other = RawObject {
            type_code: 99,
            id: 4,
            data: vec![],
        };
        assert_eq!(other.patch_media_size(1, 1).unwrap(), 0);
    }

    #[test]
    fn raw_hirc_chunk_is_walked_by_headers() {
        let mut payload = 3u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&record_bytes(2, 7, &source_bytes(0x0004_0001, 0x42, 10)));
        payload.extend_from_slice(&record_bytes(4, 8, &[0; 3]));
        let second_sound = payload.len();
        payload.extend_from_slice(&record_bytes(2, 9, &source_bytes(0x0004_0001, 0x42, 10)));
        // declares a fourth record that is not there
        payload[..4].copy_from_slice(&4u32.to_le_bytes());

        let result = patch_raw_hirc_media_size(&mut payload, 0x42, 77);
        assert_eq!(result, RawChunkPatch { patched: 2, unchecked: 1 });
        assert_eq!(&payload[4 + 9 + 9..4 + 9 + 13], &77u32.to_le_bytes());
        assert_eq!(&payload[second_sound + 18..second_sound + 22], &77u32.to_le_bytes());

        let mut empty = Vec::new();
        assert_eq!(patch_raw_hirc_media_size(&mut empty, 0x42, 1).unchecked, 1);
    }

    #[test]
    fn type_codes_match_variants() {
        assert_eq!(HircObject::kind_name_of(2), Some("Sound"));
        assert_eq!(HircObject::kind_name_of(20), Some("AuxBus"));
        assert_eq!(HircObject::kind_name_of(24), Some("TimeModulator"));
        assert_eq!(HircObject::kind_name_of(25), None);
    }

    #[test]
    fn json_uses_kind_tag() {
        let object = HircObject::Event(HircItem::new(5, EventValues { actions: vec![6] }));
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["kind"], "Event");
        let back: HircObject = serde_json::from_value(json).unwrap();
        assert_eq!(back, object);
    }
}
