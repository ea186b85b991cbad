//! Interactive music nodes: segments, tracks, switch and playlist containers.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::{BinReadExt, BinWriteExt};

use super::HircItem;
use super::common::{BankSourceData, GraphPoint, NodeBaseParams, read_points_u32, write_points_u32};
use super::decision_tree::SwitchTree;
use crate::codec::{
    BinCodec, count_u32, read_bool, read_id_list, read_vec, write_bool, write_id_list, write_slice,
};
use crate::error::{BnkError, Result};

/// Track type whose body carries switch and transition parameters.
pub const TRACK_TYPE_SWITCH: u8 = 3;

/// Nesting limit for playlist items; deeper input is rejected.
const MAX_PLAYLIST_DEPTH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterInfo {
    pub grid_period: f64,
    pub grid_offset: f64,
    pub tempo: f32,
    pub beats_per_bar: u8,
    pub beat_value: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stinger {
    pub trigger_id: u32,
    pub segment_id: u32,
    pub sync_play_at: u32,
    pub cue_filter_hash: u32,
    pub dont_repeat_time: i32,
    pub num_segment_look_ahead: u32,
}

impl BinCodec for Stinger {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Stinger {
            trigger_id: reader.read_u32::<LE>()?,
            segment_id: reader.read_u32::<LE>()?,
            sync_play_at: reader.read_u32::<LE>()?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            dont_repeat_time: reader.read_i32::<LE>()?,
            num_segment_look_ahead: reader.read_u32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.trigger_id)?;
        writer.write_u32::<LE>(self.segment_id)?;
        writer.write_u32::<LE>(self.sync_play_at)?;
        writer.write_u32::<LE>(self.cue_filter_hash)?;
        writer.write_i32::<LE>(self.dont_repeat_time)?;
        writer.write_u32::<LE>(self.num_segment_look_ahead)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicNodeParams {
    /// `MusicNodeFlags`
    pub flags: u8,
    pub node_base: NodeBaseParams,
    pub children: Vec<u32>,
    pub meter: MeterInfo,
    pub meter_flags: u8,
    pub stingers: Vec<Stinger>,
}

impl BinCodec for MusicNodeParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = reader.read_u8()?;
        let node_base = NodeBaseParams::read(reader)?;
        let children = read_id_list(reader)?;
        let meter = MeterInfo {
            grid_period: reader.read_f64::<LE>()?,
            grid_offset: reader.read_f64::<LE>()?,
            tempo: reader.read_f32::<LE>()?,
            beats_per_bar: reader.read_u8()?,
            beat_value: reader.read_u8()?,
        };
        let meter_flags = reader.read_u8()?;
        let stinger_count = reader.read_u32::<LE>()? as usize;
        Ok(MusicNodeParams {
            flags,
            node_base,
            children,
            meter,
            meter_flags,
            stingers: read_vec(reader, stinger_count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        self.node_base.write(writer)?;
        write_id_list(writer, &self.children)?;
        writer.write_f64::<LE>(self.meter.grid_period)?;
        writer.write_f64::<LE>(self.meter.grid_offset)?;
        writer.write_f32::<LE>(self.meter.tempo)?;
        writer.write_u8(self.meter.beats_per_bar)?;
        writer.write_u8(self.meter.beat_value)?;
        writer.write_u8(self.meter_flags)?;
        writer.write_u32::<LE>(count_u32(self.stingers.len(), "stingers")?)?;
        write_slice(writer, &self.stingers)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FadeParams {
    pub transition_time: i32,
    pub fade_curve: u32,
    pub fade_offset: i32,
}

impl BinCodec for FadeParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(FadeParams {
            transition_time: reader.read_i32::<LE>()?,
            fade_curve: reader.read_u32::<LE>()?,
            fade_offset: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i32::<LE>(self.transition_time)?;
        writer.write_u32::<LE>(self.fade_curve)?;
        writer.write_i32::<LE>(self.fade_offset)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionSource {
    pub fade: FadeParams,
    pub sync_type: u32,
    pub cue_filter_hash: u32,
    pub play_post_exit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionDestination {
    pub fade: FadeParams,
    pub cue_filter_hash: u32,
    pub jump_to_id: u32,
    pub jump_to_type: u16,
    pub entry_type: u16,
    pub play_pre_entry: bool,
    pub match_source_cue_name: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionObject {
    pub segment_id: u32,
    pub fade_in: FadeParams,
    pub fade_out: FadeParams,
    pub play_pre_entry: bool,
    pub play_post_exit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionRule {
    pub source_ids: Vec<u32>,
    pub destination_ids: Vec<u32>,
    pub source: TransitionSource,
    pub destination: TransitionDestination,
    /// Raw allocation flag; a transition object follows when it is non-zero.
    pub alloc_trans_object: u8,
    pub transition_object: Option<TransitionObject>,
}

impl BinCodec for TransitionRule {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let source_ids = read_id_list(reader)?;
        let destination_ids = read_id_list(reader)?;
        let source = TransitionSource {
            fade: FadeParams::read(reader)?,
            sync_type: reader.read_u32::<LE>()?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            play_post_exit: read_bool(reader)?,
        };
        let destination = TransitionDestination {
            fade: FadeParams::read(reader)?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            jump_to_id: reader.read_u32::<LE>()?,
            jump_to_type: reader.read_u16::<LE>()?,
            entry_type: reader.read_u16::<LE>()?,
            play_pre_entry: read_bool(reader)?,
            match_source_cue_name: read_bool(reader)?,
        };
        let alloc_trans_object = reader.read_u8()?;
        let transition_object = if alloc_trans_object != 0 {
            Some(TransitionObject {
                segment_id: reader.read_u32::<LE>()?,
                fade_in: FadeParams::read(reader)?,
                fade_out: FadeParams::read(reader)?,
                play_pre_entry: read_bool(reader)?,
                play_post_exit: read_bool(reader)?,
            })
        } else {
            None
        };
        Ok(TransitionRule {
            source_ids,
            destination_ids,
            source,
            destination,
            alloc_trans_object,
            transition_object,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_id_list(writer, &self.source_ids)?;
        write_id_list(writer, &self.destination_ids)?;
        self.source.fade.write(writer)?;
        writer.write_u32::<LE>(self.source.sync_type)?;
        writer.write_u32::<LE>(self.source.cue_filter_hash)?;
        write_bool(writer, self.source.play_post_exit)?;
        self.destination.fade.write(writer)?;
        writer.write_u32::<LE>(self.destination.cue_filter_hash)?;
        writer.write_u32::<LE>(self.destination.jump_to_id)?;
        writer.write_u16::<LE>(self.destination.jump_to_type)?;
        writer.write_u16::<LE>(self.destination.entry_type)?;
        write_bool(writer, self.destination.play_pre_entry)?;
        write_bool(writer, self.destination.match_source_cue_name)?;
        match &self.transition_object {
            Some(object) => {
                writer.write_u8(self.alloc_trans_object.max(1))?;
                writer.write_u32::<LE>(object.segment_id)?;
                object.fade_in.write(writer)?;
                object.fade_out.write(writer)?;
                write_bool(writer, object.play_pre_entry)?;
                write_bool(writer, object.play_post_exit)?;
            }
            None => writer.write_u8(0)?,
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicTransNodeParams {
    pub music: MusicNodeParams,
    pub rules: Vec<TransitionRule>,
}

impl BinCodec for MusicTransNodeParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let music = MusicNodeParams::read(reader)?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicTransNodeParams {
            music,
            rules: read_vec(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.music.write(writer)?;
        writer.write_u32::<LE>(count_u32(self.rules.len(), "transition rules")?)?;
        write_slice(writer, &self.rules)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicMarker {
    pub id: u32,
    pub position: f64,
    pub name: String,
}

impl BinCodec for MusicMarker {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(MusicMarker {
            id: reader.read_u32::<LE>()?,
            position: reader.read_f64::<LE>()?,
            name: reader.read_null_term_string()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_f64::<LE>(self.position)?;
        writer.write_null_term_string(&self.name)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicSegmentValues {
    pub music: MusicNodeParams,
    pub duration: f64,
    pub markers: Vec<MusicMarker>,
}

impl BinCodec for MusicSegmentValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let music = MusicNodeParams::read(reader)?;
        let duration = reader.read_f64::<LE>()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicSegmentValues {
            music,
            duration,
            markers: read_vec(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.music.write(writer)?;
        writer.write_f64::<LE>(self.duration)?;
        writer.write_u32::<LE>(count_u32(self.markers.len(), "markers")?)?;
        write_slice(writer, &self.markers)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPlaylistItem {
    pub track_id: u32,
    pub source_id: u32,
    pub event_id: u32,
    pub play_at: f64,
    pub begin_trim_offset: f64,
    pub end_trim_offset: f64,
    pub src_duration: f64,
}

impl BinCodec for TrackPlaylistItem {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(TrackPlaylistItem {
            track_id: reader.read_u32::<LE>()?,
            source_id: reader.read_u32::<LE>()?,
            event_id: reader.read_u32::<LE>()?,
            play_at: reader.read_f64::<LE>()?,
            begin_trim_offset: reader.read_f64::<LE>()?,
            end_trim_offset: reader.read_f64::<LE>()?,
            src_duration: reader.read_f64::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.track_id)?;
        writer.write_u32::<LE>(self.source_id)?;
        writer.write_u32::<LE>(self.event_id)?;
        writer.write_f64::<LE>(self.play_at)?;
        writer.write_f64::<LE>(self.begin_trim_offset)?;
        writer.write_f64::<LE>(self.end_trim_offset)?;
        writer.write_f64::<LE>(self.src_duration)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipAutomation {
    pub clip_index: u32,
    pub auto_type: u32,
    pub points: Vec<GraphPoint>,
}

impl BinCodec for ClipAutomation {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(ClipAutomation {
            clip_index: reader.read_u32::<LE>()?,
            auto_type: reader.read_u32::<LE>()?,
            points: read_points_u32(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.clip_index)?;
        writer.write_u32::<LE>(self.auto_type)?;
        write_points_u32(writer, &self.points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSwitchParams {
    pub group_type: u8,
    pub group_id: u32,
    pub default_switch: u32,
    pub switch_associations: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTransParams {
    pub source_fade: FadeParams,
    pub sync_type: u32,
    pub cue_filter_hash: u32,
    pub destination_fade: FadeParams,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackSwitch {
    pub switch_params: TrackSwitchParams,
    pub trans_params: TrackTransParams,
}

impl BinCodec for TrackSwitch {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let switch_params = TrackSwitchParams {
            group_type: reader.read_u8()?,
            group_id: reader.read_u32::<LE>()?,
            default_switch: reader.read_u32::<LE>()?,
            switch_associations: read_id_list(reader)?,
        };
        let trans_params = TrackTransParams {
            source_fade: FadeParams::read(reader)?,
            sync_type: reader.read_u32::<LE>()?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            destination_fade: FadeParams::read(reader)?,
        };
        Ok(TrackSwitch {
            switch_params,
            trans_params,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let switch = &self.switch_params;
        writer.write_u8(switch.group_type)?;
        writer.write_u32::<LE>(switch.group_id)?;
        writer.write_u32::<LE>(switch.default_switch)?;
        write_id_list(writer, &switch.switch_associations)?;
        let trans = &self.trans_params;
        trans.source_fade.write(writer)?;
        writer.write_u32::<LE>(trans.sync_type)?;
        writer.write_u32::<LE>(trans.cue_filter_hash)?;
        trans.destination_fade.write(writer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicTrackValues {
    /// `MusicTrackFlags`
    pub flags: u8,
    pub sources: Vec<BankSourceData>,
    pub playlist: Vec<TrackPlaylistItem>,
    /// Written only when the playlist is non-empty.
    pub sub_track_count: u32,
    pub clip_automation: Vec<ClipAutomation>,
    pub node_base: NodeBaseParams,
    pub track_type: u8,
    /// Present only for switch tracks.
    pub switch: Option<TrackSwitch>,
    pub look_ahead_time: i32,
}

impl BinCodec for MusicTrackValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let flags = reader.read_u8()?;
        let source_count = reader.read_u32::<LE>()? as usize;
        let sources = read_vec(reader, source_count)?;
        let playlist_count = reader.read_u32::<LE>()? as usize;
        let playlist = read_vec(reader, playlist_count)?;
        let sub_track_count = if playlist_count > 0 {
            reader.read_u32::<LE>()?
        } else {
            0
        };
        let clip_count = reader.read_u32::<LE>()? as usize;
        let clip_automation = read_vec(reader, clip_count)?;
        let node_base = NodeBaseParams::read(reader)?;
        let track_type = reader.read_u8()?;
        let switch = if track_type == TRACK_TYPE_SWITCH {
            Some(TrackSwitch::read(reader)?)
        } else {
            None
        };
        Ok(MusicTrackValues {
            flags,
            sources,
            playlist,
            sub_track_count,
            clip_automation,
            node_base,
            track_type,
            switch,
            look_ahead_time: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        writer.write_u32::<LE>(count_u32(self.sources.len(), "track sources")?)?;
        write_slice(writer, &self.sources)?;
        writer.write_u32::<LE>(count_u32(self.playlist.len(), "track playlist")?)?;
        write_slice(writer, &self.playlist)?;
        if !self.playlist.is_empty() {
            writer.write_u32::<LE>(self.sub_track_count)?;
        }
        writer.write_u32::<LE>(count_u32(self.clip_automation.len(), "clip automation")?)?;
        write_slice(writer, &self.clip_automation)?;
        self.node_base.write(writer)?;
        writer.write_u8(self.track_type)?;
        if self.track_type == TRACK_TYPE_SWITCH {
            match &self.switch {
                Some(switch) => switch.write(writer)?,
                None => TrackSwitch::default().write(writer)?,
            }
        }
        writer.write_i32::<LE>(self.look_ahead_time)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicSwitchValues {
    pub trans: MusicTransNodeParams,
    pub continue_playback: bool,
    pub tree: SwitchTree,
}

impl BinCodec for MusicSwitchValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(MusicSwitchValues {
            trans: MusicTransNodeParams::read(reader)?,
            continue_playback: read_bool(reader)?,
            tree: SwitchTree::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.trans.write(writer)?;
        write_bool(writer, self.continue_playback)?;
        self.tree.write(writer)
    }
}

/// Node of a music playlist. Groups hold children; leaves name a segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicPlaylistItem {
    pub segment_id: u32,
    pub playlist_item_id: u32,
    pub rs_type: u32,
    pub loop_count: i16,
    pub loop_min: i16,
    pub loop_max: i16,
    pub weight: u32,
    pub avoid_repeat_count: u16,
    pub is_using_weight: bool,
    pub is_shuffle: bool,
    pub children: Vec<MusicPlaylistItem>,
}

impl MusicPlaylistItem {
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MusicPlaylistItem::count).sum::<usize>()
    }

    pub fn segment_ids(&self, out: &mut Vec<u32>) {
        if self.segment_id != 0 {
            out.push(self.segment_id);
        }
        for child in &self.children {
            child.segment_ids(out);
        }
    }

    fn read_nested<R: Read>(reader: &mut R, depth: usize) -> Result<Self> {
        if depth > MAX_PLAYLIST_DEPTH {
            return Err(BnkError::ParseError(format!(
                "music playlist nested deeper than {} levels",
                MAX_PLAYLIST_DEPTH
            )));
        }
        let segment_id = reader.read_u32::<LE>()?;
        let playlist_item_id = reader.read_u32::<LE>()?;
        let child_count = reader.read_u32::<LE>()? as usize;
        let mut item = MusicPlaylistItem {
            segment_id,
            playlist_item_id,
            rs_type: reader.read_u32::<LE>()?,
            loop_count: reader.read_i16::<LE>()?,
            loop_min: reader.read_i16::<LE>()?,
            loop_max: reader.read_i16::<LE>()?,
            weight: reader.read_u32::<LE>()?,
            avoid_repeat_count: reader.read_u16::<LE>()?,
            is_using_weight: read_bool(reader)?,
            is_shuffle: read_bool(reader)?,
            children: Vec::with_capacity(child_count.min(256)),
        };
        for _ in 0..child_count {
            item.children.push(Self::read_nested(reader, depth + 1)?);
        }
        Ok(item)
    }

    fn write_nested<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.segment_id)?;
        writer.write_u32::<LE>(self.playlist_item_id)?;
        writer.write_u32::<LE>(count_u32(self.children.len(), "playlist children")?)?;
        writer.write_u32::<LE>(self.rs_type)?;
        writer.write_i16::<LE>(self.loop_count)?;
        writer.write_i16::<LE>(self.loop_min)?;
        writer.write_i16::<LE>(self.loop_max)?;
        writer.write_u32::<LE>(self.weight)?;
        writer.write_u16::<LE>(self.avoid_repeat_count)?;
        write_bool(writer, self.is_using_weight)?;
        write_bool(writer, self.is_shuffle)?;
        for child in &self.children {
            child.write_nested(writer)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MusicRanSeqValues {
    pub trans: MusicTransNodeParams,
    /// Root of the playlist, absent when the stored item count is zero.
    pub playlist: Option<MusicPlaylistItem>,
}

impl BinCodec for MusicRanSeqValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let trans = MusicTransNodeParams::read(reader)?;
        let total = reader.read_u32::<LE>()? as usize;
        let playlist = if total > 0 {
            let root = MusicPlaylistItem::read_nested(reader, 0)?;
            if root.count() != total {
                return Err(BnkError::ParseError(format!(
                    "music playlist declares {} items but holds {}",
                    total,
                    root.count()
                )));
            }
            Some(root)
        } else {
            None
        };
        Ok(MusicRanSeqValues { trans, playlist })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.trans.write(writer)?;
        match &self.playlist {
            Some(root) => {
                writer.write_u32::<LE>(count_u32(root.count(), "music playlist")?)?;
                root.write_nested(writer)
            }
            None => {
                writer.write_u32::<LE>(0)?;
                Ok(())
            }
        }
    }
}

pub type MusicSegment = HircItem<MusicSegmentValues>;
pub type MusicTrack = HircItem<MusicTrackValues>;
pub type MusicSwitch = HircItem<MusicSwitchValues>;
pub type MusicRandomSequence = HircItem<MusicRanSeqValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip<T: BinCodec + PartialEq + std::fmt::Debug>(value: &T) -> Vec<u8> {
        let mut bytes = Vec::new();
        value.write(&mut bytes).unwrap();
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(&T::read(&mut cursor).unwrap(), value);
        assert_eq!(cursor.position() as usize, bytes.len());
        bytes
    }

    #[test]
    fn segment_markers_are_null_terminated() {
        let values = MusicSegmentValues {
            duration: 4000.0,
            markers: vec![
                MusicMarker {
                    id: 1,
                    position: 0.0,
                    name: "Entry Cue".to_string(),
                },
                MusicMarker {
                    id: 2,
                    position: 4000.0,
                    name: String::new(),
                },
            ],
            ..Default::default()
        };
        roundtrip(&values);
    }

    #[test]
    fn sub_track_count_follows_non_empty_playlist() {
        let empty = MusicTrackValues::default();
        let with_clip = MusicTrackValues {
            sources: vec![BankSourceData::embedded(0x0004_0001, 55, 100)],
            playlist: vec![TrackPlaylistItem {
                track_id: 0,
                source_id: 55,
                src_duration: 1500.0,
                ..Default::default()
            }],
            sub_track_count: 1,
            ..Default::default()
        };
        let empty_len = roundtrip(&empty).len();
        let clip_len = roundtrip(&with_clip).len();
        assert_eq!(clip_len, empty_len + 14 + 44 + 4);
    }

    #[test]
    fn switch_track_carries_switch_block() {
        let values = MusicTrackValues {
            track_type: TRACK_TYPE_SWITCH,
            switch: Some(TrackSwitch {
                switch_params: TrackSwitchParams {
                    group_type: 0,
                    group_id: 0x77,
                    default_switch: 0x78,
                    switch_associations: vec![0x78, 0x79],
                },
                trans_params: TrackTransParams {
                    sync_type: 1,
                    ..Default::default()
                },
            }),
            look_ahead_time: 100,
            ..Default::default()
        };
        roundtrip(&values);
    }

    #[test]
    fn transition_object_follows_alloc_flag() {
        let mut rule = TransitionRule {
            source_ids: vec![u32::MAX],
            destination_ids: vec![u32::MAX],
            ..Default::default()
        };
        let plain = roundtrip(&rule).len();
        rule.alloc_trans_object = 1;
        rule.transition_object = Some(TransitionObject {
            segment_id: 0x42,
            ..Default::default()
        });
        assert_eq!(roundtrip(&rule).len(), plain + 4 + 12 + 12 + 2);
    }

    #[test]
    fn nested_playlist() {
        let leaf = |segment_id| MusicPlaylistItem {
            segment_id,
            playlist_item_id: segment_id + 1000,
            weight: 50000,
            ..Default::default()
        };
        let values = MusicRanSeqValues {
            playlist: Some(MusicPlaylistItem {
                rs_type: 1,
                children: vec![leaf(10), leaf(20)],
                ..Default::default()
            }),
            ..Default::default()
        };
        roundtrip(&values);
        let mut ids = Vec::new();
        values.playlist.as_ref().unwrap().segment_ids(&mut ids);
        assert_eq!(ids, vec![10, 20]);
    }

    #[test]
    fn playlist_count_mismatch_is_an_error() {
        let values = MusicRanSeqValues {
            playlist: Some(MusicPlaylistItem::default()),
            ..Default::default()
        };
        let mut bytes = Vec::new();
        values.write(&mut bytes).unwrap();
        // the total item count sits right before the 30-byte root item
        let count_at = bytes.len() - 30 - 4;
        bytes[count_at] = 3;
        assert!(MusicRanSeqValues::read(&mut Cursor::new(&bytes)).is_err());
    }
}
