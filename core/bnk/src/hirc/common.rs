use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::BinReadExt;

use crate::codec::{
    BinCodec, count_u8, count_u16, count_u32, read_bool, read_vec, write_bool, write_slice,
};
use crate::error::{BnkError, Result};
use crate::flags::{AuxFlags, PositioningFlags, has_flag, position_type, with_flag};
use crate::props::PropBundle;

/// Plugin type nibble marking a source plugin, which carries an inline parameter blob.
const PLUGIN_TYPE_SOURCE: u32 = 2;

/// Position type that carries no path automation.
const POSITION_TYPE_EMITTER_ONLY: u8 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInformation {
    pub source_id: u32,
    pub in_memory_media_size: u32,
    pub source_flags: u8,
}

impl BinCodec for MediaInformation {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(MediaInformation {
            source_id: reader.read_u32::<LE>()?,
            in_memory_media_size: reader.read_u32::<LE>()?,
            source_flags: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.source_id)?;
        writer.write_u32::<LE>(self.in_memory_media_size)?;
        writer.write_u8(self.source_flags)?;
        Ok(())
    }
}

/// How a source's media is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    Embedded,
    PrefetchStreaming,
    Streaming,
    Other(u8),
}

impl From<u8> for StreamType {
    fn from(value: u8) -> Self {
        match value {
            0 => StreamType::Embedded,
            1 => StreamType::PrefetchStreaming,
            2 => StreamType::Streaming,
            other => StreamType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankSourceData {
    pub plugin_id: u32,
    pub stream_type: u8,
    pub media_information: MediaInformation,
    /// Only written for source plugins.
    #[serde(default, with = "crate::hex_serde")]
    pub plugin_params: Vec<u8>,
}

impl BankSourceData {
    pub fn embedded(plugin_id: u32, source_id: u32, media_size: u32) -> Self {
        BankSourceData {
            plugin_id,
            stream_type: 0,
            media_information: MediaInformation {
                source_id,
                in_memory_media_size: media_size,
                source_flags: 0,
            },
            plugin_params: Vec::new(),
        }
    }

    pub fn stream_type(&self) -> StreamType {
        StreamType::from(self.stream_type)
    }

    pub fn is_source_plugin(&self) -> bool {
        self.plugin_id & 0x0F == PLUGIN_TYPE_SOURCE
    }
}

impl BinCodec for BankSourceData {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let plugin_id = reader.read_u32::<LE>()?;
        let stream_type = reader.read_u8()?;
        let media_information = MediaInformation::read(reader)?;
        let mut source = BankSourceData {
            plugin_id,
            stream_type,
            media_information,
            plugin_params: Vec::new(),
        };
        if source.is_source_plugin() {
            let size = reader.read_u32::<LE>()? as usize;
            source.plugin_params = reader.read_bytes(size)?;
        }
        Ok(source)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.plugin_id)?;
        writer.write_u8(self.stream_type)?;
        self.media_information.write(writer)?;
        if self.is_source_plugin() {
            writer.write_u32::<LE>(count_u32(self.plugin_params.len(), "plugin params")?)?;
            writer.write_all(&self.plugin_params)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxSlot {
    pub index: u8,
    pub fx_id: u32,
    pub is_share_set: bool,
    pub is_rendered: bool,
}

impl BinCodec for FxSlot {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(FxSlot {
            index: reader.read_u8()?,
            fx_id: reader.read_u32::<LE>()?,
            is_share_set: read_bool(reader)?,
            is_rendered: read_bool(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.index)?;
        writer.write_u32::<LE>(self.fx_id)?;
        write_bool(writer, self.is_share_set)?;
        write_bool(writer, self.is_rendered)?;
        Ok(())
    }
}

/// Effect chain: `count: u8`, a bypass byte only when the chain is non-empty, then the slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxChain {
    pub bypass_bits: u8,
    pub effects: Vec<FxSlot>,
}

impl BinCodec for FxChain {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let mut chain = FxChain::default();
        if count > 0 {
            chain.bypass_bits = reader.read_u8()?;
            chain.effects = read_vec(reader, count)?;
        }
        Ok(chain)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(count_u8(self.effects.len(), "fx chain")?)?;
        if !self.effects.is_empty() {
            writer.write_u8(self.bypass_bits)?;
            write_slice(writer, &self.effects)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeInitialFxParams {
    pub override_parent: bool,
    pub chain: FxChain,
}

impl BinCodec for NodeInitialFxParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(NodeInitialFxParams {
            override_parent: read_bool(reader)?,
            chain: FxChain::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_bool(writer, self.override_parent)?;
        self.chain.write(writer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub duration: i32,
}

impl BinCodec for PathVertex {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PathVertex {
            x: reader.read_f32::<LE>()?,
            y: reader.read_f32::<LE>()?,
            z: reader.read_f32::<LE>()?,
            duration: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32::<LE>(self.x)?;
        writer.write_f32::<LE>(self.y)?;
        writer.write_f32::<LE>(self.z)?;
        writer.write_i32::<LE>(self.duration)?;
        Ok(())
    }
}

/// One playlist entry of a path. The range triple is stored after all entries on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPlaylistItem {
    pub vertices_offset: u32,
    pub num_vertices: u32,
    pub range_x: f32,
    pub range_y: f32,
    pub range_z: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathAutomation {
    pub path_mode: u8,
    pub transition_time: i32,
    pub vertices: Vec<PathVertex>,
    pub playlist: Vec<PathPlaylistItem>,
}

impl BinCodec for PathAutomation {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let path_mode = reader.read_u8()?;
        let transition_time = reader.read_i32::<LE>()?;
        let vertex_count = reader.read_u32::<LE>()? as usize;
        let vertices = read_vec(reader, vertex_count)?;
        let item_count = reader.read_u32::<LE>()? as usize;
        let mut playlist = Vec::with_capacity(item_count.min(4096));
        for _ in 0..item_count {
            playlist.push(PathPlaylistItem {
                vertices_offset: reader.read_u32::<LE>()?,
                num_vertices: reader.read_u32::<LE>()?,
                ..Default::default()
            });
        }
        for item in &mut playlist {
            item.range_x = reader.read_f32::<LE>()?;
            item.range_y = reader.read_f32::<LE>()?;
            item.range_z = reader.read_f32::<LE>()?;
        }
        Ok(PathAutomation {
            path_mode,
            transition_time,
            vertices,
            playlist,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.path_mode)?;
        writer.write_i32::<LE>(self.transition_time)?;
        writer.write_u32::<LE>(count_u32(self.vertices.len(), "path vertices")?)?;
        write_slice(writer, &self.vertices)?;
        writer.write_u32::<LE>(count_u32(self.playlist.len(), "path playlist")?)?;
        for item in &self.playlist {
            writer.write_u32::<LE>(item.vertices_offset)?;
            writer.write_u32::<LE>(item.num_vertices)?;
        }
        for item in &self.playlist {
            writer.write_f32::<LE>(item.range_x)?;
            writer.write_f32::<LE>(item.range_y)?;
            writer.write_f32::<LE>(item.range_z)?;
        }
        Ok(())
    }
}

/// `bits`, then (3D only) `bits_3d` + attenuation id, then (3D, position type != 1) automation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositioningParams {
    pub bits: u8,
    pub bits_3d: u8,
    pub attenuation_id: u32,
    pub automation: Option<PathAutomation>,
}

impl PositioningParams {
    pub fn has_3d(&self) -> bool {
        has_flag(self.bits, PositioningFlags::Positioning3dAvailable)
    }

    pub fn position_type(&self) -> u8 {
        position_type(self.bits_3d)
    }

    fn carries_automation(&self) -> bool {
        self.has_3d() && self.position_type() != POSITION_TYPE_EMITTER_ONLY
    }
}

impl BinCodec for PositioningParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut params = PositioningParams {
            bits: reader.read_u8()?,
            ..Default::default()
        };
        if params.has_3d() {
            params.bits_3d = reader.read_u8()?;
            params.attenuation_id = reader.read_u32::<LE>()?;
            if params.carries_automation() {
                params.automation = Some(PathAutomation::read(reader)?);
            }
        }
        Ok(params)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.bits)?;
        if self.has_3d() {
            writer.write_u8(self.bits_3d)?;
            writer.write_u32::<LE>(self.attenuation_id)?;
            if self.carries_automation() {
                match &self.automation {
                    Some(automation) => automation.write(writer)?,
                    None => PathAutomation::default().write(writer)?,
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuxParams {
    pub flags: u8,
    /// Present on disk only when `AuxFlags::HasAux` is set.
    pub aux_bus_ids: [u32; 4],
}

impl AuxParams {
    pub fn has_aux(&self) -> bool {
        has_flag(self.flags, AuxFlags::HasAux)
    }

    pub fn set_aux_buses(&mut self, ids: Option<[u32; 4]>) {
        self.flags = with_flag(self.flags, AuxFlags::HasAux, ids.is_some());
        self.aux_bus_ids = ids.unwrap_or_default();
    }
}

impl BinCodec for AuxParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut params = AuxParams {
            flags: reader.read_u8()?,
            aux_bus_ids: [0; 4],
        };
        if params.has_aux() {
            for id in &mut params.aux_bus_ids {
                *id = reader.read_u32::<LE>()?;
            }
        }
        Ok(params)
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        if self.has_aux() {
            for id in self.aux_bus_ids {
                writer.write_u32::<LE>(id)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvSettingsParams {
    pub flags: u8,
    pub virtual_queue_behavior: u8,
    pub max_num_instance: u16,
    pub below_threshold_behavior: u8,
    pub flags2: u8,
}

impl BinCodec for AdvSettingsParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(AdvSettingsParams {
            flags: reader.read_u8()?,
            virtual_queue_behavior: reader.read_u8()?,
            max_num_instance: reader.read_u16::<LE>()?,
            below_threshold_behavior: reader.read_u8()?,
            flags2: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.flags)?;
        writer.write_u8(self.virtual_queue_behavior)?;
        writer.write_u16::<LE>(self.max_num_instance)?;
        writer.write_u8(self.below_threshold_behavior)?;
        writer.write_u8(self.flags2)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateProp {
    pub id: u8,
    pub accum_type: u8,
    pub in_db: bool,
}

/// State-driven property list. State groups are not modeled: a non-zero group count
/// is rejected as an unsupported shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateChunk {
    pub props: Vec<StateProp>,
}

impl BinCodec for StateChunk {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let mut props = Vec::with_capacity(count);
        for _ in 0..count {
            props.push(StateProp {
                id: reader.read_u8()?,
                accum_type: reader.read_u8()?,
                in_db: read_bool(reader)?,
            });
        }
        let group_count = reader.read_u8()?;
        if group_count != 0 {
            return Err(BnkError::unsupported(
                "StateChunk",
                format!("{} state groups", group_count),
            ));
        }
        Ok(StateChunk { props })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(count_u8(self.props.len(), "state props")?)?;
        for prop in &self.props {
            writer.write_u8(prop.id)?;
            writer.write_u8(prop.accum_type)?;
            write_bool(writer, prop.in_db)?;
        }
        writer.write_u8(0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub from: f32,
    pub to: f32,
    pub interpolation: u32,
}

impl BinCodec for GraphPoint {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(GraphPoint {
            from: reader.read_f32::<LE>()?,
            to: reader.read_f32::<LE>()?,
            interpolation: reader.read_u32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32::<LE>(self.from)?;
        writer.write_f32::<LE>(self.to)?;
        writer.write_u32::<LE>(self.interpolation)?;
        Ok(())
    }
}

/// `u16` point count followed by the points.
pub(crate) fn read_points_u16<R: Read>(reader: &mut R) -> Result<Vec<GraphPoint>> {
    let count = reader.read_u16::<LE>()? as usize;
    read_vec(reader, count)
}

pub(crate) fn write_points_u16<W: Write>(writer: &mut W, points: &[GraphPoint]) -> Result<()> {
    writer.write_u16::<LE>(count_u16(points.len(), "curve points")?)?;
    write_slice(writer, points)
}

/// `u32` point count followed by the points.
pub(crate) fn read_points_u32<R: Read>(reader: &mut R) -> Result<Vec<GraphPoint>> {
    let count = reader.read_u32::<LE>()? as usize;
    read_vec(reader, count)
}

pub(crate) fn write_points_u32<W: Write>(writer: &mut W, points: &[GraphPoint]) -> Result<()> {
    writer.write_u32::<LE>(count_u32(points.len(), "curve points")?)?;
    write_slice(writer, points)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RtpcCurve {
    pub rtpc_id: u32,
    pub rtpc_type: u8,
    pub accum: u8,
    pub param_id: u8,
    pub curve_id: u32,
    pub scaling: u8,
    pub points: Vec<GraphPoint>,
}

impl BinCodec for RtpcCurve {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(RtpcCurve {
            rtpc_id: reader.read_u32::<LE>()?,
            rtpc_type: reader.read_u8()?,
            accum: reader.read_u8()?,
            param_id: reader.read_u8()?,
            curve_id: reader.read_u32::<LE>()?,
            scaling: reader.read_u8()?,
            points: read_points_u16(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.rtpc_id)?;
        writer.write_u8(self.rtpc_type)?;
        writer.write_u8(self.accum)?;
        writer.write_u8(self.param_id)?;
        writer.write_u32::<LE>(self.curve_id)?;
        writer.write_u8(self.scaling)?;
        write_points_u16(writer, &self.points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitialRtpc {
    pub curves: Vec<RtpcCurve>,
}

impl BinCodec for InitialRtpc {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u16::<LE>()? as usize;
        Ok(InitialRtpc {
            curves: read_vec(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<LE>(count_u16(self.curves.len(), "rtpc curves")?)?;
        write_slice(writer, &self.curves)
    }
}

/// Parameters shared by every node in the actor-mixer and music hierarchies.
/// All sub-blocks are always present; only fields inside some of them are conditional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBaseParams {
    pub fx: NodeInitialFxParams,
    pub override_attachment_params: bool,
    pub override_bus_id: u32,
    pub direct_parent_id: u32,
    pub flags: u8,
    pub props: PropBundle,
    pub ranged_props: PropBundle,
    pub positioning: PositioningParams,
    pub aux: AuxParams,
    pub adv_settings: AdvSettingsParams,
    pub state_chunk: StateChunk,
    pub initial_rtpc: InitialRtpc,
}

impl Default for NodeBaseParams {
    fn default() -> Self {
        NodeBaseParams {
            fx: NodeInitialFxParams::default(),
            override_attachment_params: false,
            override_bus_id: 0,
            direct_parent_id: 0,
            flags: 0,
            props: PropBundle::new(false),
            ranged_props: PropBundle::new(true),
            positioning: PositioningParams::default(),
            aux: AuxParams::default(),
            adv_settings: AdvSettingsParams::default(),
            state_chunk: StateChunk::default(),
            initial_rtpc: InitialRtpc::default(),
        }
    }
}

impl NodeBaseParams {
    pub fn with_parent(direct_parent_id: u32) -> Self {
        NodeBaseParams {
            direct_parent_id,
            ..Default::default()
        }
    }
}

impl BinCodec for NodeBaseParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(NodeBaseParams {
            fx: NodeInitialFxParams::read(reader)?,
            override_attachment_params: read_bool(reader)?,
            override_bus_id: reader.read_u32::<LE>()?,
            direct_parent_id: reader.read_u32::<LE>()?,
            flags: reader.read_u8()?,
            props: PropBundle::read(reader, false)?,
            ranged_props: PropBundle::read(reader, true)?,
            positioning: PositioningParams::read(reader)?,
            aux: AuxParams::read(reader)?,
            adv_settings: AdvSettingsParams::read(reader)?,
            state_chunk: StateChunk::read(reader)?,
            initial_rtpc: InitialRtpc::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.fx.write(writer)?;
        write_bool(writer, self.override_attachment_params)?;
        writer.write_u32::<LE>(self.override_bus_id)?;
        writer.write_u32::<LE>(self.direct_parent_id)?;
        writer.write_u8(self.flags)?;
        self.props.write(writer)?;
        self.ranged_props.write(writer)?;
        self.positioning.write(writer)?;
        self.aux.write(writer)?;
        self.adv_settings.write(writer)?;
        self.state_chunk.write(writer)?;
        self.initial_rtpc.write(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip<T: BinCodec + PartialEq + std::fmt::Debug>(bytes: &[u8]) -> T {
        let mut cursor = Cursor::new(bytes);
        let value = T::read(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len(), "bytes left over");
        let mut out = Vec::new();
        value.write(&mut out).unwrap();
        assert_eq!(out, bytes);
        value
    }

    #[test]
    fn positioning_emitter_only_has_no_automation() {
        let bytes = [0x08, 0x01, 0x78, 0x56, 0x34, 0x12];
        let params: PositioningParams = roundtrip(&bytes);
        assert!(params.has_3d());
        assert_eq!(params.attenuation_id, 0x12345678);
        assert!(params.automation.is_none());
    }

    #[test]
    fn positioning_without_3d_is_one_byte() {
        let params: PositioningParams = roundtrip(&[0x03]);
        assert!(!params.has_3d());
    }

    #[test]
    fn positioning_with_automation() {
        let mut bytes = vec![0x08, 0x02, 0x01, 0x00, 0x00, 0x00];
        bytes.push(0x04); // path mode
        bytes.extend_from_slice(&500i32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        for v in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.extend_from_slice(&250i32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        for v in [10.0f32, 0.0, 10.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let params: PositioningParams = roundtrip(&bytes);
        let automation = params.automation.unwrap();
        assert_eq!(automation.vertices.len(), 1);
        assert_eq!(automation.vertices[0].duration, 250);
        assert_eq!(automation.playlist[0].range_x, 10.0);
    }

    #[test]
    fn aux_ids_follow_has_aux() {
        let params: AuxParams = roundtrip(&[0x00]);
        assert!(!params.has_aux());

        let mut bytes = vec![0x08];
        for id in 1u32..=4 {
            bytes.extend_from_slice(&id.to_le_bytes());
        }
        let params: AuxParams = roundtrip(&bytes);
        assert_eq!(params.aux_bus_ids, [1, 2, 3, 4]);

        let mut params = AuxParams::default();
        params.set_aux_buses(Some([9, 0, 0, 0]));
        assert!(params.has_aux());
        params.set_aux_buses(None);
        assert_eq!(params.flags, 0);
    }

    #[test]
    fn state_groups_are_unsupported() {
        let err = StateChunk::read(&mut Cursor::new([0u8, 2u8])).unwrap_err();
        assert!(matches!(
            err,
            BnkError::Unsupported {
                structure: "StateChunk",
                ..
            }
        ));
        let chunk: StateChunk = roundtrip(&[1, 0x05, 0x01, 0x01, 0x00]);
        assert_eq!(chunk.props.len(), 1);
        assert!(chunk.props[0].in_db);
    }

    #[test]
    fn fx_chain_bypass_only_when_non_empty() {
        let chain: FxChain = roundtrip(&[0x00]);
        assert!(chain.effects.is_empty());
        let chain: FxChain = roundtrip(&[0x01, 0x01, 0x00, 0xEF, 0xBE, 0xAD, 0xDE, 0x01, 0x00]);
        assert_eq!(chain.bypass_bits, 1);
        assert_eq!(chain.effects[0].fx_id, 0xDEADBEEF);
        assert!(chain.effects[0].is_share_set);
    }

    #[test]
    fn source_plugin_carries_params() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0066_0002u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        let source: BankSourceData = roundtrip(&bytes);
        assert!(source.is_source_plugin());
        assert_eq!(source.plugin_params, vec![1, 2, 3]);

        let plain = BankSourceData::embedded(0x0004_0001, 99, 1024);
        let mut out = Vec::new();
        plain.write(&mut out).unwrap();
        assert_eq!(out.len(), 14);
        assert_eq!(plain.stream_type(), StreamType::Embedded);
    }

    #[test]
    fn node_base_default_roundtrips() {
        let mut out = Vec::new();
        NodeBaseParams::with_parent(42).write(&mut out).unwrap();
        let parsed: NodeBaseParams = roundtrip(&out);
        assert_eq!(parsed.direct_parent_id, 42);
        assert!(parsed.ranged_props.ranged);
    }
}
