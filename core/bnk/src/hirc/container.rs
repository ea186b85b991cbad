use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::{GraphPoint, InitialRtpc, NodeBaseParams, read_points_u32, write_points_u32};
use crate::codec::{
    BinCodec, count_u16, count_u32, read_bool, read_id_list, read_vec, write_bool, write_id_list,
    write_slice,
};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    pub play_id: u32,
    pub weight: i32,
}

impl BinCodec for PlaylistEntry {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PlaylistEntry {
            play_id: reader.read_u32::<LE>()?,
            weight: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.play_id)?;
        writer.write_i32::<LE>(self.weight)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RanSeqValues {
    pub node_base: NodeBaseParams,
    pub loop_count: u16,
    pub loop_mod_min: u16,
    pub loop_mod_max: u16,
    pub transition_time: f32,
    pub transition_time_mod_min: f32,
    pub transition_time_mod_max: f32,
    pub avoid_repeat_count: u16,
    pub transition_mode: u8,
    pub random_mode: u8,
    pub mode: u8,
    pub flags: u8,
    pub children: Vec<u32>,
    pub playlist: Vec<PlaylistEntry>,
}

impl BinCodec for RanSeqValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let node_base = NodeBaseParams::read(reader)?;
        let loop_count = reader.read_u16::<LE>()?;
        let loop_mod_min = reader.read_u16::<LE>()?;
        let loop_mod_max = reader.read_u16::<LE>()?;
        let transition_time = reader.read_f32::<LE>()?;
        let transition_time_mod_min = reader.read_f32::<LE>()?;
        let transition_time_mod_max = reader.read_f32::<LE>()?;
        let avoid_repeat_count = reader.read_u16::<LE>()?;
        let transition_mode = reader.read_u8()?;
        let random_mode = reader.read_u8()?;
        let mode = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let children = read_id_list(reader)?;
        let playlist_count = reader.read_u16::<LE>()? as usize;
        let playlist = read_vec(reader, playlist_count)?;
        Ok(RanSeqValues {
            node_base,
            loop_count,
            loop_mod_min,
            loop_mod_max,
            transition_time,
            transition_time_mod_min,
            transition_time_mod_max,
            avoid_repeat_count,
            transition_mode,
            random_mode,
            mode,
            flags,
            children,
            playlist,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.node_base.write(writer)?;
        writer.write_u16::<LE>(self.loop_count)?;
        writer.write_u16::<LE>(self.loop_mod_min)?;
        writer.write_u16::<LE>(self.loop_mod_max)?;
        writer.write_f32::<LE>(self.transition_time)?;
        writer.write_f32::<LE>(self.transition_time_mod_min)?;
        writer.write_f32::<LE>(self.transition_time_mod_max)?;
        writer.write_u16::<LE>(self.avoid_repeat_count)?;
        writer.write_u8(self.transition_mode)?;
        writer.write_u8(self.random_mode)?;
        writer.write_u8(self.mode)?;
        writer.write_u8(self.flags)?;
        write_id_list(writer, &self.children)?;
        writer.write_u16::<LE>(count_u16(self.playlist.len(), "playlist")?)?;
        write_slice(writer, &self.playlist)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchPackage {
    pub switch_id: u32,
    pub node_ids: Vec<u32>,
}

impl BinCodec for SwitchPackage {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(SwitchPackage {
            switch_id: reader.read_u32::<LE>()?,
            node_ids: read_id_list(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.switch_id)?;
        write_id_list(writer, &self.node_ids)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchNodeParams {
    pub node_id: u32,
    /// `SwitchNodeFlags`
    pub flags: u8,
    pub on_switch_mode: u8,
    pub fade_out_time: i32,
    pub fade_in_time: i32,
}

impl BinCodec for SwitchNodeParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(SwitchNodeParams {
            node_id: reader.read_u32::<LE>()?,
            flags: reader.read_u8()?,
            on_switch_mode: reader.read_u8()?,
            fade_out_time: reader.read_i32::<LE>()?,
            fade_in_time: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.node_id)?;
        writer.write_u8(self.flags)?;
        writer.write_u8(self.on_switch_mode)?;
        writer.write_i32::<LE>(self.fade_out_time)?;
        writer.write_i32::<LE>(self.fade_in_time)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchContainerValues {
    pub node_base: NodeBaseParams,
    pub group_type: u8,
    pub group_id: u32,
    pub default_switch: u32,
    pub is_continuous_validation: bool,
    pub children: Vec<u32>,
    pub switch_packages: Vec<SwitchPackage>,
    pub switch_params: Vec<SwitchNodeParams>,
}

impl BinCodec for SwitchContainerValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let node_base = NodeBaseParams::read(reader)?;
        let group_type = reader.read_u8()?;
        let group_id = reader.read_u32::<LE>()?;
        let default_switch = reader.read_u32::<LE>()?;
        let is_continuous_validation = read_bool(reader)?;
        let children = read_id_list(reader)?;
        let package_count = reader.read_u32::<LE>()? as usize;
        let switch_packages = read_vec(reader, package_count)?;
        let param_count = reader.read_u32::<LE>()? as usize;
        let switch_params = read_vec(reader, param_count)?;
        Ok(SwitchContainerValues {
            node_base,
            group_type,
            group_id,
            default_switch,
            is_continuous_validation,
            children,
            switch_packages,
            switch_params,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.node_base.write(writer)?;
        writer.write_u8(self.group_type)?;
        writer.write_u32::<LE>(self.group_id)?;
        writer.write_u32::<LE>(self.default_switch)?;
        write_bool(writer, self.is_continuous_validation)?;
        write_id_list(writer, &self.children)?;
        writer.write_u32::<LE>(count_u32(self.switch_packages.len(), "switch packages")?)?;
        write_slice(writer, &self.switch_packages)?;
        writer.write_u32::<LE>(count_u32(self.switch_params.len(), "switch params")?)?;
        write_slice(writer, &self.switch_params)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorMixerValues {
    pub node_base: NodeBaseParams,
    pub children: Vec<u32>,
}

impl BinCodec for ActorMixerValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(ActorMixerValues {
            node_base: NodeBaseParams::read(reader)?,
            children: read_id_list(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.node_base.write(writer)?;
        write_id_list(writer, &self.children)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociatedChild {
    pub child_id: u32,
    pub points: Vec<GraphPoint>,
}

impl BinCodec for AssociatedChild {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(AssociatedChild {
            child_id: reader.read_u32::<LE>()?,
            points: read_points_u32(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.child_id)?;
        write_points_u32(writer, &self.points)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub layer_id: u32,
    pub initial_rtpc: InitialRtpc,
    pub rtpc_id: u32,
    pub rtpc_type: u8,
    pub associations: Vec<AssociatedChild>,
}

impl BinCodec for Layer {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let layer_id = reader.read_u32::<LE>()?;
        let initial_rtpc = InitialRtpc::read(reader)?;
        let rtpc_id = reader.read_u32::<LE>()?;
        let rtpc_type = reader.read_u8()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(Layer {
            layer_id,
            initial_rtpc,
            rtpc_id,
            rtpc_type,
            associations: read_vec(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.layer_id)?;
        self.initial_rtpc.write(writer)?;
        writer.write_u32::<LE>(self.rtpc_id)?;
        writer.write_u8(self.rtpc_type)?;
        writer.write_u32::<LE>(count_u32(self.associations.len(), "layer associations")?)?;
        write_slice(writer, &self.associations)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerContainerValues {
    pub node_base: NodeBaseParams,
    pub children: Vec<u32>,
    pub layers: Vec<Layer>,
    pub is_continuous_validation: bool,
}

impl BinCodec for LayerContainerValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let node_base = NodeBaseParams::read(reader)?;
        let children = read_id_list(reader)?;
        let layer_count = reader.read_u32::<LE>()? as usize;
        let layers = read_vec(reader, layer_count)?;
        Ok(LayerContainerValues {
            node_base,
            children,
            layers,
            is_continuous_validation: read_bool(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.node_base.write(writer)?;
        write_id_list(writer, &self.children)?;
        writer.write_u32::<LE>(count_u32(self.layers.len(), "layers")?)?;
        write_slice(writer, &self.layers)?;
        write_bool(writer, self.is_continuous_validation)
    }
}

pub type RandomSequenceContainer = HircItem<RanSeqValues>;
pub type SwitchContainer = HircItem<SwitchContainerValues>;
pub type ActorMixer = HircItem<ActorMixerValues>;
pub type LayerContainer = HircItem<LayerContainerValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip<T: BinCodec + PartialEq + std::fmt::Debug>(value: &T) -> T {
        let mut bytes = Vec::new();
        value.write(&mut bytes).unwrap();
        let mut cursor = Cursor::new(&bytes);
        let parsed = T::read(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        assert_eq!(&parsed, value);
        parsed
    }

    #[test]
    fn random_container_keeps_playlist_order() {
        let values = RanSeqValues {
            children: vec![3, 1, 2],
            playlist: vec![
                PlaylistEntry {
                    play_id: 3,
                    weight: 50000,
                },
                PlaylistEntry {
                    play_id: 1,
                    weight: 25000,
                },
            ],
            loop_count: 1,
            transition_time: 1000.0,
            ..Default::default()
        };
        let parsed = roundtrip(&values);
        assert_eq!(parsed.playlist[0].play_id, 3);
    }

    #[test]
    fn switch_container_packages() {
        let values = SwitchContainerValues {
            group_id: 0x1000,
            default_switch: 0x2000,
            children: vec![7, 8],
            switch_packages: vec![SwitchPackage {
                switch_id: 0x2000,
                node_ids: vec![7],
            }],
            switch_params: vec![SwitchNodeParams {
                node_id: 7,
                flags: 0x02,
                ..Default::default()
            }],
            ..Default::default()
        };
        roundtrip(&values);
    }

    #[test]
    fn layer_container() {
        let values = LayerContainerValues {
            children: vec![5],
            layers: vec![Layer {
                layer_id: 9,
                rtpc_id: 0xABCD,
                associations: vec![AssociatedChild {
                    child_id: 5,
                    points: vec![GraphPoint {
                        from: 0.0,
                        to: 1.0,
                        interpolation: 4,
                    }],
                }],
                ..Default::default()
            }],
            is_continuous_validation: true,
            ..Default::default()
        };
        roundtrip(&values);
    }
}
