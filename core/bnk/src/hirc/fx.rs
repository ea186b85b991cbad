use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::BinReadExt;

use super::HircItem;
use super::common::{InitialRtpc, StateChunk};
use crate::codec::{BinCodec, count_u8, count_u16, count_u32, read_vec, write_slice};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxMediaRef {
    pub index: u8,
    pub source_id: u32,
}

impl BinCodec for FxMediaRef {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(FxMediaRef {
            index: reader.read_u8()?,
            source_id: reader.read_u32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.index)?;
        writer.write_u32::<LE>(self.source_id)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginPropertyValue {
    pub property_id: u32,
    pub rtpc_accum: u8,
    pub value: f32,
}

impl BinCodec for PluginPropertyValue {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(PluginPropertyValue {
            property_id: reader.read_u32::<LE>()?,
            rtpc_accum: reader.read_u8()?,
            value: reader.read_f32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.property_id)?;
        writer.write_u8(self.rtpc_accum)?;
        writer.write_f32::<LE>(self.value)?;
        Ok(())
    }
}

/// Plugin instance shared by effect share sets, custom effects and audio devices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FxValues {
    pub plugin_id: u32,
    #[serde(with = "crate::hex_serde")]
    pub params: Vec<u8>,
    pub media: Vec<FxMediaRef>,
    pub initial_rtpc: InitialRtpc,
    pub state_chunk: StateChunk,
    pub property_values: Vec<PluginPropertyValue>,
}

impl BinCodec for FxValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let plugin_id = reader.read_u32::<LE>()?;
        let params_size = reader.read_u32::<LE>()? as usize;
        let params = reader.read_bytes(params_size)?;
        let media_count = reader.read_u8()? as usize;
        let media = read_vec(reader, media_count)?;
        let initial_rtpc = InitialRtpc::read(reader)?;
        let state_chunk = StateChunk::read(reader)?;
        let value_count = reader.read_u16::<LE>()? as usize;
        Ok(FxValues {
            plugin_id,
            params,
            media,
            initial_rtpc,
            state_chunk,
            property_values: read_vec(reader, value_count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.plugin_id)?;
        writer.write_u32::<LE>(count_u32(self.params.len(), "plugin params")?)?;
        writer.write_all(&self.params)?;
        writer.write_u8(count_u8(self.media.len(), "plugin media")?)?;
        write_slice(writer, &self.media)?;
        self.initial_rtpc.write(writer)?;
        self.state_chunk.write(writer)?;
        writer.write_u16::<LE>(count_u16(self.property_values.len(), "plugin property values")?)?;
        write_slice(writer, &self.property_values)
    }
}

pub type Fx = HircItem<FxValues>;
