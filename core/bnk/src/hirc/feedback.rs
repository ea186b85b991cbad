use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::{BankSourceData, NodeBaseParams};
use crate::codec::{BinCodec, count_u32, read_vec, write_slice};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSource {
    pub company_id: u16,
    pub device_id: u16,
    pub volume_offset: f32,
    pub source: BankSourceData,
}

impl BinCodec for FeedbackSource {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(FeedbackSource {
            company_id: reader.read_u16::<LE>()?,
            device_id: reader.read_u16::<LE>()?,
            volume_offset: reader.read_f32::<LE>()?,
            source: BankSourceData::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<LE>(self.company_id)?;
        writer.write_u16::<LE>(self.device_id)?;
        writer.write_f32::<LE>(self.volume_offset)?;
        self.source.write(writer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackNodeValues {
    pub sources: Vec<FeedbackSource>,
    pub node_base: NodeBaseParams,
}

impl BinCodec for FeedbackNodeValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u32::<LE>()? as usize;
        Ok(FeedbackNodeValues {
            sources: read_vec(reader, count)?,
            node_base: NodeBaseParams::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.sources.len(), "feedback sources")?)?;
        write_slice(writer, &self.sources)?;
        self.node_base.write(writer)
    }
}

pub type FeedbackNode = HircItem<FeedbackNodeValues>;
