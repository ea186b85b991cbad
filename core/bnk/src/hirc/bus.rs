use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::{AuxParams, FxChain, InitialRtpc, PositioningParams, StateChunk};
use crate::codec::BinCodec;
use crate::error::{BnkError, Result};
use crate::props::PropBundle;

/// Bus effect chain followed by the mixer plugin reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusInitialFxParams {
    pub chain: FxChain,
    pub mixer_fx_id: u32,
    /// `BusFlags3`
    pub flags3: u8,
}

impl BinCodec for BusInitialFxParams {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(BusInitialFxParams {
            chain: FxChain::read(reader)?,
            mixer_fx_id: reader.read_u32::<LE>()?,
            flags3: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.chain.write(writer)?;
        writer.write_u32::<LE>(self.mixer_fx_id)?;
        writer.write_u8(self.flags3)?;
        Ok(())
    }
}

/// Shared by master/child buses, aux buses and feedback buses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusValues {
    pub override_bus_id: u32,
    /// Present only on top-level buses (`override_bus_id == 0`).
    pub device_shareset_id: u32,
    pub props: PropBundle,
    pub positioning: PositioningParams,
    pub aux: AuxParams,
    /// `BusFlags1`
    pub flags1: u8,
    pub max_num_instance: u16,
    pub channel_config: u32,
    /// `BusFlags2`
    pub flags2: u8,
    pub recovery_time: i32,
    pub max_duck_volume: f32,
    pub fx: BusInitialFxParams,
    pub initial_rtpc: InitialRtpc,
    pub state_chunk: StateChunk,
}

impl BusValues {
    pub fn is_top_level(&self) -> bool {
        self.override_bus_id == 0
    }
}

impl BinCodec for BusValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let override_bus_id = reader.read_u32::<LE>()?;
        let device_shareset_id = if override_bus_id == 0 {
            reader.read_u32::<LE>()?
        } else {
            0
        };
        let props = PropBundle::read(reader, false)?;
        let positioning = PositioningParams::read(reader)?;
        let aux = AuxParams::read(reader)?;
        let flags1 = reader.read_u8()?;
        let max_num_instance = reader.read_u16::<LE>()?;
        let channel_config = reader.read_u32::<LE>()?;
        let flags2 = reader.read_u8()?;
        let recovery_time = reader.read_i32::<LE>()?;
        let max_duck_volume = reader.read_f32::<LE>()?;
        let duck_count = reader.read_u32::<LE>()?;
        if duck_count != 0 {
            return Err(BnkError::unsupported(
                "BusValues",
                format!("{} duck entries", duck_count),
            ));
        }
        Ok(BusValues {
            override_bus_id,
            device_shareset_id,
            props,
            positioning,
            aux,
            flags1,
            max_num_instance,
            channel_config,
            flags2,
            recovery_time,
            max_duck_volume,
            fx: BusInitialFxParams::read(reader)?,
            initial_rtpc: InitialRtpc::read(reader)?,
            state_chunk: StateChunk::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.override_bus_id)?;
        if self.is_top_level() {
            writer.write_u32::<LE>(self.device_shareset_id)?;
        }
        self.props.write(writer)?;
        self.positioning.write(writer)?;
        self.aux.write(writer)?;
        writer.write_u8(self.flags1)?;
        writer.write_u16::<LE>(self.max_num_instance)?;
        writer.write_u32::<LE>(self.channel_config)?;
        writer.write_u8(self.flags2)?;
        writer.write_i32::<LE>(self.recovery_time)?;
        writer.write_f32::<LE>(self.max_duck_volume)?;
        writer.write_u32::<LE>(0)?;
        self.fx.write(writer)?;
        self.initial_rtpc.write(writer)?;
        self.state_chunk.write(writer)
    }
}

pub type Bus = HircItem<BusValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hirc::common::FxSlot;
    use std::io::Cursor;

    fn encode(values: &BusValues) -> Vec<u8> {
        let mut bytes = Vec::new();
        values.write(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn device_id_only_on_top_level_bus() {
        let master = BusValues {
            device_shareset_id: 0x1DEA,
            ..Default::default()
        };
        let child = BusValues {
            override_bus_id: 0x55,
            ..Default::default()
        };
        assert_eq!(encode(&master).len(), encode(&child).len() + 4);

        let bytes = encode(&master);
        let parsed = BusValues::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed.device_shareset_id, 0x1DEA);
    }

    #[test]
    fn bus_fx_chain_roundtrips() {
        let values = BusValues {
            override_bus_id: 1,
            fx: BusInitialFxParams {
                chain: FxChain {
                    bypass_bits: 0,
                    effects: vec![FxSlot {
                        index: 0,
                        fx_id: 0xF00D,
                        is_share_set: true,
                        is_rendered: false,
                    }],
                },
                mixer_fx_id: 0xBEEF,
                flags3: 1,
            },
            ..Default::default()
        };
        let bytes = encode(&values);
        let mut cursor = Cursor::new(&bytes);
        assert_eq!(BusValues::read(&mut cursor).unwrap(), values);
        assert_eq!(cursor.position() as usize, bytes.len());
    }

    #[test]
    fn ducks_are_unsupported() {
        let mut bytes = encode(&BusValues {
            override_bus_id: 1,
            ..Default::default()
        });
        // override id, props, positioning, aux, flags1, max instances, channel config,
        // flags2, recovery time, duck volume, then the duck count
        let duck_offset = 4 + 1 + 1 + 1 + 1 + 2 + 4 + 1 + 4 + 4;
        bytes[duck_offset] = 1;
        let err = BusValues::read(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(
            err,
            BnkError::Unsupported {
                structure: "BusValues",
                ..
            }
        ));
    }
}
