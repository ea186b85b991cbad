use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::InitialRtpc;
use crate::codec::BinCodec;
use crate::error::Result;
use crate::props::PropBundle;

/// Shared by LFO, envelope and time modulators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModulatorValues {
    pub props: PropBundle,
    pub ranged_props: PropBundle,
    pub initial_rtpc: InitialRtpc,
}

impl Default for ModulatorValues {
    fn default() -> Self {
        ModulatorValues {
            props: PropBundle::new(false),
            ranged_props: PropBundle::new(true),
            initial_rtpc: InitialRtpc::default(),
        }
    }
}

impl BinCodec for ModulatorValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(ModulatorValues {
            props: PropBundle::read(reader, false)?,
            ranged_props: PropBundle::read(reader, true)?,
            initial_rtpc: InitialRtpc::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.props.write(writer)?;
        self.ranged_props.write(writer)?;
        self.initial_rtpc.write(writer)
    }
}

pub type Modulator = HircItem<ModulatorValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropId;
    use std::io::Cursor;

    fn decode_exact<T: BinCodec + std::fmt::Debug>(bytes: &[u8]) -> T {
        let mut cursor = Cursor::new(bytes);
        let value = T::read(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        let mut written = Vec::new();
        value.write(&mut written).unwrap();
        assert_eq!(written, bytes);
        value
    }

    #[test]
    fn ranged_props_and_curves() {
        let mut bytes = vec![1, 0x0F];
        bytes.extend_from_slice(&250.0f32.to_le_bytes());
        // ranged pitch stores a min/max pair
        bytes.extend_from_slice(&[1, 0x02]);
        bytes.extend_from_slice(&(-100.0f32).to_le_bytes());
        bytes.extend_from_slice(&100.0f32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&0xAAAAu32.to_le_bytes());
        bytes.extend_from_slice(&[0, 3, 8]);
        bytes.extend_from_slice(&0x77u32.to_le_bytes());
        bytes.push(2);
        bytes.extend_from_slice(&2u16.to_le_bytes());
        for (from, to, interpolation) in [(0.0f32, 1.0f32, 4u32), (100.0, 0.5, 9)] {
            bytes.extend_from_slice(&from.to_le_bytes());
            bytes.extend_from_slice(&to.to_le_bytes());
            bytes.extend_from_slice(&interpolation.to_le_bytes());
        }

        let modulator: ModulatorValues = decode_exact(&bytes);
        assert_eq!(modulator.props.get_f32(PropId::DelayTime), Some(250.0));
        assert!(modulator.ranged_props.ranged);
        assert_eq!(modulator.ranged_props.get(PropId::Pitch).map(<[u8]>::len), Some(8));
        let curve = &modulator.initial_rtpc.curves[0];
        assert_eq!((curve.rtpc_id, curve.param_id, curve.curve_id), (0xAAAA, 8, 0x77));
        assert_eq!(curve.points[1].interpolation, 9);
    }

    #[test]
    fn default_is_three_empty_counts() {
        let mut bytes = Vec::new();
        ModulatorValues::default().write(&mut bytes).unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);
        let _: ModulatorValues = decode_exact(&bytes);
    }
}
