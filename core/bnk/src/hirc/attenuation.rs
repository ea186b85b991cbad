use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::{GraphPoint, InitialRtpc, read_points_u16, write_points_u16};
use crate::codec::{BinCodec, count_u8, read_bool, read_vec, write_bool, write_slice};
use crate::error::Result;

pub const CURVE_SLOTS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConeParams {
    pub inside_degrees: f32,
    pub outside_degrees: f32,
    pub outside_volume: f32,
    pub low_pass: f32,
    pub high_pass: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionTable {
    pub scaling: u8,
    pub points: Vec<GraphPoint>,
}

impl BinCodec for ConversionTable {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(ConversionTable {
            scaling: reader.read_u8()?,
            points: read_points_u16(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.scaling)?;
        write_points_u16(writer, &self.points)
    }
}

/// Distance curves. `curves_to_use` maps each of the seven curve slots
/// (volume, aux, LPF, HPF, spread, focus, and the user aux curve) to an index
/// into `curves`, or 0xFF when the slot is unused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttenuationValues {
    pub cone: Option<ConeParams>,
    pub curves_to_use: [u8; CURVE_SLOTS],
    pub curves: Vec<ConversionTable>,
    pub initial_rtpc: InitialRtpc,
}

impl BinCodec for AttenuationValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let cone = if read_bool(reader)? {
            Some(ConeParams {
                inside_degrees: reader.read_f32::<LE>()?,
                outside_degrees: reader.read_f32::<LE>()?,
                outside_volume: reader.read_f32::<LE>()?,
                low_pass: reader.read_f32::<LE>()?,
                high_pass: reader.read_f32::<LE>()?,
            })
        } else {
            None
        };
        let mut curves_to_use = [0u8; CURVE_SLOTS];
        reader.read_exact(&mut curves_to_use)?;
        let curve_count = reader.read_u8()? as usize;
        let curves = read_vec(reader, curve_count)?;
        Ok(AttenuationValues {
            cone,
            curves_to_use,
            curves,
            initial_rtpc: InitialRtpc::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_bool(writer, self.cone.is_some())?;
        if let Some(cone) = &self.cone {
            writer.write_f32::<LE>(cone.inside_degrees)?;
            writer.write_f32::<LE>(cone.outside_degrees)?;
            writer.write_f32::<LE>(cone.outside_volume)?;
            writer.write_f32::<LE>(cone.low_pass)?;
            writer.write_f32::<LE>(cone.high_pass)?;
        }
        writer.write_all(&self.curves_to_use)?;
        writer.write_u8(count_u8(self.curves.len(), "attenuation curves")?)?;
        write_slice(writer, &self.curves)?;
        self.initial_rtpc.write(writer)
    }
}

pub type Attenuation = HircItem<AttenuationValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cone_is_optional() {
        let mut values = AttenuationValues {
            curves_to_use: [0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
            curves: vec![ConversionTable {
                scaling: 2,
                points: vec![
                    GraphPoint {
                        from: 0.0,
                        to: 0.0,
                        interpolation: 4,
                    },
                    GraphPoint {
                        from: 100.0,
                        to: -96.3,
                        interpolation: 4,
                    },
                ],
            }],
            ..Default::default()
        };
        let mut plain = Vec::new();
        values.write(&mut plain).unwrap();

        values.cone = Some(ConeParams {
            inside_degrees: 90.0,
            outside_degrees: 180.0,
            ..Default::default()
        });
        let mut with_cone = Vec::new();
        values.write(&mut with_cone).unwrap();
        assert_eq!(with_cone.len(), plain.len() + 20);

        let parsed = AttenuationValues::read(&mut Cursor::new(&with_cone)).unwrap();
        assert_eq!(parsed, values);
    }
}
