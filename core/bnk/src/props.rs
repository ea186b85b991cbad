use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::BinReadExt;

use crate::codec::count_u8;
use crate::error::{BnkError, Result};

/// Property ids that appear in property bundles. Ids not listed here are carried as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropId {
    Volume,
    Lfe,
    Pitch,
    LowPass,
    HighPass,
    BusVolume,
    MakeUpGain,
    Priority,
    PriorityDistanceOffset,
    MuteRatio,
    PanLr,
    PanFr,
    CenterPct,
    DelayTime,
    TransitionTime,
    Probability,
    DialogueMode,
    UserAuxSendVolume0,
    UserAuxSendVolume1,
    UserAuxSendVolume2,
    UserAuxSendVolume3,
    GameAuxSendVolume,
    OutputBusVolume,
    OutputBusHpf,
    OutputBusLpf,
    CurveType,
    AttenuationId,
    Other(u8),
}

impl PropId {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x00 => PropId::Volume,
            0x01 => PropId::Lfe,
            0x02 => PropId::Pitch,
            0x03 => PropId::LowPass,
            0x04 => PropId::HighPass,
            0x05 => PropId::BusVolume,
            0x06 => PropId::MakeUpGain,
            0x07 => PropId::Priority,
            0x08 => PropId::PriorityDistanceOffset,
            0x0B => PropId::MuteRatio,
            0x0C => PropId::PanLr,
            0x0D => PropId::PanFr,
            0x0E => PropId::CenterPct,
            0x0F => PropId::DelayTime,
            0x10 => PropId::TransitionTime,
            0x11 => PropId::Probability,
            0x12 => PropId::DialogueMode,
            0x13 => PropId::UserAuxSendVolume0,
            0x14 => PropId::UserAuxSendVolume1,
            0x15 => PropId::UserAuxSendVolume2,
            0x16 => PropId::UserAuxSendVolume3,
            0x17 => PropId::GameAuxSendVolume,
            0x18 => PropId::OutputBusVolume,
            0x19 => PropId::OutputBusHpf,
            0x1A => PropId::OutputBusLpf,
            0x3C => PropId::CurveType,
            0x46 => PropId::AttenuationId,
            other => PropId::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            PropId::Volume => 0x00,
            PropId::Lfe => 0x01,
            PropId::Pitch => 0x02,
            PropId::LowPass => 0x03,
            PropId::HighPass => 0x04,
            PropId::BusVolume => 0x05,
            PropId::MakeUpGain => 0x06,
            PropId::Priority => 0x07,
            PropId::PriorityDistanceOffset => 0x08,
            PropId::MuteRatio => 0x0B,
            PropId::PanLr => 0x0C,
            PropId::PanFr => 0x0D,
            PropId::CenterPct => 0x0E,
            PropId::DelayTime => 0x0F,
            PropId::TransitionTime => 0x10,
            PropId::Probability => 0x11,
            PropId::DialogueMode => 0x12,
            PropId::UserAuxSendVolume0 => 0x13,
            PropId::UserAuxSendVolume1 => 0x14,
            PropId::UserAuxSendVolume2 => 0x15,
            PropId::UserAuxSendVolume3 => 0x16,
            PropId::GameAuxSendVolume => 0x17,
            PropId::OutputBusVolume => 0x18,
            PropId::OutputBusHpf => 0x19,
            PropId::OutputBusLpf => 0x1A,
            PropId::CurveType => 0x3C,
            PropId::AttenuationId => 0x46,
            PropId::Other(other) => other,
        }
    }
}

/// Byte width of a property value. Ranged bundles store min/max pairs for the
/// range-capable ids, so those double in width.
pub fn prop_value_size(id: PropId, ranged: bool) -> usize {
    match id {
        PropId::Pitch
        | PropId::Volume
        | PropId::DelayTime
        | PropId::LowPass
        | PropId::TransitionTime => {
            if ranged {
                8
            } else {
                4
            }
        }
        PropId::Probability | PropId::CurveType => 1,
        _ => 4,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub id: u8,
    #[serde(with = "crate::hex_serde")]
    pub value: Vec<u8>,
}

impl Prop {
    pub fn prop_id(&self) -> PropId {
        PropId::from_u8(self.id)
    }
}

/// Ordered property list. On disk: `count: u8`, then all ids, then all values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropBundle {
    pub ranged: bool,
    pub props: Vec<Prop>,
}

impl PropBundle {
    pub fn new(ranged: bool) -> Self {
        PropBundle {
            ranged,
            props: Vec::new(),
        }
    }

    pub fn read<R: Read>(reader: &mut R, ranged: bool) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let ids = reader.read_bytes(count)?;
        let mut props = Vec::with_capacity(count);
        for id in ids {
            let size = prop_value_size(PropId::from_u8(id), ranged);
            let value = reader.read_bytes(size)?;
            props.push(Prop { id, value });
        }
        Ok(PropBundle { ranged, props })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(count_u8(self.props.len(), "property bundle")?)?;
        for prop in &self.props {
            writer.write_u8(prop.id)?;
        }
        for prop in &self.props {
            let expected = prop_value_size(prop.prop_id(), self.ranged);
            if prop.value.len() != expected {
                return Err(BnkError::OutOfRange(format!(
                    "property {:#04x} holds {} bytes, expected {}",
                    prop.id,
                    prop.value.len(),
                    expected
                )));
            }
            writer.write_all(&prop.value)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn get(&self, id: PropId) -> Option<&[u8]> {
        let raw = id.to_u8();
        self.props
            .iter()
            .find(|p| p.id == raw)
            .map(|p| p.value.as_slice())
    }

    /// First four bytes of the value as a float. Ranged values yield their minimum.
    pub fn get_f32(&self, id: PropId) -> Option<f32> {
        let value = self.get(id)?;
        let bytes: [u8; 4] = value.get(..4)?.try_into().ok()?;
        Some(f32::from_le_bytes(bytes))
    }

    pub fn get_u32(&self, id: PropId) -> Option<u32> {
        let value = self.get(id)?;
        let bytes: [u8; 4] = value.get(..4)?.try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Insert or overwrite a property. The value width must match the table.
    pub fn set(&mut self, id: PropId, value: Vec<u8>) -> Result<()> {
        let expected = prop_value_size(id, self.ranged);
        if value.len() != expected {
            return Err(BnkError::OutOfRange(format!(
                "property {:?} needs {} bytes, got {}",
                id,
                expected,
                value.len()
            )));
        }
        let raw = id.to_u8();
        match self.props.iter_mut().find(|p| p.id == raw) {
            Some(prop) => prop.value = value,
            None => self.props.push(Prop { id: raw, value }),
        }
        Ok(())
    }

    pub fn set_f32(&mut self, id: PropId, value: f32) -> Result<()> {
        self.set(id, value.to_le_bytes().to_vec())
    }

    pub fn set_u32(&mut self, id: PropId, value: u32) -> Result<()> {
        let mut buf = Vec::with_capacity(4);
        buf.write_u32::<LE>(value)?;
        self.set(id, buf)
    }

    pub fn remove(&mut self, id: PropId) -> Option<Prop> {
        let raw = id.to_u8();
        let index = self.props.iter().position(|p| p.id == raw)?;
        Some(self.props.remove(index))
    }
}
