use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use crate::codec::{BinCodec, count_u8, read_bool, read_vec, write_bool, write_slice};
use crate::error::{BnkError, Result};
use crate::props::PropBundle;

/// Which parameter block follows the shared action prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Play,
    /// Stop, pause, resume and break. The first three carry a specific flag byte.
    Active { specific: bool },
    /// Mute/unmute and the property setters. Setters carry a `PropActionSpecific` block.
    Value { specific: bool },
}

impl ActionCategory {
    /// Fixed table keyed by the high byte of the action type.
    pub fn of(action_type: u16) -> Option<Self> {
        match action_type >> 8 {
            0x04 => Some(ActionCategory::Play),
            0x01..=0x03 => Some(ActionCategory::Active { specific: true }),
            0x1C => Some(ActionCategory::Active { specific: false }),
            0x06 | 0x07 => Some(ActionCategory::Value { specific: false }),
            0x08..=0x0F | 0x20 | 0x30 => Some(ActionCategory::Value { specific: true }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionItem {
    pub id: u32,
    pub is_bus: bool,
}

impl BinCodec for ExceptionItem {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(ExceptionItem {
            id: reader.read_u32::<LE>()?,
            is_bus: read_bool(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        write_bool(writer, self.is_bus)
    }
}

fn read_exceptions<R: Read>(reader: &mut R) -> Result<Vec<ExceptionItem>> {
    let count = reader.read_u8()? as usize;
    read_vec(reader, count)
}

fn write_exceptions<W: Write>(writer: &mut W, items: &[ExceptionItem]) -> Result<()> {
    writer.write_u8(count_u8(items.len(), "action exceptions")?)?;
    write_slice(writer, items)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayActionParams {
    pub fade_curve: u8,
    pub bank_id: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveActionParams {
    pub fade_curve: u8,
    pub specific_flags: Option<u8>,
    pub exceptions: Vec<ExceptionItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropActionSpecific {
    pub value_meaning: u8,
    pub base: f32,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueActionParams {
    pub fade_curve: u8,
    pub specific: Option<PropActionSpecific>,
    pub exceptions: Vec<ExceptionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ActionParams {
    Play(PlayActionParams),
    Active(ActiveActionParams),
    Value(ValueActionParams),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub action_type: u16,
    pub ext_id: u32,
    pub ext_flags: u8,
    pub props: PropBundle,
    pub ranged_props: PropBundle,
    pub params: ActionParams,
}

impl ActionValues {
    /// A play action targeting `target_id`, loaded from `bank_id`.
    pub fn play(target_id: u32, bank_id: u32) -> Self {
        ActionValues {
            action_type: 0x0403,
            ext_id: target_id,
            ext_flags: 0,
            props: PropBundle::new(false),
            ranged_props: PropBundle::new(true),
            params: ActionParams::Play(PlayActionParams {
                fade_curve: 4,
                bank_id,
            }),
        }
    }

    pub fn category(&self) -> Option<ActionCategory> {
        ActionCategory::of(self.action_type)
    }

    pub fn is_play(&self) -> bool {
        matches!(self.params, ActionParams::Play(_))
    }

    fn read_params<R: Read>(reader: &mut R, action_type: u16) -> Result<ActionParams> {
        let category = ActionCategory::of(action_type).ok_or_else(|| {
            BnkError::unsupported("ActionItem", format!("action type {:#06x}", action_type))
        })?;
        let params = match category {
            ActionCategory::Play => ActionParams::Play(PlayActionParams {
                fade_curve: reader.read_u8()?,
                bank_id: reader.read_u32::<LE>()?,
            }),
            ActionCategory::Active { specific } => {
                let fade_curve = reader.read_u8()?;
                let specific_flags = if specific {
                    Some(reader.read_u8()?)
                } else {
                    None
                };
                ActionParams::Active(ActiveActionParams {
                    fade_curve,
                    specific_flags,
                    exceptions: read_exceptions(reader)?,
                })
            }
            ActionCategory::Value { specific } => {
                let fade_curve = reader.read_u8()?;
                let specific = if specific {
                    Some(PropActionSpecific {
                        value_meaning: reader.read_u8()?,
                        base: reader.read_f32::<LE>()?,
                        min: reader.read_f32::<LE>()?,
                        max: reader.read_f32::<LE>()?,
                    })
                } else {
                    None
                };
                ActionParams::Value(ValueActionParams {
                    fade_curve,
                    specific,
                    exceptions: read_exceptions(reader)?,
                })
            }
        };
        Ok(params)
    }

    fn write_params<W: Write>(&self, writer: &mut W) -> Result<()> {
        let category = self.category().ok_or_else(|| {
            BnkError::unsupported("ActionItem", format!("action type {:#06x}", self.action_type))
        })?;
        let mismatch = || {
            BnkError::unsupported(
                "ActionItem",
                format!(
                    "parameter block does not match action type {:#06x}",
                    self.action_type
                ),
            )
        };
        match (&self.params, category) {
            (ActionParams::Play(play), ActionCategory::Play) => {
                writer.write_u8(play.fade_curve)?;
                writer.write_u32::<LE>(play.bank_id)?;
            }
            (ActionParams::Active(active), ActionCategory::Active { specific }) => {
                if active.specific_flags.is_some() != specific {
                    return Err(mismatch());
                }
                writer.write_u8(active.fade_curve)?;
                if let Some(flags) = active.specific_flags {
                    writer.write_u8(flags)?;
                }
                write_exceptions(writer, &active.exceptions)?;
            }
            (ActionParams::Value(value), ActionCategory::Value { specific }) => {
                if value.specific.is_some() != specific {
                    return Err(mismatch());
                }
                writer.write_u8(value.fade_curve)?;
                if let Some(prop) = &value.specific {
                    writer.write_u8(prop.value_meaning)?;
                    writer.write_f32::<LE>(prop.base)?;
                    writer.write_f32::<LE>(prop.min)?;
                    writer.write_f32::<LE>(prop.max)?;
                }
                write_exceptions(writer, &value.exceptions)?;
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

impl BinCodec for ActionValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let action_type = reader.read_u16::<LE>()?;
        let ext_id = reader.read_u32::<LE>()?;
        let ext_flags = reader.read_u8()?;
        let props = PropBundle::read(reader, false)?;
        let ranged_props = PropBundle::read(reader, true)?;
        let params = Self::read_params(reader, action_type)?;
        Ok(ActionValues {
            action_type,
            ext_id,
            ext_flags,
            props,
            ranged_props,
            params,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u16::<LE>(self.action_type)?;
        writer.write_u32::<LE>(self.ext_id)?;
        writer.write_u8(self.ext_flags)?;
        self.props.write(writer)?;
        self.ranged_props.write(writer)?;
        self.write_params(writer)
    }
}

pub type Action = HircItem<ActionValues>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prefix(action_type: u16, ext_id: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&action_type.to_le_bytes());
        out.extend_from_slice(&ext_id.to_le_bytes());
        out.extend_from_slice(&[0, 0, 0]); // ext flags, empty props, empty ranged props
        out
    }

    fn roundtrip(bytes: &[u8]) -> ActionValues {
        let mut cursor = Cursor::new(bytes);
        let action = ActionValues::read(&mut cursor).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        let mut out = Vec::new();
        action.write(&mut out).unwrap();
        assert_eq!(out, bytes);
        action
    }

    #[test]
    fn category_table() {
        assert_eq!(ActionCategory::of(0x0403), Some(ActionCategory::Play));
        assert_eq!(
            ActionCategory::of(0x0102),
            Some(ActionCategory::Active { specific: true })
        );
        assert_eq!(
            ActionCategory::of(0x1C01),
            Some(ActionCategory::Active { specific: false })
        );
        assert_eq!(
            ActionCategory::of(0x0601),
            Some(ActionCategory::Value { specific: false })
        );
        assert_eq!(
            ActionCategory::of(0x0A03),
            Some(ActionCategory::Value { specific: true })
        );
        assert_eq!(
            ActionCategory::of(0x3002),
            Some(ActionCategory::Value { specific: true })
        );
        assert_eq!(ActionCategory::of(0x1203), None);
    }

    #[test]
    fn play_action() {
        let mut bytes = prefix(0x0403, 0x1111);
        bytes.push(4);
        bytes.extend_from_slice(&0xCAFEu32.to_le_bytes());
        let action = roundtrip(&bytes);
        assert!(action.is_play());
        assert_eq!(
            action.params,
            ActionParams::Play(PlayActionParams {
                fade_curve: 4,
                bank_id: 0xCAFE
            })
        );
    }

    #[test]
    fn stop_action_with_exceptions() {
        let mut bytes = prefix(0x0102, 0x2222);
        bytes.extend_from_slice(&[4, 0x06, 1]);
        bytes.extend_from_slice(&0x3333u32.to_le_bytes());
        bytes.push(1);
        let action = roundtrip(&bytes);
        match action.params {
            ActionParams::Active(active) => {
                assert_eq!(active.specific_flags, Some(0x06));
                assert_eq!(active.exceptions[0].id, 0x3333);
                assert!(active.exceptions[0].is_bus);
            }
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn set_volume_action() {
        let mut bytes = prefix(0x0A03, 0x4444);
        bytes.extend_from_slice(&[4, 1]);
        for v in [-6.0f32, 0.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes.push(0);
        let action = roundtrip(&bytes);
        match action.params {
            ActionParams::Value(value) => assert_eq!(value.specific.unwrap().base, -6.0),
            other => panic!("unexpected params {:?}", other),
        }
    }

    #[test]
    fn unknown_action_type_is_unsupported() {
        let bytes = prefix(0x1203, 0);
        let err = ActionValues::read(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, BnkError::Unsupported { .. }));
    }

    #[test]
    fn mismatched_params_fail_to_write() {
        let mut action = ActionValues::play(1, 2);
        action.action_type = 0x0102;
        assert!(action.write(&mut Vec::new()).is_err());
    }
}
