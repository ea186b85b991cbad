//! Structural checks for chunks that are kept as raw bytes.
//!
//! STMG, ENVS and PLAT are walked field by field to confirm the payload has the
//! expected shape; nothing parsed here is stored on the bank.

use byteorder::{LE, ReadBytesExt};
use std::io::Cursor;
use utils::BinReadExt;

use crate::error::{BnkError, Result};

const GRAPH_POINT_SIZE: u64 = 12;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateManagerSummary {
    pub state_groups: u32,
    pub switch_groups: u32,
    pub game_parameters: u32,
}

fn ensure_consumed(cursor: &Cursor<&[u8]>, context: &str) -> Result<()> {
    let declared = cursor.get_ref().len() as u64;
    let consumed = cursor.position();
    if consumed != declared {
        return Err(BnkError::SizeMismatch {
            context: context.to_string(),
            id: None,
            declared,
            consumed,
        });
    }
    Ok(())
}

pub fn validate_stmg(payload: &[u8], version: u32) -> Result<StateManagerSummary> {
    let mut reader = Cursor::new(payload);
    reader.skip_bytes(4)?; // volume threshold
    reader.skip_bytes(2)?; // max voice instances
    if version >= 140 {
        reader.skip_bytes(2)?;
    }

    let state_groups = reader.read_u32::<LE>()?;
    for _ in 0..state_groups {
        reader.skip_bytes(4 + 4)?; // id, default transition time
        let custom = reader.read_u32::<LE>()? as u64;
        reader.skip_bytes(custom * 12)?;
    }

    let switch_groups = reader.read_u32::<LE>()?;
    for _ in 0..switch_groups {
        reader.skip_bytes(4 + 4)?; // id, game parameter
        if version >= 112 {
            reader.skip_bytes(1)?;
        }
        let points = reader.read_u32::<LE>()? as u64;
        reader.skip_bytes(points * GRAPH_POINT_SIZE)?;
    }

    let game_parameters = reader.read_u32::<LE>()?;
    let param_size = if version >= 112 { 4 + 17 } else { 4 + 4 };
    reader.skip_bytes(game_parameters as u64 * param_size)?;

    if version >= 140 {
        reader.skip_bytes(4)?;
    }

    ensure_consumed(&reader, "STMG")?;
    Ok(StateManagerSummary {
        state_groups,
        switch_groups,
        game_parameters,
    })
}

fn skip_env_curve(reader: &mut Cursor<&[u8]>) -> Result<()> {
    reader.skip_bytes(2)?; // curve enabled + scaling
    let points = reader.read_u16::<LE>()? as u64;
    reader.skip_bytes(points * GRAPH_POINT_SIZE)?;
    Ok(())
}

/// Obstruction then occlusion, each with volume, LPF and (112+) HPF curves.
pub fn validate_envs(payload: &[u8], version: u32) -> Result<()> {
    let mut reader = Cursor::new(payload);
    for _ in 0..2 {
        skip_env_curve(&mut reader)?;
        skip_env_curve(&mut reader)?;
        if version >= 112 {
            skip_env_curve(&mut reader)?;
        }
    }
    ensure_consumed(&reader, "ENVS")
}

/// Returns the platform name. Trailing padding after the terminator is allowed.
pub fn validate_plat(payload: &[u8]) -> Result<String> {
    let mut reader = Cursor::new(payload);
    let platform = reader.read_null_term_string()?;
    let rest = &payload[reader.position() as usize..];
    if rest.iter().any(|b| *b != 0) {
        return Err(BnkError::SizeMismatch {
            context: "PLAT".to_string(),
            id: None,
            declared: payload.len() as u64,
            consumed: reader.position(),
        });
    }
    Ok(platform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stmg_counts() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0; 6]);
        payload.extend_from_slice(&1u32.to_le_bytes()); // one state group
        payload.extend_from_slice(&[0; 8]);
        payload.extend_from_slice(&1u32.to_le_bytes());
        payload.extend_from_slice(&[0; 12]);
        payload.extend_from_slice(&0u32.to_le_bytes()); // no switch groups
        payload.extend_from_slice(&2u32.to_le_bytes()); // two game parameters
        payload.extend_from_slice(&[0; 2 * 21]);
        let summary = validate_stmg(&payload, 120).unwrap();
        assert_eq!(summary.state_groups, 1);
        assert_eq!(summary.game_parameters, 2);

        payload.push(0);
        assert!(validate_stmg(&payload, 120).is_err());
    }

    #[test]
    fn envs_curves() {
        let mut payload = Vec::new();
        for _ in 0..6 {
            payload.extend_from_slice(&[1, 0]);
            payload.extend_from_slice(&1u16.to_le_bytes());
            payload.extend_from_slice(&[0; 12]);
        }
        assert!(validate_envs(&payload, 120).is_ok());
        assert!(validate_envs(&payload, 100).is_err());
    }

    #[test]
    fn plat_name() {
        assert_eq!(validate_plat(b"Windows\0\0\0").unwrap(), "Windows");
        assert!(validate_plat(b"Windows\0x").is_err());
    }
}
