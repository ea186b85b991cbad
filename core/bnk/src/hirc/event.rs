use byteorder::{ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use crate::codec::{BinCodec, count_u8, read_ids, write_ids};
use crate::error::Result;

/// Ordered list of the actions an event fires. The count is a single byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventValues {
    pub actions: Vec<u32>,
}

impl BinCodec for EventValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        Ok(EventValues {
            actions: read_ids(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(count_u8(self.actions.len(), "event actions")?)?;
        write_ids(writer, &self.actions)
    }
}

pub type Event = HircItem<EventValues>;

#[cfg(test)]
mod tests {
    use super::*;
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
    fn actions_keep_their_order() {
        let mut bytes = vec![2];
        bytes.extend_from_slice(&0x2000u32.to_le_bytes());
        bytes.extend_from_slice(&0x1000u32.to_le_bytes());
        let event: EventValues = decode_exact(&bytes);
        assert_eq!(event.actions, vec![0x2000, 0x1000]);
    }

    #[test]
    fn empty_event_is_one_byte() {
        let event: EventValues = decode_exact(&[0]);
        assert!(event.actions.is_empty());
    }

    #[test]
    fn too_many_actions_do_not_fit() {
        let event = EventValues {
            actions: vec![1; 256],
        };
        assert!(event.write(&mut Vec::<u8>::new()).is_err());
    }
}
