use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use crate::codec::BinCodec;
use crate::error::Result;
use crate::props::PropBundle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    pub props: PropBundle,
}

impl BinCodec for StateValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(StateValues {
            props: PropBundle::read(reader, false)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.props.write(writer)
    }
}

pub type State = HircItem<StateValues>;

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
    fn ids_precede_values() {
        let mut bytes = vec![2, 0x00, 0x11];
        bytes.extend_from_slice(&(-6.0f32).to_le_bytes());
        bytes.push(50);
        let state: StateValues = decode_exact(&bytes);
        assert_eq!(state.props.get_f32(PropId::Volume), Some(-6.0));
        assert_eq!(state.props.get(PropId::Probability), Some(&[50u8][..]));
        assert!(!state.props.ranged);
    }
}
