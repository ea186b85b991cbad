use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::HircItem;
use super::common::{BankSourceData, NodeBaseParams};
use crate::codec::BinCodec;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundValues {
    pub source: BankSourceData,
    pub node_base: NodeBaseParams,
}

impl BinCodec for SoundValues {
    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(SoundValues {
            source: BankSourceData::read(reader)?,
            node_base: NodeBaseParams::read(reader)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.source.write(writer)?;
        self.node_base.write(writer)
    }
}

pub type Sound = HircItem<SoundValues>;

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

    fn node_base_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        NodeBaseParams::default().write(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn embedded_source_layout() {
        let mut bytes = 0x0004_0001u32.to_le_bytes().to_vec();
        bytes.push(0);
        bytes.extend_from_slice(&0x5000u32.to_le_bytes());
        bytes.extend_from_slice(&2048u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&node_base_bytes());

        let sound: SoundValues = decode_exact(&bytes);
        let info = &sound.source.media_information;
        assert_eq!((info.source_id, info.in_memory_media_size), (0x5000, 2048));
        assert!(sound.source.plugin_params.is_empty());
    }

    #[test]
    fn source_plugin_carries_params() {
        let mut bytes = 0x0065_0002u32.to_le_bytes().to_vec();
        bytes.push(2);
        bytes.extend_from_slice(&0x6000u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[7, 8, 9]);
        bytes.extend_from_slice(&node_base_bytes());

        let sound: SoundValues = decode_exact(&bytes);
        assert!(sound.source.is_source_plugin());
        assert_eq!(sound.source.plugin_params, vec![7, 8, 9]);
        assert_eq!(sound.source.stream_type, 2);
        assert_eq!(sound.node_base, NodeBaseParams::default());
    }
}
