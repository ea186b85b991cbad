//! Serde adapter that stores opaque byte blobs as space-separated upper-case hex,
//! the same text form the bank JSON has always used.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&bytes_to_hex_space(bytes))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let text = String::deserialize(deserializer)?;
    hex_space_to_bytes(&text).map_err(D::Error::custom)
}

pub fn bytes_to_hex_space(bytes: &[u8]) -> String {
    let hex_string = hex::encode_upper(bytes);
    let mut result = String::with_capacity(hex_string.len() + hex_string.len() / 2);
    for (i, c) in hex_string.char_indices() {
        if i > 0 && i % 2 == 0 {
            result.push(' ');
        }
        result.push(c);
    }
    result
}

pub fn hex_space_to_bytes(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_space_format() {
        assert_eq!(bytes_to_hex_space(&[0x0A, 0xFF, 0x10]), "0A FF 10");
        assert_eq!(bytes_to_hex_space(&[]), "");
        assert_eq!(hex_space_to_bytes("0a ff 10").unwrap(), vec![0x0A, 0xFF, 0x10]);
        assert!(hex_space_to_bytes("0G").is_err());
    }
}
