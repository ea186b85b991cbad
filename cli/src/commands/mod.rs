pub mod bnk;
pub mod pck;
pub mod project;

use anyhow::{Context, Result};

/// Accepts decimal or `0x`-prefixed hex ids.
pub fn parse_id(text: &str) -> Result<u32> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("{:?} is not a valid id", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_in_both_bases() {
        assert_eq!(parse_id("1234").unwrap(), 1234);
        assert_eq!(parse_id("0x1F").unwrap(), 31);
        assert!(parse_id("zz").is_err());
    }
}
