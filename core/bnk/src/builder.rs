//! Assemble a bank from scratch.

use crate::error::Result;
use crate::hirc::HircObject;
use crate::types::{DEFAULT_BANK_VERSION, SoundBank};

/// Builder for a `SoundBank`. Duplicate ids are reported by `build`.
pub struct BankBuilder {
    id: u32,
    version: u32,
    language_id: u32,
    project_id: u32,
    media: Vec<(u32, Vec<u8>)>,
    hirc: Vec<HircObject>,
}

impl Default for BankBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BankBuilder {
    pub fn new() -> Self {
        Self {
            id: 0,
            version: DEFAULT_BANK_VERSION,
            language_id: 0,
            project_id: 0,
            media: Vec::new(),
            hirc: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn with_language(mut self, language_id: u32) -> Self {
        self.language_id = language_id;
        self
    }

    pub fn with_project_id(mut self, project_id: u32) -> Self {
        self.project_id = project_id;
        self
    }

    /// Add an embedded media payload. DATA layout follows the order of these calls.
    pub fn add_media(mut self, id: u32, data: Vec<u8>) -> Self {
        self.media.push((id, data));
        self
    }

    pub fn add_hirc_item(mut self, object: HircObject) -> Self {
        self.hirc.push(object);
        self
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    pub fn build(self) -> Result<SoundBank> {
        let mut bank = SoundBank::new(self.id);
        bank.version = self.version;
        bank.language_id = self.language_id;
        bank.project_id = self.project_id;
        for (id, data) in self.media {
            bank.media.insert(id, data)?;
        }
        for object in self.hirc {
            bank.hirc.insert(object)?;
        }
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BnkError;
    use crate::hirc::{EventValues, HircItem};

    #[test]
    fn builds_with_fields() {
        let bank = BankBuilder::new()
            .with_id(0xABCD)
            .with_version(0x71)
            .with_language(3)
            .with_project_id(9)
            .add_media(1, vec![0; 4])
            .add_hirc_item(HircObject::Event(HircItem::new(2, EventValues::default())))
            .build()
            .unwrap();
        assert_eq!(bank.id, 0xABCD);
        assert_eq!(bank.version, 0x71);
        assert_eq!(bank.language_id, 3);
        assert_eq!(bank.project_id, 9);
        assert_eq!(bank.media.len(), 1);
        assert_eq!(bank.hirc.len(), 1);
    }

    #[test]
    fn duplicate_media_fails_at_build() {
        let builder = BankBuilder::new().add_media(1, vec![1]).add_media(1, vec![2]);
        assert_eq!(builder.media_count(), 2);
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BnkError::DuplicateId { kind: "media", id: 1 }));
    }
}
