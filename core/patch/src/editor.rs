use bnk::SoundBank;
use indexmap::{IndexMap, IndexSet};
use pck::PckPackage;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use crate::engine::{ReplaceSummary, replace_wem};
use crate::error::{PatchError, Result};

type BankKey = (u32, u32);

/// Edits a package through its parsed sound banks.
///
/// Banks are parsed the first time a replacement needs them and written back into
/// their package entries by `commit`, which `save` calls.
pub struct PackageEditor {
    package: PckPackage,
    banks: IndexMap<BankKey, SoundBank>,
    unreadable: HashSet<BankKey>,
    dirty: IndexSet<BankKey>,
}

impl PackageEditor {
    pub fn new(package: PckPackage) -> Self {
        PackageEditor {
            package,
            banks: IndexMap::new(),
            unreadable: HashSet::new(),
            dirty: IndexSet::new(),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(PckPackage::open(path)?))
    }

    pub fn package(&self) -> &PckPackage {
        &self.package
    }

    pub fn is_modified(&self) -> bool {
        !self.dirty.is_empty() || self.package.is_modified()
    }

    fn materialize(&mut self, key: BankKey) -> Result<bool> {
        if self.banks.contains_key(&key) {
            return Ok(true);
        }
        if self.unreadable.contains(&key) {
            return Ok(false);
        }
        let Some(entry) = self.package.sound_banks.get_mut(key.0, key.1) else {
            return Ok(false);
        };
        let parsed = SoundBank::from_bytes(entry.data()?);
        match parsed {
            Ok(bank) => {
                if !bank.is_clean() {
                    warn!(
                        "Sound bank {} ({} language) loaded with {} diagnostics",
                        key.0,
                        key.1,
                        bank.diagnostics.len()
                    );
                }
                self.banks.insert(key, bank);
                Ok(true)
            }
            Err(e) => {
                warn!("Sound bank {} could not be parsed, skipped: {}", key.0, e);
                self.unreadable.insert(key);
                Ok(false)
            }
        }
    }

    /// Whether a bank embeds `source_id`, read from its DIDX chunk alone when the bank
    /// is not parsed yet. A bank whose chunks cannot be walked answers true so that
    /// parsing it reports the problem.
    fn embeds(&mut self, key: BankKey, source_id: u32) -> Result<bool> {
        if let Some(bank) = self.banks.get(&key) {
            return Ok(bank.media.contains(source_id));
        }
        if self.unreadable.contains(&key) {
            return Ok(false);
        }
        let Some(entry) = self.package.sound_banks.get_mut(key.0, key.1) else {
            return Ok(false);
        };
        Ok(match SoundBank::scan_media_ids(entry.data()?) {
            Ok(ids) => ids.contains(&source_id),
            Err(_) => true,
        })
    }

    /// Parsed sound bank for an entry.
    pub fn bank(&mut self, id: u32, language_id: u32) -> Result<&SoundBank> {
        let key = (id, language_id);
        if !self.materialize(key)? {
            return Err(PatchError::TargetNotFound { kind: "sound bank", id });
        }
        self.banks
            .get(&key)
            .ok_or(PatchError::TargetNotFound { kind: "sound bank", id })
    }

    /// Mutable access marks the bank for re-serialization.
    pub fn bank_mut(&mut self, id: u32, language_id: u32) -> Result<&mut SoundBank> {
        let key = (id, language_id);
        if !self.materialize(key)? {
            return Err(PatchError::TargetNotFound { kind: "sound bank", id });
        }
        self.dirty.insert(key);
        self.banks
            .get_mut(&key)
            .ok_or(PatchError::TargetNotFound { kind: "sound bank", id })
    }

    /// Replace a WEM wherever it lives: streaming entries directly, embedded copies
    /// inside every bank along with the size fields that mirror them.
    pub fn replace_wem(&mut self, source_id: u32, data: &[u8]) -> Result<ReplaceSummary> {
        let mut summary = ReplaceSummary::default();

        for entry in self.package.streaming_files.find_mut(source_id) {
            entry.replace_with(data.to_vec());
            summary.streaming_replaced = true;
        }

        let keys: Vec<BankKey> = self.package.sound_banks.iter().map(|e| e.key()).collect();
        for key in keys {
            if !self.embeds(key, source_id)? || !self.materialize(key)? {
                continue;
            }
            let Some(bank) = self.banks.get_mut(&key) else {
                continue;
            };
            let replaced = replace_wem(bank, source_id, data)?;
            if replaced.banks_modified > 0 {
                self.dirty.insert(key);
            }
            summary.merge(replaced);
        }

        info!(
            "WEM {}: streaming {}, {} banks, {} references",
            source_id,
            if summary.streaming_replaced { "replaced" } else { "untouched" },
            summary.banks_modified,
            summary.references_patched
        );
        if summary.references_unchecked > 0 {
            warn!(
                "WEM {}: {} raw records could not be checked for its size",
                source_id, summary.references_unchecked
            );
        }
        Ok(summary)
    }

    /// Replace every language variant of a sound bank. Returns how many entries changed.
    pub fn replace_bnk(&mut self, bank_id: u32, data: &[u8]) -> usize {
        let mut replaced = Vec::new();
        for entry in self.package.sound_banks.find_mut(bank_id) {
            entry.replace_with(data.to_vec());
            replaced.push(entry.key());
        }
        for key in &replaced {
            self.banks.shift_remove(key);
            self.unreadable.remove(key);
            self.dirty.shift_remove(key);
        }
        info!("Sound bank {}: {} entries replaced", bank_id, replaced.len());
        replaced.len()
    }

    /// Serialize every modified bank back into its package entry.
    pub fn commit(&mut self) -> Result<()> {
        for key in self.dirty.drain(..) {
            let Some(bank) = self.banks.get(&key) else {
                continue;
            };
            let bytes = bank.to_bytes()?;
            if let Some(entry) = self.package.sound_banks.get_mut(key.0, key.1) {
                entry.replace_with(bytes);
            }
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.commit()?;
        self.package.save(path)?;
        Ok(())
    }

    pub fn into_package(mut self) -> Result<PckPackage> {
        self.commit()?;
        Ok(self.package)
    }
}
