use std::collections::HashSet;

use crate::error::{BnkError, Result};
use crate::types::SoundBank;

impl SoundBank {
    /// Media source ids reachable from an event, following actions into
    /// containers and down to sounds and tracks. Ids are unique, in discovery order.
    /// References to records missing from this bank are skipped.
    pub fn resolve_event_media(&self, event_id: u32) -> Result<Vec<u32>> {
        let event = self
            .hirc
            .get(event_id)
            .filter(|o| matches!(o, crate::hirc::HircObject::Event(_)))
            .ok_or(BnkError::NotFound {
                kind: "event",
                id: event_id,
            })?;

        let mut visited = HashSet::new();
        let mut media = Vec::new();
        let mut stack: Vec<u32> = event.children().into_iter().rev().collect();
        visited.insert(event_id);

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(object) = self.hirc.get(id) else {
                continue;
            };
            for source in object.media_references() {
                if !media.contains(&source) {
                    media.push(source);
                }
            }
            stack.extend(object.children().into_iter().rev());
        }
        Ok(media)
    }

    /// Ids of every HIRC record that plays `source_id`.
    pub fn records_using_media(&self, source_id: u32) -> Vec<u32> {
        self.hirc
            .iter()
            .filter(|o| o.media_references().contains(&source_id))
            .map(|o| o.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hirc::{
        ActionValues, ActorMixerValues, BankSourceData, EventValues, HircItem, HircObject,
        SoundValues,
    };

    fn sound(id: u32, source: u32) -> HircObject {
        HircObject::Sound(HircItem::new(
            id,
            SoundValues {
                source: BankSourceData::embedded(0x0004_0001, source, 4),
                ..Default::default()
            },
        ))
    }

    #[test]
    fn follows_event_to_sounds() {
        let mut bank = SoundBank::new(1);
        let objects = vec![
            HircObject::Event(HircItem::new(10, EventValues { actions: vec![20] })),
            HircObject::Action(HircItem::new(20, ActionValues::play(30, 1))),
            HircObject::ActorMixer(HircItem::new(
                30,
                ActorMixerValues {
                    children: vec![40, 41, 30],
                    ..Default::default()
                },
            )),
            sound(40, 500),
            sound(41, 501),
        ];
        for object in objects {
            bank.hirc.insert(object).unwrap();
        }
        assert_eq!(bank.resolve_event_media(10).unwrap(), vec![500, 501]);
        assert_eq!(bank.records_using_media(501), vec![41]);
        assert!(matches!(
            bank.resolve_event_media(40),
            Err(BnkError::NotFound { .. })
        ));
    }
}
