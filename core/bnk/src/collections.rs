use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{BnkError, Result};
use crate::hirc::{
    Action, ActionValues, ActorMixer, ActorMixerValues, Bus, BusValues, DialogueEvent,
    DialogueEventValues, Event, EventValues, HircObject, MusicSegment, MusicSegmentValues,
    MusicSwitch, MusicSwitchValues, MusicTrack, MusicTrackValues, RanSeqValues,
    RandomSequenceContainer, Sound, SoundValues, SwitchContainer, SwitchContainerValues,
};

/// The mutable form yields `(id, values)` so the id stays in step with the map key.
macro_rules! typed_iter {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty, $values:ty) => {
        pub fn $name(&self) -> impl Iterator<Item = &$ty> {
            self.items.values().filter_map(|o| match o {
                HircObject::$variant(item) => Some(item),
                _ => None,
            })
        }

        pub fn $name_mut(&mut self) -> impl Iterator<Item = (u32, &mut $values)> {
            self.items.values_mut().filter_map(|o| match o {
                HircObject::$variant(item) => Some((item.id, &mut item.values)),
                _ => None,
            })
        }
    };
}

/// HIRC records keyed by id, in bank order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<HircObject>", try_from = "Vec<HircObject>")]
pub struct HircCollection {
    items: IndexMap<u32, HircObject>,
}

impl HircCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. A second record with the same id is rejected.
    pub fn insert(&mut self, object: HircObject) -> Result<()> {
        let id = object.id();
        if self.items.contains_key(&id) {
            return Err(BnkError::DuplicateId {
                kind: "HIRC record",
                id,
            });
        }
        self.items.insert(id, object);
        Ok(())
    }

    /// Replace the record with the same id in place, or append it.
    pub fn set(&mut self, object: HircObject) -> Option<HircObject> {
        self.items.insert(object.id(), object)
    }

    pub fn get(&self, id: u32) -> Option<&HircObject> {
        self.items.get(&id)
    }

    /// Edit one record in place. `None` when no record has `id`.
    ///
    /// Changing the record's id moves it to the new key; a new id that is already
    /// taken is undone and reported as a duplicate.
    pub fn update<T>(&mut self, id: u32, f: impl FnOnce(&mut HircObject) -> T) -> Result<Option<T>> {
        let Some(object) = self.items.get_mut(&id) else {
            return Ok(None);
        };
        let out = f(object);
        self.rekey()?;
        Ok(Some(out))
    }

    /// Edit every record in order, with the same id handling as [`HircCollection::update`].
    pub fn update_all(&mut self, mut f: impl FnMut(&mut HircObject)) -> Result<()> {
        for object in self.items.values_mut() {
            f(object);
        }
        self.rekey()
    }

    fn rekey(&mut self) -> Result<()> {
        if self.items.iter().all(|(key, object)| *key == object.id()) {
            return Ok(());
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        let clash = self.items.values().map(HircObject::id).find(|id| !seen.insert(*id));
        if let Some(id) = clash {
            for (key, object) in self.items.iter_mut() {
                if *key != object.id() {
                    object.set_id(*key);
                }
            }
            return Err(BnkError::DuplicateId {
                kind: "HIRC record",
                id,
            });
        }
        let items = std::mem::take(&mut self.items);
        self.items = items.into_values().map(|object| (object.id(), object)).collect();
        Ok(())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    /// Remove a record, keeping the order of the others.
    pub fn remove(&mut self, id: u32) -> Option<HircObject> {
        self.items.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HircObject> {
        self.items.values()
    }

    typed_iter!(sounds, sounds_mut, Sound, Sound, SoundValues);
    typed_iter!(events, events_mut, Event, Event, EventValues);
    typed_iter!(actions, actions_mut, Action, Action, ActionValues);
    typed_iter!(buses, buses_mut, Bus, Bus, BusValues);
    typed_iter!(actor_mixers, actor_mixers_mut, ActorMixer, ActorMixer, ActorMixerValues);
    typed_iter!(
        random_sequence_containers,
        random_sequence_containers_mut,
        RandomSequenceContainer,
        RandomSequenceContainer,
        RanSeqValues
    );
    typed_iter!(
        switch_containers,
        switch_containers_mut,
        SwitchContainer,
        SwitchContainer,
        SwitchContainerValues
    );
    typed_iter!(music_segments, music_segments_mut, MusicSegment, MusicSegment, MusicSegmentValues);
    typed_iter!(music_tracks, music_tracks_mut, MusicTrack, MusicTrack, MusicTrackValues);
    typed_iter!(music_switches, music_switches_mut, MusicSwitch, MusicSwitch, MusicSwitchValues);
    typed_iter!(
        dialogue_events,
        dialogue_events_mut,
        DialogueEvent,
        DialogueEvent,
        DialogueEventValues
    );

    /// Number of records per kind name, in first-seen order.
    pub fn kind_counts(&self) -> IndexMap<&'static str, usize> {
        let mut counts = IndexMap::new();
        for object in self.items.values() {
            *counts.entry(object.kind_name()).or_insert(0) += 1;
        }
        counts
    }
}

impl From<HircCollection> for Vec<HircObject> {
    fn from(collection: HircCollection) -> Self {
        collection.items.into_values().collect()
    }
}

impl TryFrom<Vec<HircObject>> for HircCollection {
    type Error = BnkError;

    fn try_from(objects: Vec<HircObject>) -> Result<Self> {
        let mut collection = HircCollection::new();
        for object in objects {
            collection.insert(object)?;
        }
        Ok(collection)
    }
}

/// Embedded media payloads keyed by source id. Order decides DATA layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaCollection {
    items: IndexMap<u32, Vec<u8>>,
}

impl MediaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, data: Vec<u8>) -> Result<()> {
        if self.items.contains_key(&id) {
            return Err(BnkError::DuplicateId { kind: "media", id });
        }
        self.items.insert(id, data);
        Ok(())
    }

    /// Replace the payload in place, or append a new entry. Returns the old payload.
    pub fn set(&mut self, id: u32, data: Vec<u8>) -> Option<Vec<u8>> {
        self.items.insert(id, data)
    }

    pub fn get(&self, id: u32) -> Option<&[u8]> {
        self.items.get(&id).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Vec<u8>> {
        self.items.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.items.contains_key(&id)
    }

    pub fn remove(&mut self, id: u32) -> Option<Vec<u8>> {
        self.items.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        self.items.iter().map(|(id, data)| (*id, data.as_slice()))
    }

    pub fn total_size(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hirc::{EventValues, HircItem, RawObject};

    fn event(id: u32, actions: Vec<u32>) -> HircObject {
        HircObject::Event(HircItem::new(id, EventValues { actions }))
    }

    #[test]
    fn insert_rejects_duplicates_set_replaces() {
        let mut hirc = HircCollection::new();
        hirc.insert(event(1, vec![])).unwrap();
        hirc.insert(event(2, vec![])).unwrap();
        let err = hirc.insert(event(1, vec![9])).unwrap_err();
        assert!(matches!(err, BnkError::DuplicateId { id: 1, .. }));

        let old = hirc.set(event(1, vec![9]));
        assert!(old.is_some());
        assert_eq!(hirc.len(), 2);
        assert_eq!(hirc.iter().next().map(HircObject::id), Some(1));
        assert_eq!(hirc.get(1).unwrap().children(), vec![9]);
    }

    #[test]
    fn remove_keeps_order() {
        let mut hirc = HircCollection::new();
        for id in [5, 3, 8] {
            hirc.insert(event(id, vec![])).unwrap();
        }
        hirc.remove(3);
        let ids: Vec<u32> = hirc.iter().map(HircObject::id).collect();
        assert_eq!(ids, vec![5, 8]);
    }

    #[test]
    fn typed_iterators_filter_by_kind() {
        let mut hirc = HircCollection::new();
        hirc.insert(event(1, vec![2])).unwrap();
        hirc.insert(HircObject::Raw(RawObject {
            type_code: 99,
            id: 2,
            data: vec![],
        }))
        .unwrap();
        assert_eq!(hirc.events().count(), 1);
        assert_eq!(hirc.sounds().count(), 0);
        for (id, values) in hirc.events_mut() {
            assert_eq!(id, 1);
            values.actions.push(3);
        }
        assert_eq!(hirc.events().next().unwrap().values.actions, vec![2, 3]);
        assert_eq!(hirc.kind_counts().get("Raw"), Some(&1));
    }

    #[test]
    fn changed_id_moves_the_record() {
        let mut hirc = HircCollection::new();
        for id in [1, 2, 3] {
            hirc.insert(event(id, vec![])).unwrap();
        }
        let found = hirc.update(2, |object| object.set_id(20)).unwrap();
        assert!(found.is_some());
        assert!(hirc.get(2).is_none());
        assert_eq!(hirc.get(20).map(HircObject::id), Some(20));
        let ids: Vec<u32> = hirc.iter().map(HircObject::id).collect();
        assert_eq!(ids, vec![1, 20, 3]);
        assert_eq!(hirc.update(99, |_| ()).unwrap(), None);
    }

    #[test]
    fn colliding_id_change_is_undone() {
        let mut hirc = HircCollection::new();
        for id in [1, 2] {
            hirc.insert(event(id, vec![])).unwrap();
        }
        let err = hirc.update(2, |object| object.set_id(1)).unwrap_err();
        assert!(matches!(err, BnkError::DuplicateId { id: 1, .. }));
        assert_eq!(hirc.get(2).map(HircObject::id), Some(2));
        assert_eq!(hirc.get(1).map(HircObject::id), Some(1));

        hirc.update_all(|object| object.set_id(object.id() + 10)).unwrap();
        let ids: Vec<u32> = hirc.iter().map(HircObject::id).collect();
        assert_eq!(ids, vec![11, 12]);
    }

    #[test]
    fn media_duplicates() {
        let mut media = MediaCollection::new();
        media.insert(10, vec![1, 2, 3]).unwrap();
        assert!(media.insert(10, vec![4]).is_err());
        assert_eq!(media.set(10, vec![4]), Some(vec![1, 2, 3]));
        assert_eq!(media.get(10), Some(&[4u8][..]));
        assert_eq!(media.total_size(), 1);
    }

    #[test]
    fn json_rejects_duplicate_ids() {
        let json = serde_json::to_string(&vec![event(1, vec![]), event(1, vec![])]).unwrap();
        assert!(serde_json::from_str::<HircCollection>(&json).is_err());
    }
}
