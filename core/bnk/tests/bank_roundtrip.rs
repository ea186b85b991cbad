use bnk::hirc::{BankSourceData, EventValues, SoundValues};
use bnk::{BankBuilder, BnkError, ChunkTag, HircItem, HircObject, SoundBank};
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

fn bkhd(version: u32, id: u32) -> Vec<u8> {
    let mut payload = Vec::new();
    for value in [version, id, 0, 0, 0] {
        payload.extend_from_slice(&value.to_le_bytes());
    }
    chunk(b"BKHD", &payload)
}

fn record(type_code: u8, id: u32, body: &[u8]) -> Vec<u8> {
    let mut out = vec![type_code];
    out.extend_from_slice(&(body.len() as u32 + 4).to_le_bytes());
    out.extend_from_slice(&id.to_le_bytes());
    out.extend_from_slice(body);
    out
}

fn hirc(records: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = (records.len() as u32).to_le_bytes().to_vec();
    for r in records {
        payload.extend_from_slice(r);
    }
    chunk(b"HIRC", &payload)
}

fn event_body(actions: &[u32]) -> Vec<u8> {
    let mut body = vec![actions.len() as u8];
    for id in actions {
        body.extend_from_slice(&id.to_le_bytes());
    }
    body
}

fn sound_body(source_id: u32, size: u32) -> Vec<u8> {
    let values = SoundValues {
        source: BankSourceData::embedded(0x0004_0001, source_id, size),
        ..Default::default()
    };
    let mut cursor = Cursor::new(Vec::new());
    HircObject::Sound(HircItem::new(1, values)).write(&mut cursor).unwrap();
    cursor.into_inner()[9..].to_vec()
}

#[test]
fn single_event_bank_is_byte_exact() {
    let action_id = 0x0BAD_F00D;
    let mut bytes = bkhd(0x71, 0x1234_5678);
    bytes.extend(hirc(&[record(4, 0x100, &event_body(&[action_id]))]));

    let bank = SoundBank::from_bytes(&bytes).unwrap();
    assert_eq!(bank.version, 0x71);
    assert_eq!(bank.id, 0x1234_5678);
    let events: Vec<_> = bank.hirc.events().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].values.actions, vec![action_id]);
    assert!(bank.is_clean());

    assert_eq!(bank.to_bytes().unwrap(), bytes);
}

#[test]
fn first_chunk_must_be_header() {
    let bytes = hirc(&[]);
    assert!(matches!(
        SoundBank::from_bytes(&bytes),
        Err(BnkError::InvalidMagic { .. })
    ));
    assert!(matches!(
        SoundBank::from_bytes(&[]),
        Err(BnkError::InvalidMagic { .. })
    ));
}

#[test]
fn truncated_chunk_is_fatal() {
    let mut bytes = bkhd(0x71, 1);
    bytes.extend_from_slice(b"HIRC");
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&[0; 10]);
    assert!(matches!(SoundBank::from_bytes(&bytes), Err(BnkError::Io(_))));
}

#[test]
fn unknown_chunks_and_records_pass_through() {
    let mut bytes = bkhd(0x71, 1);
    bytes.extend(chunk(b"ZZZZ", &[1, 2, 3]));
    bytes.extend(hirc(&[
        record(99, 0x200, &[0xAA, 0xBB]),
        record(4, 0x201, &event_body(&[0x200])),
    ]));
    bytes.extend(chunk(b"PLAT", b"Windows\0"));

    let bank = SoundBank::from_bytes(&bytes).unwrap();
    assert!(bank.is_clean());
    assert!(bank.hirc.get(0x200).unwrap().is_raw());
    assert_eq!(bank.extra_chunk(ChunkTag(*b"ZZZZ")).unwrap().data, vec![1, 2, 3]);
    assert_eq!(
        bank.chunk_order,
        vec![ChunkTag::BKHD, ChunkTag(*b"ZZZZ"), ChunkTag::HIRC, ChunkTag::PLAT]
    );
    assert_eq!(bank.to_bytes().unwrap(), bytes);
}

#[test]
fn record_with_wrong_size_is_kept_raw() {
    let mut body = sound_body(500, 4);
    body.push(0xFF);
    let mut bytes = bkhd(0x71, 1);
    bytes.extend(hirc(&[
        record(2, 0x300, &body),
        record(4, 0x301, &event_body(&[])),
    ]));

    let bank = SoundBank::from_bytes(&bytes).unwrap();
    assert!(!bank.is_clean());
    assert_eq!(bank.diagnostics.len(), 1);
    assert!(bank.diagnostics[0].message.contains("declared"));
    assert!(bank.hirc.get(0x300).unwrap().is_raw());
    assert_eq!(bank.hirc.events().count(), 1);
    assert_eq!(bank.to_bytes().unwrap(), bytes);
}

#[test]
fn duplicate_record_ids_keep_the_first() {
    let mut bytes = bkhd(0x71, 1);
    bytes.extend(hirc(&[
        record(4, 7, &event_body(&[1])),
        record(4, 7, &event_body(&[2])),
    ]));
    let bank = SoundBank::from_bytes(&bytes).unwrap();
    assert_eq!(bank.hirc.len(), 1);
    assert_eq!(bank.hirc.get(7).unwrap().children(), vec![1]);
    assert_eq!(bank.diagnostics.len(), 1);
}

#[test]
fn embedded_media_round_trip() {
    let mut didx = Vec::new();
    for (id, offset, size) in [(10u32, 0u32, 5u32), (11, 16, 3)] {
        didx.extend_from_slice(&id.to_le_bytes());
        didx.extend_from_slice(&offset.to_le_bytes());
        didx.extend_from_slice(&size.to_le_bytes());
    }
    let mut data = vec![1u8; 5];
    data.extend_from_slice(&[0; 11]);
    data.extend_from_slice(&[2; 3]);

    let mut bytes = bkhd(0x71, 1);
    bytes.extend(chunk(b"DIDX", &didx));
    bytes.extend(chunk(b"DATA", &data));
    bytes.extend(hirc(&[record(2, 0x40, &sound_body(10, 5))]));

    let bank = SoundBank::from_bytes(&bytes).unwrap();
    assert_eq!(bank.media.get(10), Some(&[1u8; 5][..]));
    assert_eq!(bank.media.get(11), Some(&[2u8; 3][..]));
    assert_eq!(bank.to_bytes().unwrap(), bytes);
}

#[test]
fn stid_names_round_trip() {
    let mut stid = Vec::new();
    stid.extend_from_slice(&1u32.to_le_bytes());
    stid.extend_from_slice(&1u32.to_le_bytes());
    stid.extend_from_slice(&0x55u32.to_le_bytes());
    stid.push(4);
    stid.extend_from_slice(b"Init");

    let mut bytes = bkhd(0x71, 1);
    bytes.extend(chunk(b"STID", &stid));
    let bank = SoundBank::from_bytes(&bytes).unwrap();
    let names = bank.bank_names.as_ref().unwrap();
    assert_eq!(names.get(&0x55).map(String::as_str), Some("Init"));
    assert_eq!(bank.to_bytes().unwrap(), bytes);
}

#[test]
fn built_bank_reloads() {
    let bank = BankBuilder::new()
        .with_id(42)
        .with_language(1)
        .add_media(900, vec![7; 33])
        .add_media(901, vec![8; 2])
        .add_hirc_item(HircObject::Event(HircItem::new(
            1,
            EventValues { actions: vec![2] },
        )))
        .build()
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("built.bnk");
    bank.save(&path).unwrap();
    let reloaded = SoundBank::open(&path).unwrap();

    assert_eq!(reloaded.id, 42);
    assert_eq!(reloaded.language_id, 1);
    assert_eq!(reloaded.media.get(901), Some(&[8u8; 2][..]));
    assert_eq!(reloaded.hirc, bank.hirc);
    assert_eq!(
        reloaded.chunk_order,
        vec![ChunkTag::BKHD, ChunkTag::DIDX, ChunkTag::DATA, ChunkTag::HIRC]
    );
}

#[test]
fn json_keeps_hierarchy() {
    let mut bytes = bkhd(0x71, 1);
    bytes.extend(hirc(&[
        record(2, 0x40, &sound_body(10, 5)),
        record(4, 0x41, &event_body(&[0x42])),
        record(99, 0x42, &[1, 2, 3]),
    ]));
    let bank = SoundBank::from_bytes(&bytes).unwrap();
    let json = serde_json::to_string_pretty(&bank).unwrap();
    let restored: SoundBank = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.hirc, bank.hirc);
    assert_eq!(restored.to_bytes().unwrap(), bytes);
}
