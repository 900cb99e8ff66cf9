mod common;

use std::io::{Cursor, Seek, SeekFrom, Write};

use chrono::{TimeZone, Utc};
use common::{HeaderSpec, RecordDb, raw_record_db, resource_entry, standard_appinfo};
use pdb_container::{
    AppInfo, AppInfoLayout, Category, CategoryTable, Database, EntryId, FourCC, Header, IndexEntry,
    LoadOptions, Payload, PdbError, RecordAttributes, timestamp,
};

fn sample_db() -> RecordDb {
    let mut db = RecordDb::new(vec![
        (0x000101, 0x00, b"first record".to_vec()),
        (0x000102, 0x41, b"second".to_vec()),
        (0x000103, 0x02, b"third and last record".to_vec()),
    ]);
    db.appinfo = Some(b"opaque app info".to_vec());
    db.sortinfo = Some(vec![2, 0, 1]);
    db.header.ctime = 3_600_000_000;
    db.header.mtime = 3_600_000_100;
    db
}

fn standard_options() -> LoadOptions {
    LoadOptions::default().with_appinfo_layout(AppInfoLayout::Standard)
}

#[test]
fn loads_header_blocks_and_records() {
    let bytes = sample_db().build();
    let db = Database::from_bytes(&bytes).unwrap();

    let header = db.header();
    assert_eq!(header.name, "TestDB");
    assert_eq!(header.db_type, FourCC::new(b"DATA"));
    assert_eq!(header.creator, FourCC::new(b"test"));
    assert_eq!(header.num_records, 3);
    assert!(!header.is_resource_db());

    assert_eq!(db.len(), 3);
    match db.appinfo() {
        Some(AppInfo::Opaque(bytes)) => assert_eq!(bytes, b"opaque app info"),
        other => panic!("unexpected app-info: {:?}", other),
    }
    assert_eq!(db.sortinfo(), Some(&[2u8, 0, 1][..]));

    let second = db.blob(EntryId::Record(0x000102)).unwrap();
    assert_eq!(second.payload.raw(), Some(&b"second"[..]));
    assert_eq!(db.index()[1].attributes(), Some(RecordAttributes(0x41)));
}

#[test]
fn canonical_file_round_trips_byte_for_byte() {
    let bytes = sample_db().build();
    let mut db = Database::from_bytes(&bytes).unwrap();
    assert_eq!(db.to_bytes().unwrap(), bytes);
}

#[test]
fn reloaded_dump_matches_original() {
    let bytes = sample_db().build();
    let mut original = Database::from_bytes(&bytes).unwrap();
    let dumped = original.to_bytes().unwrap();
    let reloaded = Database::from_bytes(&dumped).unwrap();

    assert_eq!(reloaded.header(), original.header());
    assert_eq!(reloaded.index(), original.index());
    for blob in original.blobs() {
        assert_eq!(reloaded.blob(blob.id()).unwrap().dump(), blob.dump());
    }
    assert_eq!(reloaded.sortinfo(), original.sortinfo());
}

#[test]
fn raw_blob_dump_is_identical_to_input() {
    let payload: Vec<u8> = (0..=255u8).collect();
    let bytes = RecordDb::new(vec![(1, 0, payload.clone())]).build();
    let db = Database::from_bytes(&bytes).unwrap();

    let blob = db.blob(EntryId::Record(1)).unwrap();
    assert!(!blob.payload.is_decoded());
    assert_eq!(blob.dump(), payload);
}

#[test]
fn short_header_is_truncated() {
    let bytes = sample_db().build();
    let err = Database::from_bytes(&bytes[..50]).unwrap_err();
    match err {
        PdbError::Truncated { context, offset, expected, found } => {
            assert_eq!(context, "header");
            assert_eq!(offset, 0);
            assert_eq!(expected, 78);
            assert_eq!(found, 50);
        }
        other => panic!("expected truncation, got {other}"),
    }
}

#[test]
fn short_index_is_truncated() {
    let header = HeaderSpec { num_records: 3, ..HeaderSpec::default() };
    let mut bytes = common::header_bytes(&header);
    bytes.extend(common::record_entry(86, 0, 1));

    let err = Database::from_bytes(&bytes).unwrap_err();
    assert!(
        matches!(err, PdbError::Truncated { context: "index", expected: 24, found: 8, .. }),
        "{err}"
    );
}

#[test]
fn unsorted_index_is_loaded_in_offset_order() {
    // Body starts at 78 + 3 * 8 = 102.
    let entries = [(110, 0, 3), (102, 0, 1), (105, 0, 2)];
    let bytes = raw_record_db(HeaderSpec::default(), &entries, b"aaabbbbbccc");
    let db = Database::from_bytes(&bytes).unwrap();

    let ids: Vec<EntryId> = db.index().iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![EntryId::Record(1), EntryId::Record(2), EntryId::Record(3)]);
    assert_eq!(db.blob(EntryId::Record(1)).unwrap().dump(), b"aaa");
    assert_eq!(db.blob(EntryId::Record(2)).unwrap().dump(), b"bbbbb");
    assert_eq!(db.blob(EntryId::Record(3)).unwrap().dump(), b"ccc");
}

#[test]
fn duplicate_offsets_load_and_keep_relative_order() {
    // Records 5 and 3 share offset 110; record 9 sorts before both.
    let entries = [(110, 0, 5), (110, 0, 3), (102, 0, 9)];
    let bytes = raw_record_db(HeaderSpec::default(), &entries, b"xxxxxxxxshared");
    let db = Database::from_bytes(&bytes).unwrap();

    let ids: Vec<EntryId> = db.index().iter().map(|e| e.id()).collect();
    assert_eq!(ids, vec![EntryId::Record(9), EntryId::Record(5), EntryId::Record(3)]);
    assert_eq!(db.blob(EntryId::Record(9)).unwrap().dump(), b"xxxxxxxx");
    assert!(db.blob(EntryId::Record(5)).unwrap().is_empty());
    assert_eq!(db.blob(EntryId::Record(3)).unwrap().dump(), b"shared");
}

#[test]
fn duplicate_offsets_are_separated_on_write() {
    // Body starts at 78 + 2 * 8 = 94.
    let entries = [(94, 0, 1), (94, 0, 2)];
    let bytes = raw_record_db(HeaderSpec::default(), &entries, b"data");
    let mut db = Database::from_bytes(&bytes).unwrap();
    db.replace_payload(EntryId::Record(1), b"one".to_vec()).unwrap();
    db.recompute_offsets().unwrap();

    assert_eq!(db.index()[0].offset(), 94);
    assert_eq!(db.index()[1].offset(), 97);
}

#[test]
fn duplicate_unique_ids_are_rejected() {
    let entries = [(94, 0, 7), (96, 0, 7)];
    let bytes = raw_record_db(HeaderSpec::default(), &entries, b"aabb");
    let err = Database::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, PdbError::DuplicateEntryId(_)), "{err}");
}

#[test]
fn appinfo_overlapping_records_is_invalid() {
    let header = HeaderSpec { appinfo_offset: 100, ..HeaderSpec::default() };
    let bytes = raw_record_db(header, &[(90, 0, 1)], b"0123456789abcdef");
    let err = Database::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, PdbError::InvalidLayout(_)), "{err}");
}

#[test]
fn record_offset_past_end_of_file_is_invalid() {
    let bytes = raw_record_db(HeaderSpec::default(), &[(4096, 0, 1)], b"tiny");
    let err = Database::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, PdbError::InvalidLayout(_)), "{err}");
}

#[test]
fn empty_index_blocks_run_to_end_of_file() {
    let mut source = RecordDb::new(Vec::new());
    source.appinfo = Some(b"app".to_vec());
    source.sortinfo = Some(b"sort".to_vec());
    let bytes = source.build();

    let mut db = Database::from_bytes(&bytes).unwrap();
    assert!(db.is_empty());
    assert!(matches!(db.appinfo(), Some(AppInfo::Opaque(b)) if b == b"app"));
    assert_eq!(db.sortinfo(), Some(&b"sort"[..]));
    assert_eq!(db.to_bytes().unwrap(), bytes);
}

#[test]
fn resource_database_round_trips() {
    let header = HeaderSpec { attributes: 0x0001, num_records: 2, ..HeaderSpec::default() };
    let mut bytes = common::header_bytes(&header);
    // Body starts at 78 + 2 * 10 = 98.
    bytes.extend(resource_entry(*b"tAIN", 1000, 98));
    bytes.extend(resource_entry(*b"code", 1, 103));
    bytes.extend_from_slice(b"Hello\x4e\x75");

    let mut db = Database::from_bytes(&bytes).unwrap();
    assert!(db.header().is_resource_db());
    let name = db.blob(EntryId::Resource(FourCC::new(b"tAIN"), 1000)).unwrap();
    assert_eq!(name.dump(), b"Hello");
    let code = db.blob(EntryId::Resource(FourCC::new(b"code"), 1)).unwrap();
    assert_eq!(code.dump(), b"\x4e\x75");

    assert_eq!(db.to_bytes().unwrap(), bytes);
}

#[test]
fn inserted_and_removed_records_are_relaid_out() {
    let bytes = sample_db().build();
    let mut db = Database::from_bytes(&bytes).unwrap();

    db.remove(EntryId::Record(0x000102)).unwrap();
    db.insert(IndexEntry::record(0x000200, RecordAttributes(0)).unwrap(), b"appended".to_vec())
        .unwrap();
    db.replace_payload(EntryId::Record(0x000101), b"1st".to_vec()).unwrap();

    let dumped = db.to_bytes().unwrap();
    let reloaded = Database::from_bytes(&dumped).unwrap();

    assert_eq!(reloaded.header().num_records, 3);
    let payloads: Vec<Vec<u8>> = reloaded.blobs().map(|b| b.dump()).collect();
    assert_eq!(
        payloads,
        vec![b"1st".to_vec(), b"third and last record".to_vec(), b"appended".to_vec()]
    );
    assert!(reloaded.blob(EntryId::Record(0x000102)).is_none());
}

#[test]
fn insert_rejects_duplicates_and_wrong_variant() {
    let mut db = Database::new(Header::new("New", FourCC::new(b"DATA"), FourCC::new(b"test")));
    db.insert(IndexEntry::record(1, RecordAttributes(0)).unwrap(), Payload::Raw(vec![1])).unwrap();

    let err = db.insert(IndexEntry::record(1, RecordAttributes(0)).unwrap(), vec![2u8]).unwrap_err();
    assert!(matches!(err, PdbError::DuplicateEntryId(_)), "{err}");

    let err = db.insert(IndexEntry::resource(FourCC::new(b"code"), 0), vec![3u8]).unwrap_err();
    assert!(matches!(err, PdbError::InvalidLayout(_)), "{err}");

    let err = db.remove(EntryId::Record(99)).unwrap_err();
    assert!(matches!(err, PdbError::UnknownEntry(_)), "{err}");
}

#[test]
fn new_database_writes_and_reloads() {
    let mut db = Database::default();
    db.header_mut().name = "Fresh".to_string();
    db.set_sortinfo(Some(vec![9, 9]));
    db.insert(IndexEntry::record(10, RecordAttributes(0)).unwrap(), b"x".to_vec()).unwrap();
    db.insert(IndexEntry::record(11, RecordAttributes(0)).unwrap(), b"yy".to_vec()).unwrap();

    let bytes = db.to_bytes().unwrap();
    assert_eq!(db.header().sortinfo_offset, 78 + 16);
    assert_eq!(db.index()[0].offset(), 78 + 16 + 2);
    assert_eq!(db.index()[1].offset(), 78 + 16 + 3);
    assert_eq!(bytes.len(), 78 + 16 + 5);

    let reloaded = Database::from_bytes(&bytes).unwrap();
    assert_eq!(reloaded.header().name, "Fresh");
    assert_eq!(reloaded.sortinfo(), Some(&[9u8, 9][..]));
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn category_table_lookup() {
    let table = CategoryTable::from_pairs([("Unfiled", 0), ("Fuel", 1)]);
    assert_eq!(table.name(1).unwrap(), "Fuel");
    assert_eq!(table.index_of("Fuel"), Some(1));
    assert_eq!(table.index_of("Missing"), None);

    let err = table.name(16).unwrap_err();
    assert!(matches!(err, PdbError::IndexOutOfRange { index: 16, len: 16 }), "{err}");
}

#[test]
fn category_name_lookup_returns_first_match() {
    let mut table = CategoryTable::from_pairs([("Fuel", 0), ("Fuel", 1)]);
    assert_eq!(table.index_of("Fuel"), Some(0));
    table.set(0, Category { name: "Unfiled".to_string(), id: 0 }).unwrap();
    assert_eq!(table.index_of("Fuel"), Some(1));
}

#[test]
fn standard_appinfo_is_parsed_and_round_trips() {
    let mut source = sample_db();
    source.appinfo = Some(standard_appinfo(&[("Unfiled", 0), ("Fuel", 1), ("Service", 2)], b"rest!"));
    let bytes = source.build();

    let mut db = Database::from_bytes_with(&bytes, &standard_options()).unwrap();
    match db.appinfo() {
        Some(AppInfo::Standard(info)) => {
            assert_eq!(info.categories.name(2).unwrap(), "Service");
            assert_eq!(info.categories.slots()[1].id, 1);
            assert_eq!(info.last_unique_id, 3);
            assert_eq!(info.rest.raw(), Some(&b"rest!"[..]));
        }
        other => panic!("expected standard app-info, got {:?}", other),
    }

    assert_eq!(db.to_bytes().unwrap(), bytes);
}

#[test]
fn short_standard_appinfo_is_truncated() {
    let mut source = sample_db();
    source.appinfo = Some(vec![0; 100]);
    let bytes = source.build();

    let err = Database::from_bytes_with(&bytes, &standard_options()).unwrap_err();
    assert!(
        matches!(err, PdbError::Truncated { context: "standard app-info block", expected: 276, found: 100, .. }),
        "{err}"
    );
}

#[test]
fn record_category_follows_attribute_nibble() {
    let mut source = sample_db();
    source.appinfo = Some(standard_appinfo(&[("Unfiled", 0), ("Fuel", 1), ("Service", 2)], b""));
    let bytes = source.build();
    let mut db = Database::from_bytes_with(&bytes, &standard_options()).unwrap();

    // Attributes 0x41: dirty, category 1.
    let second = EntryId::Record(0x000102);
    assert_eq!(db.record_category(second).unwrap(), "Fuel");

    db.set_record_category(second, "Service").unwrap();
    assert_eq!(db.record_category(second).unwrap(), "Service");
    let attributes = db.index()[1].attributes().unwrap();
    assert_eq!(attributes.category(), 2);
    assert!(attributes.is_dirty());

    let err = db.set_record_category(second, "Holidays").unwrap_err();
    assert!(matches!(err, PdbError::CategoryNotFound(ref name) if name == "Holidays"), "{err}");
    assert_eq!(db.record_category(second).unwrap(), "Service");

    let reloaded = Database::from_bytes_with(&db.to_bytes().unwrap(), &standard_options()).unwrap();
    assert_eq!(reloaded.record_category(second).unwrap(), "Service");
}

#[test]
fn categories_need_standard_appinfo() {
    let bytes = sample_db().build();
    let db = Database::from_bytes(&bytes).unwrap();
    let err = db.record_category(EntryId::Record(0x000101)).unwrap_err();
    assert!(matches!(err, PdbError::NotStandardAppInfo), "{err}");
}

#[test]
fn timestamps_use_the_palm_epoch() {
    assert_eq!(timestamp::from_palm(0), None);
    assert_eq!(
        timestamp::from_palm(timestamp::PALM_EPOCH_OFFSET as u32),
        Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap())
    );

    let bytes = sample_db().build();
    let mut db = Database::from_bytes(&bytes).unwrap();
    assert_eq!(db.backup_time(), None);

    let when = Utc.with_ymd_and_hms(2003, 5, 17, 12, 30, 0).unwrap();
    db.set_ctime(when).unwrap();
    db.set_backup_time(when).unwrap();
    assert_eq!(db.ctime(), Some(when));

    let reloaded = Database::from_bytes(&db.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.ctime(), Some(when));
    assert_eq!(reloaded.backup_time(), Some(when));

    let too_early = Utc.with_ymd_and_hms(1850, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(db.set_mtime(too_early), Err(PdbError::TimestampOutOfRange(_))));
}

#[test]
fn loads_relative_to_stream_position() {
    let bytes = sample_db().build();
    let mut stream = Cursor::new(Vec::new());
    stream.write_all(b"PREFIX--").unwrap();
    stream.write_all(&bytes).unwrap();
    stream.seek(SeekFrom::Start(8)).unwrap();

    let db = Database::load(&mut stream).unwrap();
    assert_eq!(db.len(), 3);
    assert_eq!(db.blob(EntryId::Record(0x000101)).unwrap().dump(), b"first record");
}

#[test]
fn file_backed_round_trip() {
    let bytes = sample_db().build();
    let mut db = Database::from_bytes(&bytes).unwrap();

    let mut file = tempfile::tempfile().unwrap();
    db.dump(&mut file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();

    let reloaded = Database::load(&mut file).unwrap();
    assert_eq!(reloaded.header(), db.header());
    assert_eq!(reloaded.len(), 3);
}

#[test]
fn failed_dump_writes_nothing() {
    let bytes = sample_db().build();
    let mut db = Database::from_bytes(&bytes).unwrap();
    db.header_mut().set_resource_db(true);

    let mut out = Vec::new();
    let err = db.dump(&mut out).unwrap_err();
    assert!(matches!(err, PdbError::InvalidLayout(_)), "{err}");
    assert!(out.is_empty(), "{} bytes written before the error", out.len());
}

#[test]
fn full_width_names_round_trip() {
    let mut source = sample_db();
    source.header.name = "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";
    source.appinfo = Some(standard_appinfo(&[("Unfiled", 0), ("SixteenCharsName", 1)], b""));
    let bytes = source.build();

    let mut db = Database::from_bytes_with(&bytes, &standard_options()).unwrap();
    assert_eq!(db.header().name, "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345");
    assert_eq!(db.appinfo().unwrap().category_name(1).unwrap(), "SixteenCharsName");

    let dumped = db.to_bytes().unwrap();
    assert_eq!(dumped, bytes);
    let reloaded = Database::from_bytes(&dumped).unwrap();
    assert_eq!(reloaded.header().name, "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345");
}

#[test]
fn overlong_names_are_cut_to_the_field() {
    let mut db = Database::new(Header::new(
        "A name that is far too long for the header field",
        FourCC::new(b"DATA"),
        FourCC::new(b"test"),
    ));
    let reloaded = Database::from_bytes(&db.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.header().name, "A name that is far too long for ");
}

#[test]
fn record_ids_wider_than_24_bits_are_rejected() {
    let err = IndexEntry::record(0x0100_0001, RecordAttributes(0)).unwrap_err();
    assert!(matches!(err, PdbError::UniqueIdOutOfRange(0x0100_0001)), "{err}");
    assert!(IndexEntry::record(IndexEntry::MAX_UNIQUE_ID, RecordAttributes(0)).is_ok());

    let mut db = Database::new(Header::new("Wide", FourCC::new(b"DATA"), FourCC::new(b"test")));
    db.insert(IndexEntry::record(1, RecordAttributes(0)).unwrap(), b"one".to_vec()).unwrap();
    let wide = IndexEntry::Record { unique_id: 0x0100_0001, attributes: RecordAttributes(0), offset: 0 };
    let err = db.insert(wide, b"wide".to_vec()).unwrap_err();
    assert!(matches!(err, PdbError::UniqueIdOutOfRange(_)), "{err}");
    assert_eq!(db.len(), 1);

    let mut out = Vec::new();
    let err = pdb_container::pdb::format::index::write(&mut out, db.header(), &[wide]).unwrap_err();
    assert!(matches!(err, PdbError::UniqueIdOutOfRange(_)), "{err}");
    assert!(out.is_empty());

    let reloaded = Database::from_bytes(&db.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.blob(EntryId::Record(1)).unwrap().dump(), b"one");
}

#[test]
fn standard_appinfo_pad_byte_is_preserved() {
    let mut appinfo = standard_appinfo(&[("Unfiled", 0)], b"tail");
    appinfo[275] = 0x5a;
    let mut source = sample_db();
    source.appinfo = Some(appinfo);
    let bytes = source.build();

    let mut db = Database::from_bytes_with(&bytes, &standard_options()).unwrap();
    match db.appinfo() {
        Some(AppInfo::Standard(info)) => assert_eq!(info.pad, 0x5a),
        other => panic!("expected standard app-info, got {:?}", other),
    }
    assert_eq!(db.to_bytes().unwrap(), bytes);
}

#[test]
fn encoding_labels_are_resolved_or_reported() {
    let options = LoadOptions::default().with_encoding_label("utf-8").unwrap();
    assert_eq!(options.encoding.name(), "UTF-8");

    let err = LoadOptions::default().with_encoding_label("bogus").unwrap_err();
    assert!(matches!(err, PdbError::UnknownEncoding(ref label) if label == "bogus"), "{err}");
}
