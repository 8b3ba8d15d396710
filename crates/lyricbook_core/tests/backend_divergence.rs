use lyricbook_core::{
    BlobRecordRepository, FileRecordRepository, MemoryKvStore, RecordRepository, RecordStore,
    SongRecord,
};

fn save_twice<R: RecordRepository>(store: &mut RecordStore<R>) {
    store.save(&SongRecord::new("A", "x", "")).unwrap();
    store.save(&SongRecord::new("A", "y", "")).unwrap();
}

#[test]
fn repeated_title_diverges_between_backends() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = RecordStore::new(FileRecordRepository::new(dir.path()));
    let mut blob = RecordStore::new(BlobRecordRepository::with_default_key(MemoryKvStore::new()));

    save_twice(&mut files);
    save_twice(&mut blob);

    let file_entries = files.repository().load_records().unwrap();
    let blob_entries = blob.repository().load_records().unwrap();
    assert_eq!(file_entries, vec![SongRecord::new("A", "y", "")]);
    assert_eq!(
        blob_entries,
        vec![SongRecord::new("A", "x", ""), SongRecord::new("A", "y", "")]
    );

    // Both facades agree once keyed by title.
    assert_eq!(files.load().unwrap(), blob.load().unwrap());
}

#[test]
fn update_behaves_the_same_on_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = RecordStore::new(FileRecordRepository::new(dir.path()));
    let mut blob = RecordStore::new(BlobRecordRepository::with_default_key(MemoryKvStore::new()));

    files.save(&SongRecord::new("Old", "1", "")).unwrap();
    blob.save(&SongRecord::new("Old", "1", "")).unwrap();

    let renamed = SongRecord::new("New", "2", "e|-0-|");
    files.update("Old", &renamed).unwrap();
    blob.update("Old", &renamed).unwrap();

    assert_eq!(files.snapshot(), blob.snapshot());
    assert_eq!(files.snapshot().len(), 1);
    assert_eq!(files.snapshot()["New"], renamed);
}

#[test]
fn update_onto_existing_title_replaces_it_on_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let mut files = RecordStore::new(FileRecordRepository::new(dir.path()));
    let mut blob = RecordStore::new(BlobRecordRepository::with_default_key(MemoryKvStore::new()));

    for (title, lyrics) in [("A", "a"), ("B", "b")] {
        files.save(&SongRecord::new(title, lyrics, "")).unwrap();
        blob.save(&SongRecord::new(title, lyrics, "")).unwrap();
    }

    let merged = SongRecord::new("B", "z", "");
    files.update("A", &merged).unwrap();
    blob.update("A", &merged).unwrap();

    assert_eq!(files.snapshot().len(), 1);
    assert_eq!(files.snapshot()["B"].lyrics, "z");
    assert_eq!(files.snapshot(), blob.snapshot());
    assert_eq!(blob.repository().load_records().unwrap(), vec![merged]);
}
