use super::*;

fn exercise(store: &dyn BlobStore) {
    let a = store.put(ImageMime::Jpeg, b"jpeg-bytes").unwrap();
    let b = store.put(ImageMime::Png, b"png-bytes").unwrap();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("/uploads/upload-"));
    assert!(a.as_str().ends_with(".jpg"));
    assert!(b.as_str().ends_with(".png"));

    assert_eq!(store.get(&a).unwrap(), b"jpeg-bytes");
    store.delete(&a).unwrap();
    assert!(matches!(store.get(&a), Err(SynthError::NotFound(_))));
    store.delete(&a).unwrap();
    assert_eq!(store.get(&b).unwrap(), b"png-bytes");
}

#[test]
fn memory_blob_store() {
    let store = MemoryBlobStore::new();
    exercise(&store);
    assert_eq!(store.len(), 1);
}

#[test]
fn dir_blob_store() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/blob_unit");
    let _ = std::fs::remove_dir_all(&dir);
    let store = DirBlobStore::open(&dir).unwrap();
    exercise(&store);
    let files: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[test]
fn refs_cannot_escape_the_store() {
    let store = MemoryBlobStore::new();
    for bad in ["/uploads/../secret", "/etc/passwd", "/uploads/", "/uploads/a/b.png"] {
        assert!(
            matches!(
                store.get(&BlobRef(bad.to_owned())),
                Err(SynthError::NotFound(_))
            ),
            "{bad}"
        );
    }
}
