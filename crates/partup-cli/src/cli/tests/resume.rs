use crate::cli::commands::run_resume;
use partup_core::config::UploadConfig;
use partup_core::store::DirectoryStore;
use std::io::Write;

fn source_file(len: usize) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&vec![7u8; len]).unwrap();
    f.flush().unwrap();
    f
}

#[tokio::test]
async fn resume_waits_until_part_is_stored() {
    let src = source_file(1024 * 1024);
    let dir = tempfile::tempdir().unwrap();

    run_resume(&UploadConfig::default(), src.path(), 42, 1, Some(dir.path().to_path_buf()))
        .await
        .unwrap();

    let store = DirectoryStore::new(dir.path());
    assert_eq!(store.stored_parts(42).await.unwrap(), vec![1]);
}

#[tokio::test]
async fn resume_fails_when_part_cannot_be_stored() {
    let src = source_file(1024 * 1024);
    // A regular file cannot hold the per-upload part directory.
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let store_dir = blocker.path().join("store");

    let err = run_resume(&UploadConfig::default(), src.path(), 42, 0, Some(store_dir))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("part 0 of file 42 was not stored"), "{err:#}");
}
