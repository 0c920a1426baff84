use indexset::{new_index_set, FsObjectClient, IndexSet, IndexSetError, StorageConfig};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

fn names(files: &[indexset::IndexFile]) -> Vec<String> {
    files.iter().map(|f| f.name.clone()).collect()
}

#[tokio::test]
async fn user_based_set_hides_directory_placeholders() {
    let tmp = tempfile::tempdir().unwrap();
    let client = Arc::new(FsObjectClient::new(tmp.path()).with_emit_directory_entries(true));
    let set = new_index_set(client.clone(), true);

    for name in ["1700000000/db-a.gz", "1700000000/db-b.gz", "compacted.gz"] {
        let mut src = Cursor::new(name.as_bytes().to_vec());
        set.put_file("index_19700", "tenant-a", name, &mut src).await.unwrap();
    }

    // the raw client listing carries the directory entry
    let raw = indexset::Client::list_user_files(client.as_ref(), "index_19700", "tenant-a", true).await.unwrap();
    assert!(names(&raw).contains(&"1700000000".to_string()));

    let files = set.list_files("index_19700", "tenant-a", true).await.unwrap();
    assert_eq!(names(&files), vec!["1700000000/db-a.gz", "1700000000/db-b.gz", "compacted.gz"]);

    let mut body = String::new();
    set.get_file("index_19700", "tenant-a", "1700000000/db-b.gz")
        .await
        .unwrap()
        .read_to_string(&mut body)
        .await
        .unwrap();
    assert_eq!(body, "1700000000/db-b.gz");
}

#[tokio::test]
async fn common_set_lists_only_shared_files() {
    let tmp = tempfile::tempdir().unwrap();
    let client = Arc::new(FsObjectClient::new(tmp.path()));
    let common = new_index_set(client.clone(), false);
    let users = new_index_set(client, true);

    let mut src = Cursor::new(b"shared".to_vec());
    common.put_file("index_19700", "", "shared.gz", &mut src).await.unwrap();
    let mut src = Cursor::new(b"mine".to_vec());
    users.put_file("index_19700", "tenant-a", "mine.gz", &mut src).await.unwrap();

    let files = common.list_files("index_19700", "", false).await.unwrap();
    assert_eq!(names(&files), vec!["shared.gz"]);
    let files = users.list_files("index_19700", "tenant-a", false).await.unwrap();
    assert_eq!(names(&files), vec!["mine.gz"]);
}

#[tokio::test]
async fn deleted_file_is_reported_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let set = new_index_set(Arc::new(FsObjectClient::new(tmp.path())), false);

    let mut src = Cursor::new(b"x".to_vec());
    set.put_file("t", "", "f.gz", &mut src).await.unwrap();
    set.delete_file("t", "", "f.gz").await.unwrap();

    let err = set.get_file("t", "", "f.gz").await.err().unwrap();
    assert!(set.is_file_not_found_err(&err));
    let err = set.delete_file("t", "", "f.gz").await.unwrap_err();
    assert!(set.is_file_not_found_err(&err));
}

#[tokio::test]
async fn tenant_mismatch_never_reaches_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let set = new_index_set(Arc::new(FsObjectClient::new(tmp.path())), true);

    let mut src = Cursor::new(b"x".to_vec());
    let err = set.put_file("t", "", "f.gz", &mut src).await.unwrap_err();
    assert_eq!(err.downcast_ref::<IndexSetError>(), Some(&IndexSetError::UserIdMustNotBeEmpty));
    assert!(!set.is_file_not_found_err(&err));
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn refresh_through_the_set_drops_cached_listing() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = StorageConfig { root: tmp.path().to_path_buf(), list_cache_ttl_ms: 3_600_000, ..Default::default() };
    let client = Arc::new(FsObjectClient::from_config(&cfg).with_list_cache_ttl(Duration::from_secs(3600)));
    let set = new_index_set(client, cfg.user_based_index);

    assert!(set.list_files("t", "", false).await.unwrap().is_empty());
    std::fs::create_dir_all(tmp.path().join("t")).unwrap();
    std::fs::write(tmp.path().join("t").join("late.gz"), b"x").unwrap();
    assert!(set.list_files("t", "", false).await.unwrap().is_empty());

    set.refresh_index_table_cache("t").await;
    assert_eq!(names(&set.list_files("t", "", false).await.unwrap()), vec!["late.gz"]);
}
