use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::timeout;

use filenotify::{EventKind, FileWatcher, NativeEventWatcher, WatchError};

type TestResult = Result<(), Box<dyn Error>>;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn native_watcher_reports_created_file() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = NativeEventWatcher::new()?;
    watcher.add(dir.path())?;

    let file = dir.path().join("fresh.txt");
    fs::write(&file, "hello")?;

    let event = timeout(WAIT, watcher.events().recv())
        .await?
        .expect("event stream terminated early");
    assert_eq!(event.kind, EventKind::Create);
    // Some platforms canonicalize watched paths, so compare the file name.
    assert_eq!(event.path.file_name(), file.file_name());

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn remove_unregistered_path_is_unknown() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = NativeEventWatcher::new()?;

    let err = watcher
        .remove(&dir.path().join("never-added"))
        .expect_err("remove of unregistered path must fail");
    assert!(matches!(err, WatchError::UnknownPath(_)));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn add_nonexistent_path_fails() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = NativeEventWatcher::new()?;

    let err = watcher
        .add(&dir.path().join("missing"))
        .expect_err("add of nonexistent path must fail");
    assert!(matches!(err, WatchError::PathNotFound { .. }));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_terminates_streams() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = NativeEventWatcher::new()?;
    watcher.add(dir.path())?;

    watcher.close().await?;
    watcher.close().await?;

    let ended = timeout(WAIT, watcher.events().recv()).await?;
    assert_eq!(ended, None);

    assert!(matches!(watcher.add(dir.path()), Err(WatchError::Closed)));
    Ok(())
}
