use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;
use tokio::time::timeout;

use filenotify::{EventKind, FileEvent, FileWatcher, PollWatcher, WatchError};

type TestResult = Result<(), Box<dyn Error>>;

const INTERVAL: Duration = Duration::from_millis(25);
const WAIT: Duration = Duration::from_secs(5);

async fn collect_events(watcher: &mut PollWatcher, n: usize) -> Vec<FileEvent> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let event = timeout(WAIT, watcher.events().recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream terminated early");
        out.push(event);
    }
    out
}

async fn assert_quiet(watcher: &mut PollWatcher) {
    let extra = timeout(INTERVAL * 4, watcher.events().recv()).await;
    assert!(extra.is_err(), "unexpected extra event: {extra:?}");
}

#[tokio::test]
async fn create_in_watched_directory_emits_one_create() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(dir.path())?;

    let new_file = dir.path().join("new.txt");
    fs::write(&new_file, "hello")?;

    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&new_file, EventKind::Create));
    assert_quiet(&mut watcher).await;

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn write_to_watched_file_emits_write() -> TestResult {
    let dir = tempdir()?;
    let file = dir.path().join("config.toml");
    fs::write(&file, "a = 1")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(&file)?;

    fs::write(&file, "a = 1\nb = 2")?;

    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&file, EventKind::Write));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn mtime_only_change_emits_write() -> TestResult {
    use filetime::FileTime;

    let dir = tempdir()?;
    let file = dir.path().join("lambda.py");
    fs::write(&file, "pass")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(&file)?;

    // Same size, different modification time.
    let backdated = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(&file, backdated)?;

    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&file, EventKind::Write));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn removed_file_emits_remove_then_create_on_reappearance() -> TestResult {
    let dir = tempdir()?;
    let file = dir.path().join("handler.py");
    fs::write(&file, "v1")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(&file)?;

    fs::remove_file(&file)?;
    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&file, EventKind::Remove));

    // The path stays registered, so re-creation is a fresh Create.
    fs::write(&file, "v2")?;
    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&file, EventKind::Create));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn directory_diff_reports_only_modified_children() -> TestResult {
    let dir = tempdir()?;
    let kept = dir.path().join("a.txt");
    let modified = dir.path().join("b.txt");
    let removed = dir.path().join("c.txt");
    fs::write(&kept, "a")?;
    fs::write(&modified, "b")?;
    fs::write(&removed, "c")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(dir.path())?;

    let created = dir.path().join("d.txt");
    fs::write(&modified, "b, but longer")?;
    fs::write(&created, "d")?;
    fs::remove_file(&removed)?;

    let mut events = collect_events(&mut watcher, 3).await;
    events.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(
        events,
        vec![
            FileEvent::new(&modified, EventKind::Write),
            FileEvent::new(&removed, EventKind::Remove),
            FileEvent::new(&created, EventKind::Create),
        ]
    );

    // Zero events for the untouched child.
    assert_quiet(&mut watcher).await;

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn vanished_path_does_not_block_other_paths_in_same_tick() -> TestResult {
    let dir = tempdir()?;
    let vanishing = dir.path().join("gone.txt");
    let surviving = dir.path().join("kept.txt");
    fs::write(&vanishing, "x")?;
    fs::write(&surviving, "y")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(&vanishing)?;
    watcher.add(&surviving)?;

    fs::remove_file(&vanishing)?;
    fs::write(&surviving, "y, changed")?;

    let mut events = collect_events(&mut watcher, 2).await;
    events.sort_by(|a, b| a.path.cmp(&b.path));
    assert_eq!(
        events,
        vec![
            FileEvent::new(&vanishing, EventKind::Remove),
            FileEvent::new(&surviving, EventKind::Write),
        ]
    );

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn add_is_idempotent() -> TestResult {
    let dir = tempdir()?;
    let file = dir.path().join("once.txt");
    fs::write(&file, "1")?;

    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(&file)?;
    watcher.add(&file)?;

    fs::write(&file, "22")?;

    let events = collect_events(&mut watcher, 1).await;
    assert_eq!(events[0], FileEvent::new(&file, EventKind::Write));
    assert_quiet(&mut watcher).await;

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn remove_unregistered_path_is_unknown() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = PollWatcher::new(INTERVAL);

    let err = watcher
        .remove(&dir.path().join("never-added.txt"))
        .expect_err("remove of unregistered path must fail");
    assert!(matches!(err, WatchError::UnknownPath(_)));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn add_nonexistent_path_fails() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = PollWatcher::new(INTERVAL);

    let err = watcher
        .add(&dir.path().join("missing.txt"))
        .expect_err("add of nonexistent path must fail");
    assert!(matches!(err, WatchError::PathNotFound { .. }));

    watcher.close().await?;
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_and_terminates_streams() -> TestResult {
    let dir = tempdir()?;
    let mut watcher = PollWatcher::new(INTERVAL);
    watcher.add(dir.path())?;

    watcher.close().await?;
    watcher.close().await?;

    let ended = timeout(WAIT, watcher.events().recv()).await?;
    assert_eq!(ended, None);
    let ended = timeout(WAIT, watcher.errors().recv()).await?;
    assert!(ended.is_none());

    assert!(matches!(watcher.add(dir.path()), Err(WatchError::Closed)));
    assert!(matches!(
        watcher.remove(dir.path()),
        Err(WatchError::Closed)
    ));
    Ok(())
}
