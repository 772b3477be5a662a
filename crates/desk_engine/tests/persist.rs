use std::fs;

use desk_engine::{ensure_state_dir, AtomicFileWriter, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let state_dir = temp.path().join(".desk").join("cache");
    ensure_state_dir(&state_dir).unwrap();
    assert!(state_dir.is_dir());
}

#[test]
fn rewrite_replaces_previous_blob() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());

    let first = writer.write("solution_cache.json", r#"{"ERP-1":[]}"#).unwrap();
    let second = writer.write("solution_cache.json", "{}").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "{}");
    let leftovers = fs::read_dir(temp.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn read_of_missing_file_is_none() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path());
    assert_eq!(writer.read("solution_cache.json").unwrap(), None);

    writer.write("solution_cache.json", "{}").unwrap();
    assert_eq!(
        writer.read("solution_cache.json").unwrap().as_deref(),
        Some("{}")
    );
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    let err = writer.write("solution_cache.json", "{}").unwrap_err();
    assert!(matches!(err, PersistError::StateDir { .. }), "{err}");
    assert!(!file_path.with_file_name("solution_cache.json").exists());
}
