//! Integration tests for filesystem diagnostic storage.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use omr_adapters::FsDebugStorage;
use omr_core::{DebugStorage, DiagnosticKind, EngineConfig, OmrEngine, ProcessingOptions};
use omr_test_support::SyntheticSheetBuilder;

fn age_file(path: &Path, age: Duration) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[test]
fn test_creates_missing_directory() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("nested").join("debug");
    let storage = FsDebugStorage::new(&dir).expect("create storage");
    assert!(dir.is_dir());
    assert_eq!(storage.dir(), dir);
}

#[test]
fn test_save_writes_bytes_and_returns_path() {
    let root = tempfile::tempdir().unwrap();
    let storage = FsDebugStorage::new(root.path()).unwrap();

    let location = storage.save_debug_image(b"jpeg-bytes", "roi", "jpg").unwrap();

    let path = Path::new(&location);
    assert!(path.starts_with(root.path()));
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("roi_"));
    assert!(name.ends_with(".jpg"));
    assert_eq!(std::fs::read(path).unwrap(), b"jpeg-bytes");
}

#[test]
fn test_cleanup_removes_only_old_files() {
    let root = tempfile::tempdir().unwrap();
    let storage = FsDebugStorage::new(root.path()).unwrap();

    let old = storage.save_debug_image(b"old", "binary", "jpg").unwrap();
    let fresh = storage.save_debug_image(b"new", "nogrid", "jpg").unwrap();
    age_file(Path::new(&old), Duration::from_secs(48 * 3600));

    let removed = storage
        .cleanup_old_files(Duration::from_secs(24 * 3600))
        .unwrap();

    assert_eq!(removed, 1);
    assert!(!Path::new(&old).exists());
    assert!(Path::new(&fresh).exists());
}

#[test]
fn test_cleanup_skips_directories() {
    let root = tempfile::tempdir().unwrap();
    std::fs::create_dir(root.path().join("keep")).unwrap();
    let storage = FsDebugStorage::new(root.path()).unwrap();

    assert_eq!(storage.cleanup_old_files(Duration::ZERO).unwrap(), 0);
    assert!(root.path().join("keep").is_dir());
}

#[test]
fn test_retention_prunes_on_save() {
    let root = tempfile::tempdir().unwrap();
    let storage = FsDebugStorage::new(root.path())
        .unwrap()
        .with_retention(Duration::from_secs(3600));

    let stale = storage.save_debug_image(b"a", "roi", "jpg").unwrap();
    age_file(Path::new(&stale), Duration::from_secs(2 * 3600));

    let kept = storage.save_debug_image(b"b", "roi", "jpg").unwrap();

    assert!(!Path::new(&stale).exists());
    assert!(Path::new(&kept).exists());
    assert_eq!(file_count(root.path()), 1);
}

#[test]
fn test_engine_writes_diagnostics_to_disk() {
    let root = tempfile::tempdir().unwrap();
    let storage = Arc::new(FsDebugStorage::new(root.path()).unwrap());
    let engine = OmrEngine::new(EngineConfig::default())
        .unwrap()
        .with_debug_storage(storage);

    let sheet = SyntheticSheetBuilder::new(4, &["A", "B", "C"]).mark(2, "B");
    let options = ProcessingOptions::builder()
        .question_count(4)
        .choice_labels(["A", "B", "C"])
        .debug(true)
        .build()
        .unwrap();

    let result = engine.process(&sheet.png_bytes(), &options).unwrap();

    assert_eq!(result.diagnostics.len(), 3);
    for kind in DiagnosticKind::ALL {
        let location = &result.diagnostics[&kind];
        let bytes = std::fs::read(location).unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let name = Path::new(location).file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(kind.label()));
    }
    assert_eq!(file_count(root.path()), 3);
}
