use std::fs;

use recon_engine::{OutputDir, PersistError};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path().join("dashboard"));
    assert!(!dir.path().exists());
    dir.ensure().unwrap();
    assert!(dir.path().is_dir());
}

#[test]
fn atomic_write_replaces_existing_page() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());

    let first = dir.write_atomic("osint.html", "<p>one</p>").unwrap();
    assert_eq!(first.file_name().unwrap(), "osint.html");
    let second = dir.write_atomic("osint.html", "<p>two</p>").unwrap();

    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "<p>two</p>");
    // Only the page itself is left behind, no temp files.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn read_of_missing_file_is_none() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());
    assert_eq!(dir.read("absent.ron").unwrap(), None);

    dir.write_atomic("present.ron", "()").unwrap();
    assert_eq!(dir.read("present.ron").unwrap().as_deref(), Some("()"));
}

#[test]
fn file_in_place_of_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let dir = OutputDir::new(file_path.clone());
    let err = dir.write_atomic("page.html", "data").unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
    assert!(!temp.path().join("page.html").exists());
}

#[test]
fn path_traversal_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path());
    for name in ["../escape.html", "a/b.html", "", ".."] {
        assert!(
            matches!(dir.write_atomic(name, "x"), Err(PersistError::InvalidFilename(_))),
            "{name:?}"
        );
    }
}

#[test]
fn writes_need_an_existing_dir() {
    let temp = TempDir::new().unwrap();
    let dir = OutputDir::new(temp.path().join("dashboard"));

    let err = dir.write_atomic("osint.html", "x").unwrap_err();
    assert!(matches!(err, PersistError::OutputDir(_)));
    assert!(!dir.path().exists());

    dir.ensure().unwrap();
    dir.write_atomic("osint.html", "x").unwrap();
    dir.write_atomic("osint.html", "y").unwrap();
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}
