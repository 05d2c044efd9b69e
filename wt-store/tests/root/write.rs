use std::fs;

use wt_store::dynamic_range::DynamicRanges;
use wt_store::locate::locate_file;
use wt_store::record::WeightRecord;
use wt_store::result::{ErrorKind, FormatError, WeightError};
use wt_store::write::{save_weights, write_weights};

use crate::utils::{load_from_bytes, written};

#[test]
fn writer_rejects_duplicates_before_writing() {
    let a = WeightRecord::from_values("a", vec![1], &[1.0f32]);
    let mut bytes = vec![];
    let error = write_weights(&mut bytes, [&a, &a]).unwrap_err();

    assert_eq!(error.format_error(), Some(&FormatError::DuplicateName("a".to_owned())));
    assert!(bytes.is_empty());
}

#[test]
fn written_container_loads_back() {
    let a = WeightRecord::from_values("a", vec![2, 2], &[1i32, 2, 3, 4]);
    let b = WeightRecord::from_values("b", vec![1], &[9.0f32]);
    let bytes = written(&[&a, &b]);

    assert!(bytes.starts_with(b"2\na 3 (2,2) "));
    let store = load_from_bytes(&bytes, &["a", "b"]);
    assert_eq!(store["a"], a);
    assert_eq!(store["b"], b);
}

#[test]
fn locate_searches_dirs_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    fs::write(second.path().join("model.wts"), b"1\n").unwrap();

    let dirs = [first.path(), second.path()];
    assert_eq!(locate_file("model.wts", &dirs).unwrap(), second.path().join("model.wts"));

    fs::write(first.path().join("model.wts"), b"1\n").unwrap();
    assert_eq!(locate_file("model.wts", &dirs).unwrap(), first.path().join("model.wts"));

    let error = locate_file("other.wts", &dirs).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Io);
    assert!(matches!(error, WeightError::NotFound { name, dirs } if name == "other.wts" && dirs.len() == 2));

    assert!(locate_file("../model.wts", &[second.path().join("sub")]).is_err());
}

#[test]
fn dynamic_ranges_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ranges.txt");
    fs::write(&path, "data:1.5\n\nconv1:0.25\ndata:3\n").unwrap();

    let ranges = DynamicRanges::load(&path).unwrap();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges.range_for("data"), Some((-3.0, 3.0)));
    assert_eq!(ranges.range_for("conv1"), Some((-0.25, 0.25)));

    fs::write(&path, "data:1.5\nbroken\n").unwrap();
    let error = DynamicRanges::load(&path).unwrap_err();
    assert_eq!(
        error.format_error(),
        Some(&FormatError::InvalidDynamicRange(2, "broken".to_owned()))
    );

    assert_eq!(DynamicRanges::load(dir.path().join("absent.txt")).unwrap_err().kind(), ErrorKind::Io);
}

#[test]
fn save_overwrites_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.wts");
    fs::write(&path, b"garbage that is much longer than the container").unwrap();

    let a = WeightRecord::from_values("a", vec![1], &[1u8]);
    save_weights(&path, [&a]).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"1\na 4 (1) \x01\n".to_vec());
}
