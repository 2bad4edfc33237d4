use super::*;

use crate::test_support::ScratchDir;

#[test]
fn entries_resolve_against_split_file_dir_when_path_missing() {
    let dir = ScratchDir::new("splits_rel");
    let file = dir.path().join("splits.json");
    std::fs::write(
        &file,
        r#"{ "path": "/no/such/dir", "train": ["a.png", "b.png"], "test": [] }"#,
    )
    .unwrap();

    let train = load_split_entries(&file, "train").unwrap();
    assert_eq!(train, vec![dir.path().join("a.png"), dir.path().join("b.png")]);
    assert!(load_split_entries(&file, "test").unwrap().is_empty());
    assert!(load_split_entries(&file, "validation").unwrap().is_empty());
}

#[test]
fn entries_use_declared_path_when_it_exists() {
    let dir = ScratchDir::new("splits_abs");
    let base = dir.path().join("images");
    std::fs::create_dir_all(&base).unwrap();
    let file = dir.path().join("splits.json");
    let json = serde_json::json!({ "path": base, "validation": ["x.png"] });
    std::fs::write(&file, json.to_string()).unwrap();

    let entries = load_split_entries(&file, "validation").unwrap();
    assert_eq!(entries, vec![base.join("x.png")]);
}

#[test]
fn missing_split_file_is_a_validation_error() {
    let err = load_split_entries(Path::new("/no/such/splits.json"), "train").unwrap_err();
    assert!(matches!(err, CutPasteError::Validation(_)));
}
