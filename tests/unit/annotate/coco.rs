use super::*;

use crate::test_support::ScratchDir;

fn sample_file() -> AnnotationFile {
    AnnotationFile {
        categories: vec![CocoCategory::new(0, "box"), CocoCategory::new(2, "distractor")],
        annotations: vec![CocoAnnotation {
            segmentation: vec![vec![1, 1, 1, 4, 4, 4, 4, 1]],
            iscrowd: 0,
            image_id: 0,
            category_id: 0,
            id: 0,
            bbox: [1, 1, 4, 4],
            area: 16,
        }],
        images: vec![CocoImage {
            id: 0,
            file_name: "train/00001/image_none00.jpg".to_string(),
            width: 8,
            height: 8,
        }],
        render_config: None,
    }
}

#[test]
fn missing_render_config_is_neither_written_nor_required() {
    let json = serde_json::to_value(sample_file()).unwrap();
    assert!(json.get("render_config").is_none());
    assert_eq!(json["annotations"][0]["bbox"], serde_json::json!([1, 1, 4, 4]));

    let parsed: AnnotationFile = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, sample_file());
}

#[test]
fn render_config_uses_coco_sidecar_keys() {
    let mut file = sample_file();
    file.render_config = Some(RenderConfig {
        path: RenderPaths {
            objects: "/data/objects".to_string(),
            distractor_objects: String::new(),
        },
        objects: vec!["a.png".to_string()],
        distractors: Vec::new(),
        background: "/data/bg/1.jpg".to_string(),
    });
    let json = serde_json::to_value(&file).unwrap();
    let rc = &json["render_config"];
    assert_eq!(rc["path"]["objects"], "/data/objects");
    assert_eq!(rc["path"]["distractor_objects"], "");
    assert_eq!(rc["objects"][0], "a.png");
    assert_eq!(rc["background"], "/data/bg/1.jpg");
}

#[test]
fn atomic_write_creates_parents_and_leaves_no_temp_file() {
    let dir = ScratchDir::new("coco_write");
    let path = dir.path().join("train").join("00001").join("image_none00.json");
    write_json_atomic(&path, &sample_file()).unwrap();

    let back: AnnotationFile = read_json(&path).unwrap();
    assert_eq!(back, sample_file());
    let names: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("image_none00.json")]);
}

#[test]
fn read_errors_are_reported() {
    let dir = ScratchDir::new("coco_read");
    let missing = read_json::<AnnotationFile>(&dir.path().join("nope.json")).unwrap_err();
    assert!(matches!(missing, CutPasteError::Other(_)));

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, "{ not json").unwrap();
    let err = read_json::<AnnotationFile>(&bad).unwrap_err();
    assert!(matches!(err, CutPasteError::Serde(_)));
}
