use super::*;

use crate::annotate::coco::{CocoAnnotation, CocoImage};
use crate::test_support::ScratchDir;

fn annotation(image_id: u64, id: u64, category_id: u32) -> CocoAnnotation {
    CocoAnnotation {
        segmentation: vec![vec![0, 0, 3, 0, 3, 3]],
        iscrowd: 0,
        image_id,
        category_id,
        id,
        bbox: [0, 0, 4, 4],
        area: 10,
    }
}

fn per_image_file(n_annotations: u64, categories: Vec<CocoCategory>) -> AnnotationFile {
    AnnotationFile {
        categories,
        annotations: (0..n_annotations).map(|i| annotation(2, i, 0)).collect(),
        images: vec![CocoImage {
            id: 2,
            file_name: "train/00001/image_none00.jpg".to_string(),
            width: 64,
            height: 48,
        }],
        render_config: None,
    }
}

fn default_categories() -> Vec<CocoCategory> {
    vec![CocoCategory::new(0, "box"), CocoCategory::new(2, "distractor")]
}

#[test]
fn images_and_annotations_are_renumbered_in_file_order() {
    let dir = ScratchDir::new("merge_renumber");
    let counts = [2u64, 0, 3, 1];
    let mut paths = Vec::new();
    for (i, n) in counts.iter().enumerate() {
        let p = dir.path().join(format!("{i:05}.json"));
        write_json_atomic(&p, &per_image_file(*n, default_categories())).unwrap();
        paths.push(p);
    }

    let merged = merge_annotation_files(&paths).unwrap();
    let image_ids: Vec<u64> = merged.images.iter().map(|i| i.id).collect();
    assert_eq!(image_ids, vec![0, 1, 2, 3]);
    let ann_ids: Vec<u64> = merged.annotations.iter().map(|a| a.id).collect();
    assert_eq!(ann_ids, (0..6).collect::<Vec<_>>());
    let ann_images: Vec<u64> = merged.annotations.iter().map(|a| a.image_id).collect();
    assert_eq!(ann_images, vec![0, 0, 2, 2, 2, 3]);
    assert_eq!(merged.categories, default_categories());
}

#[test]
fn conflicting_category_ids_abort_the_merge() {
    let dir = ScratchDir::new("merge_conflict");
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    write_json_atomic(&a, &per_image_file(1, default_categories())).unwrap();
    write_json_atomic(&b, &per_image_file(1, vec![CocoCategory::new(1, "box")])).unwrap();

    let err = merge_annotation_files(&[a, b]).unwrap_err();
    assert!(matches!(err, CutPasteError::Merge(_)));
}

#[test]
fn dangling_annotation_is_a_merge_error() {
    let dir = ScratchDir::new("merge_dangling");
    let mut file = per_image_file(1, default_categories());
    file.annotations[0].image_id = 9;
    let p = dir.path().join("a.json");
    write_json_atomic(&p, &file).unwrap();
    assert!(matches!(
        merge_annotation_files(&[p]).unwrap_err(),
        CutPasteError::Merge(_)
    ));
}

#[test]
fn split_dir_merge_walks_recursively_and_skips_its_output() {
    let dir = ScratchDir::new("merge_split");
    for idx in [2, 1] {
        for name in ["image_none00.json", "image_gaussian00.json"] {
            let p = dir.path().join("train").join(format!("{idx:05}")).join(name);
            write_json_atomic(&p, &per_image_file(1, default_categories())).unwrap();
        }
    }
    std::fs::write(dir.path().join("train").join("00001").join("notes.txt"), "x").unwrap();

    let merged = merge_split_dir(dir.path(), "train").unwrap().unwrap();
    assert_eq!(merged.images.len(), 4);
    let out = dir.path().join("train.json");
    assert!(out.is_file());
    let again = merge_split_dir(dir.path(), "train").unwrap().unwrap();
    assert_eq!(again, merged);

    assert!(merge_split_dir(dir.path(), "validation").unwrap().is_none());
    assert!(!dir.path().join("validation.json").exists());
}

#[test]
fn collected_files_are_sorted() {
    let dir = ScratchDir::new("merge_collect");
    for rel in ["b/2.json", "a/9.json", "a/10.json", "c.json"] {
        let p = dir.path().join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, "{}").unwrap();
    }
    let files = collect_annotation_files(dir.path(), Some(&dir.path().join("c.json"))).unwrap();
    let rel: Vec<String> = files
        .iter()
        .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(rel, vec!["a/10.json", "a/9.json", "b/2.json"]);
}
