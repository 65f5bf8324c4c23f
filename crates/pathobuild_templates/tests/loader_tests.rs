//! Integration tests for loading build templates from disk.

use std::fs;
use std::path::Path;

use pathobuild_templates::{prepare_builds, TemplateError, TemplateLoader};
use tempfile::tempdir;

const FLU_YAML: &str = r#"
builds:
  - stem: "flu_{lineage}_{resolution}"
    lineage: [h3n2, h1n1pdm]
    resolution: [2y, 6y]
    fasta: "data/flu_{lineage}.fasta"
"#;

const INVALID_JSON: &str = r#"[{"stem": "zika" "virus": "zika"}]"#;

#[test]
fn test_load_yaml_file_and_expand() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("flu.yaml");
    fs::write(&path, FLU_YAML).unwrap();

    let templates = TemplateLoader::load_file(&path).unwrap();
    assert_eq!(templates.len(), 1);

    let builds = prepare_builds(&templates).unwrap();
    assert_eq!(
        builds.identifiers().collect::<Vec<_>>(),
        vec![
            "flu_h1n1pdm_2y",
            "flu_h1n1pdm_6y",
            "flu_h3n2_2y",
            "flu_h3n2_6y"
        ]
    );
    assert_eq!(
        builds.get("flu_h3n2_6y").unwrap().get_str("fasta"),
        Some("data/flu_h3n2.fasta")
    );
}

#[test]
fn test_load_dir_in_file_name_order() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("b_zika.yml"), "- stem: zika\n  virus: zika\n").unwrap();
    fs::write(temp.path().join("a_flu.yaml"), FLU_YAML).unwrap();
    fs::write(
        temp.path().join("c_ebola.toml"),
        "[[builds]]\nstem = \"ebola\"\n",
    )
    .unwrap();
    fs::write(temp.path().join("notes.txt"), "not a template").unwrap();

    let templates = TemplateLoader::load(temp.path()).unwrap();
    assert_eq!(templates.len(), 3);
    assert_eq!(templates[1].get("stem").and_then(|v| v.as_str()), Some("zika"));
    assert_eq!(templates[2].get("stem").and_then(|v| v.as_str()), Some("ebola"));
}

#[test]
fn test_unsupported_extension() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("builds.txt");
    fs::write(&path, "stem: zika").unwrap();

    let err = TemplateLoader::load_file(&path).unwrap_err();
    assert!(matches!(err, TemplateError::UnsupportedFormat(_)));
}

#[test]
fn test_invalid_json_is_reported() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("zika.json");
    fs::write(&path, INVALID_JSON).unwrap();

    let err = TemplateLoader::load_file(&path).unwrap_err();
    assert!(matches!(err, TemplateError::Json(_)));
}

#[test]
fn test_missing_file() {
    let err = TemplateLoader::load_file("/nonexistent/builds.yaml").unwrap_err();
    assert!(matches!(err, TemplateError::Io(_)));
}

#[test]
fn test_demo_builds_expand() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/builds.yaml");
    let templates = TemplateLoader::load_file(&path).unwrap();
    let builds = prepare_builds(&templates).unwrap();

    assert_eq!(builds.len(), 3 + 4 * 4);
    assert!(builds.collisions.is_empty());
    let build = builds.get("flu_vic_12y").unwrap();
    assert_eq!(build.get_str("virus"), Some("flu"));
    assert_eq!(
        build.get_str("description"),
        Some("Seasonal influenza vic over 12y")
    );
}
