use super::*;

#[test]
fn defaults_match_reference_editor() {
    let cfg = EditorConfig::default();
    assert_eq!(cfg.canvas, Canvas::new(800, 600).unwrap());
    assert_eq!(cfg.scale_limits.min, 0.1);
    assert_eq!(cfg.scale_limits.max, 3.0);
    assert_eq!(cfg.wheel_step, 0.05);
    assert_eq!(cfg.jpeg_quality, 80);
    assert_eq!(cfg.max_upload_bytes, 5 * 1024 * 1024);
    cfg.validate().unwrap();
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let cfg: EditorConfig = serde_json::from_str(r#"{ "wheel_step": 0.1 }"#).unwrap();
    assert_eq!(cfg.wheel_step, 0.1);
    assert_eq!(cfg.canvas, Canvas::DEFAULT);
}

#[test]
fn unknown_fields_are_rejected() {
    let res: Result<EditorConfig, _> = serde_json::from_str(r#"{ "wheel": 0.1 }"#);
    assert!(res.is_err());
}

#[test]
fn validate_rejects_bad_values() {
    let cfg = EditorConfig {
        wheel_step: 0.0,
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = EditorConfig {
        jpeg_quality: 0,
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = EditorConfig {
        worker_threads: 0,
        ..EditorConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn from_json_file_reads_overrides() {
    let dir = std::path::PathBuf::from("target").join("config_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("editor.json");
    std::fs::write(&path, r#"{ "canvas": { "width": 320, "height": 240 } }"#).unwrap();

    let cfg = EditorConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.canvas, Canvas::new(320, 240).unwrap());
    assert!(EditorConfig::from_json_file(&dir.join("missing.json")).is_err());
}
