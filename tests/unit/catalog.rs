use super::*;

fn style(id: &str) -> HairStyle {
    HairStyle {
        id: HairStyleId::new(id),
        name: format!("style {id}"),
        description: None,
        category: "layered".to_owned(),
        image_url: format!("/styles/{id}.png"),
        tags: vec!["short".to_owned()],
        like_count: 0,
        is_active: true,
    }
}

#[test]
fn find_and_get() {
    let cat = MemoryCatalog::from_styles([style("a"), style("b")]);
    assert_eq!(cat.len(), 2);
    assert_eq!(cat.find(&HairStyleId::new("a")).unwrap().unwrap().name, "style a");
    assert!(cat.find(&HairStyleId::new("zzz")).unwrap().is_none());
    assert!(matches!(
        cat.get(&HairStyleId::new("zzz")),
        Err(SynthError::NotFound(_))
    ));
}

#[test]
fn manifest_uses_camel_case_and_defaults() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/catalog_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("styles.json");
    std::fs::write(
        &path,
        r#"[{"id":"bob-1","name":"Bob","imageUrl":"bob.png","likeCount":4}]"#,
    )
    .unwrap();

    let cat = MemoryCatalog::from_json_file(&path).unwrap();
    let s = cat.get(&HairStyleId::new("bob-1")).unwrap();
    assert_eq!(s.image_url, "bob.png");
    assert_eq!(s.like_count, 4);
    assert_eq!(s.category, "other");
    assert!(s.is_active);
    assert!(s.tags.is_empty());

    let json = serde_json::to_value(&s).unwrap();
    assert_eq!(json["imageUrl"], "bob.png");
    assert!(json.get("description").is_none());
}

#[test]
fn manifest_entries_need_an_image() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("target/catalog_unit");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.json");
    std::fs::write(&path, r#"[{"id":"x","name":"X","imageUrl":""}]"#).unwrap();
    assert!(MemoryCatalog::from_json_file(&path).is_err());
}
