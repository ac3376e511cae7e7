use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> ImageResource {
    let rgba = px.repeat((w * h) as usize);
    ImageResource::from_straight_rgba8(w, h, rgba).unwrap()
}

#[test]
fn from_straight_premultiplies_and_checks_len() {
    let r = ImageResource::from_straight_rgba8(1, 1, vec![200, 100, 0, 0]).unwrap();
    assert_eq!(r.rgba8_premul.as_slice(), &[0, 0, 0, 0]);

    assert!(ImageResource::from_straight_rgba8(2, 2, vec![0; 15]).is_err());
    assert!(ImageResource::from_straight_rgba8(0, 2, vec![]).is_err());
}

#[test]
fn newest_generation_wins() {
    let mut slot = ResourceSlot::default();
    let first = slot.begin_load();
    let second = slot.begin_load();
    assert!(slot.is_pending());

    assert!(!slot.complete(first, solid(1, 1, [1, 1, 1, 255])));
    assert!(slot.ready().is_none());

    assert!(slot.complete(second, solid(2, 2, [2, 2, 2, 255])));
    assert_eq!(slot.ready().unwrap().width, 2);
    assert!(!slot.is_pending());
}

#[test]
fn failed_load_keeps_previous_resource() {
    let mut slot = ResourceSlot::default();
    slot.install(solid(3, 3, [9, 9, 9, 255]));
    let g = slot.begin_load();
    assert!(slot.fail(g));
    assert_eq!(slot.ready().unwrap().width, 3);
    assert!(!slot.fail(g));
}

#[test]
fn install_supersedes_pending_load() {
    let mut slot = ResourceSlot::default();
    let g = slot.begin_load();
    slot.install(solid(4, 1, [0, 0, 0, 255]));
    assert!(!slot.complete(g, solid(1, 1, [0, 0, 0, 255])));
    assert_eq!(slot.ready().unwrap().width, 4);
}
