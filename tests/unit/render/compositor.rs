use super::*;
use crate::foundation::core::Vec2;

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn solid(w: u32, h: u32, px: [u8; 4]) -> ImageResource {
    ImageResource::from_straight_rgba8(w, h, px.repeat((w * h) as usize)).unwrap()
}

fn small() -> Compositor {
    Compositor::new(Canvas::new(80, 60).unwrap(), Some(WHITE)).unwrap()
}

fn is_red(px: [u8; 4]) -> bool {
    px[0] > 245 && px[1] < 10 && px[2] < 10 && px[3] == 255
}

fn is_blue(px: [u8; 4]) -> bool {
    px[0] < 10 && px[1] < 10 && px[2] > 245 && px[3] == 255
}

#[test]
fn empty_render_is_clear_color() {
    let mut c = small();
    let f = c.render(None, None, &OverlayTransform::IDENTITY);
    assert_eq!(f.width, 80);
    assert_eq!(f.height, 60);
    assert!(f.premultiplied);
    assert_eq!(f.pixel(0, 0), Some(WHITE));
    assert_eq!(f.pixel(79, 59), Some(WHITE));
}

#[test]
fn transparent_clear_when_unset() {
    let mut c = Compositor::new(Canvas::new(8, 8).unwrap(), None).unwrap();
    let f = c.render(None, None, &OverlayTransform::IDENTITY);
    assert!(f.data.iter().all(|&b| b == 0));
}

#[test]
fn base_only_fills_and_omits_overlay() {
    let mut c = small();
    let base = solid(4, 3, [255, 0, 0, 255]);
    let f = c.render(Some(&base), None, &OverlayTransform::IDENTITY);
    assert!(is_red(f.pixel(40, 30).unwrap()));
    assert!(is_red(f.pixel(5, 5).unwrap()));
}

#[test]
fn wide_base_is_letterboxed() {
    let mut c = small();
    let base = solid(2, 1, [255, 0, 0, 255]);
    let f = c.render(Some(&base), None, &OverlayTransform::IDENTITY);
    assert_eq!(f.pixel(40, 3), Some(WHITE));
    assert_eq!(f.pixel(40, 56), Some(WHITE));
    assert!(is_red(f.pixel(40, 30).unwrap()));
}

#[test]
fn overlay_is_centered_and_follows_position() {
    let mut c = small();
    let base = solid(4, 3, [255, 0, 0, 255]);
    let overlay = solid(10, 10, [0, 0, 255, 255]);

    let f = c.render(Some(&base), Some(&overlay), &OverlayTransform::IDENTITY);
    assert!(is_blue(f.pixel(40, 30).unwrap()));
    assert!(is_red(f.pixel(20, 30).unwrap()));

    let moved = OverlayTransform {
        position: Vec2::new(20.0, 0.0),
        ..OverlayTransform::IDENTITY
    };
    let f = c.render(Some(&base), Some(&overlay), &moved);
    assert!(is_blue(f.pixel(60, 30).unwrap()));
    assert!(is_red(f.pixel(40, 30).unwrap()));
}

#[test]
fn overlay_scale_grows_footprint() {
    let mut c = small();
    let base = solid(4, 3, [255, 0, 0, 255]);
    let overlay = solid(10, 10, [0, 0, 255, 255]);
    let scaled = OverlayTransform {
        scale: Vec2::new(3.0, 1.0),
        ..OverlayTransform::IDENTITY
    };
    let f = c.render(Some(&base), Some(&overlay), &scaled);
    assert!(is_blue(f.pixel(52, 30).unwrap()));
    assert!(is_red(f.pixel(40, 40).unwrap()));
}

#[test]
fn opacity_blends_overlay_with_base() {
    let mut c = small();
    let base = solid(4, 3, [255, 0, 0, 255]);
    let overlay = solid(10, 10, [0, 0, 255, 255]);
    let half = OverlayTransform {
        opacity: 0.5,
        ..OverlayTransform::IDENTITY
    };
    let px = c.render(Some(&base), Some(&overlay), &half).pixel(40, 30).unwrap();
    assert!((100..=160).contains(&px[0]), "{px:?}");
    assert!((100..=160).contains(&px[2]), "{px:?}");
    assert_eq!(px[3], 255);

    let invisible = OverlayTransform {
        opacity: 0.0,
        ..OverlayTransform::IDENTITY
    };
    let hidden = c.render(Some(&base), Some(&overlay), &invisible);
    let base_only = c.render(Some(&base), None, &OverlayTransform::IDENTITY);
    assert_eq!(hidden, base_only);
}

#[test]
fn render_is_idempotent_and_does_not_accumulate() {
    let mut c = small();
    let base = solid(4, 3, [255, 0, 0, 255]);
    let overlay = solid(10, 10, [0, 0, 255, 128]);
    let a = OverlayTransform {
        rotation: 30.0,
        opacity: 0.7,
        ..OverlayTransform::IDENTITY
    };
    let b = OverlayTransform {
        position: Vec2::new(-15.0, 8.0),
        ..OverlayTransform::IDENTITY
    };

    let first = c.render(Some(&base), Some(&overlay), &a);
    let again = c.render(Some(&base), Some(&overlay), &a);
    assert_eq!(first, again);

    let _ = c.render(Some(&base), Some(&overlay), &b);
    let back = c.render(Some(&base), Some(&overlay), &a);
    assert_eq!(first, back);

    let mut fresh = small();
    assert_eq!(fresh.render(Some(&base), Some(&overlay), &a), first);
}

#[test]
fn oversized_canvas_is_rejected() {
    assert!(
        Compositor::new(
            Canvas {
                width: 70_000,
                height: 10
            },
            None
        )
        .is_err()
    );
}
