use super::*;

#[test]
fn canvas_rejects_empty_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(
        Canvas::new(800, 600).unwrap(),
        Canvas {
            width: 800,
            height: 600
        }
    );
}

#[test]
fn canvas_center_and_len() {
    let c = Canvas::DEFAULT;
    assert_eq!(c.center(), Point::new(400.0, 300.0));
    assert_eq!(c.rgba_len(), 800 * 600 * 4);
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 800.0, 600.0));
}
