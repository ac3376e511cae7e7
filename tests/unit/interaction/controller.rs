use super::*;
use crate::foundation::core::{Canvas, Rect};

fn controller() -> InteractionController {
    InteractionController::new(
        CaptureRegion::for_canvas(Canvas::DEFAULT),
        0.05,
        ScaleLimits::default(),
    )
}

fn wheel_up() -> InputEvent {
    InputEvent::Wheel {
        at: Point::new(400.0, 300.0),
        delta_y: -100.0,
    }
}

#[test]
fn drag_moves_by_pointer_delta_then_stops_on_release() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;

    let r = c.handle(
        InputEvent::PointerDown {
            at: Point::new(100.0, 100.0),
        },
        &mut t,
        true,
    );
    assert_eq!(r.disposition, EventDisposition::Consumed);
    assert!(!r.changed);
    assert!(matches!(c.state(), DragState::Dragging { .. }));

    let r = c.handle(
        InputEvent::PointerMove {
            at: Point::new(130.0, 115.0),
        },
        &mut t,
        true,
    );
    assert!(r.changed);
    assert_eq!(t.position, Vec2::new(30.0, 15.0));
    assert_eq!(t.scale, Vec2::new(1.0, 1.0));

    c.handle(InputEvent::PointerUp, &mut t, true);
    assert_eq!(c.state(), DragState::Idle);

    let r = c.handle(
        InputEvent::PointerMove {
            at: Point::new(200.0, 200.0),
        },
        &mut t,
        true,
    );
    assert_eq!(r, Response::PASS);
    assert_eq!(t.position, Vec2::new(30.0, 15.0));
}

#[test]
fn drag_anchor_includes_existing_position() {
    let mut c = controller();
    let mut t = OverlayTransform {
        position: Vec2::new(-10.0, 5.0),
        ..OverlayTransform::IDENTITY
    };
    c.handle(
        InputEvent::PointerDown {
            at: Point::new(50.0, 50.0),
        },
        &mut t,
        true,
    );
    c.handle(
        InputEvent::PointerMove {
            at: Point::new(40.0, 70.0),
        },
        &mut t,
        true,
    );
    assert_eq!(t.position, Vec2::new(-20.0, 25.0));
}

#[test]
fn pointer_leave_and_leaving_surface_end_the_drag() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    let down = InputEvent::PointerDown {
        at: Point::new(10.0, 10.0),
    };

    c.handle(down, &mut t, true);
    c.handle(InputEvent::PointerLeave, &mut t, true);
    assert_eq!(c.state(), DragState::Idle);

    c.handle(down, &mut t, true);
    let r = c.handle(
        InputEvent::PointerMove {
            at: Point::new(900.0, 10.0),
        },
        &mut t,
        true,
    );
    assert!(!r.changed);
    assert_eq!(c.state(), DragState::Idle);
    assert_eq!(t.position, Vec2::ZERO);
}

#[test]
fn drag_requires_a_loaded_base() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    c.handle(
        InputEvent::PointerDown {
            at: Point::new(10.0, 10.0),
        },
        &mut t,
        false,
    );
    assert_eq!(c.state(), DragState::Idle);
}

#[test]
fn five_wheel_ups_scale_to_one_and_a_quarter() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    for _ in 0..5 {
        let r = c.handle(wheel_up(), &mut t, true);
        assert_eq!(r.disposition, EventDisposition::Consumed);
        assert!(r.changed);
    }
    assert!((t.scale.x - 1.25).abs() < 1e-9);
    assert!((t.scale.y - 1.25).abs() < 1e-9);
}

#[test]
fn wheel_clamps_at_limits() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    for _ in 0..100 {
        c.handle(wheel_up(), &mut t, true);
    }
    assert_eq!(t.scale, Vec2::new(3.0, 3.0));
    let r = c.handle(wheel_up(), &mut t, true);
    assert!(!r.changed);

    let down = InputEvent::Wheel {
        at: Point::new(400.0, 300.0),
        delta_y: 3.0,
    };
    for _ in 0..200 {
        c.handle(down, &mut t, true);
    }
    assert_eq!(t.scale, Vec2::new(0.1, 0.1));
}

#[test]
fn wheel_also_scales_while_dragging() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    c.handle(
        InputEvent::PointerDown {
            at: Point::new(10.0, 10.0),
        },
        &mut t,
        true,
    );
    c.handle(wheel_up(), &mut t, true);
    assert!((t.scale.x - 1.05).abs() < 1e-9);
    assert!(matches!(c.state(), DragState::Dragging { .. }));
}

#[test]
fn wheel_routing_follows_capture_bounds() {
    let region = CaptureRegion::new(
        Rect::new(0.0, 0.0, 1000.0, 800.0),
        Rect::new(100.0, 100.0, 900.0, 700.0),
        Canvas::DEFAULT,
    )
    .unwrap();
    let mut c = InteractionController::new(region, 0.05, ScaleLimits::default());
    let mut t = OverlayTransform::IDENTITY;

    let margin = c.handle(
        InputEvent::Wheel {
            at: Point::new(50.0, 50.0),
            delta_y: -1.0,
        },
        &mut t,
        true,
    );
    assert_eq!(margin, Response::CONSUMED);
    assert_eq!(t, OverlayTransform::IDENTITY);

    let outside = c.handle(
        InputEvent::Wheel {
            at: Point::new(1200.0, 50.0),
            delta_y: -1.0,
        },
        &mut t,
        true,
    );
    assert_eq!(outside, Response::PASS);
    assert_eq!(t, OverlayTransform::IDENTITY);
}

#[test]
fn wheel_without_base_is_swallowed_without_change() {
    let mut c = controller();
    let mut t = OverlayTransform::IDENTITY;
    let r = c.handle(wheel_up(), &mut t, false);
    assert_eq!(r, Response::CONSUMED);
    assert_eq!(t, OverlayTransform::IDENTITY);
}

#[test]
fn reset_keeps_drag_state() {
    let mut c = controller();
    let mut t = OverlayTransform {
        rotation: 45.0,
        opacity: 0.3,
        ..OverlayTransform::IDENTITY
    };
    c.handle(
        InputEvent::PointerDown {
            at: Point::new(10.0, 10.0),
        },
        &mut t,
        true,
    );
    assert!(c.reset(&mut t));
    assert_eq!(t, OverlayTransform::IDENTITY);
    assert!(matches!(c.state(), DragState::Dragging { .. }));
    assert!(!c.reset(&mut t));
}

#[test]
fn events_parse_from_json() {
    let events: Vec<InputEvent> = serde_json::from_str(
        r#"[
            {"type":"pointer_down","at":{"x":1.0,"y":2.0}},
            {"type":"wheel","at":{"x":1.0,"y":2.0},"delta_y":-1.0},
            {"type":"pointer_up"}
        ]"#,
    )
    .unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], InputEvent::PointerUp);
}
