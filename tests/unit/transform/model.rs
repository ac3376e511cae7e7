use super::*;

fn limits() -> ScaleLimits {
    ScaleLimits::default()
}

#[test]
fn reset_is_identity_regardless_of_prior_state() {
    let t = OverlayTransform {
        position: Vec2::new(12.0, -40.0),
        scale: Vec2::new(2.5, 0.3),
        rotation: 91.0,
        opacity: 0.2,
    };
    assert_ne!(t, OverlayTransform::IDENTITY);
    let r = OverlayTransform::reset();
    assert_eq!(r.position, Vec2::ZERO);
    assert_eq!(r.scale, Vec2::new(1.0, 1.0));
    assert_eq!(r.rotation, 0.0);
    assert_eq!(r.opacity, 1.0);
    assert_eq!(OverlayTransform::default(), r);
}

#[test]
fn apply_is_pure() {
    let t = OverlayTransform::IDENTITY;
    let moved = t.apply(
        TransformDelta::Translate {
            by: Vec2::new(5.0, 6.0),
        },
        limits(),
    );
    assert_eq!(t, OverlayTransform::IDENTITY);
    assert_eq!(moved.position, Vec2::new(5.0, 6.0));
}

#[test]
fn scale_is_clamped_both_ways() {
    let big = OverlayTransform::IDENTITY.apply(
        TransformDelta::SetScale {
            to: Vec2::new(10.0, -4.0),
        },
        limits(),
    );
    assert_eq!(big.scale, Vec2::new(3.0, 0.1));

    let mut t = OverlayTransform::IDENTITY;
    for _ in 0..100 {
        t = t.apply(TransformDelta::ScaleUniform { step: -0.05 }, limits());
    }
    assert_eq!(t.scale, Vec2::new(0.1, 0.1));
}

#[test]
fn uniform_scale_uses_x_axis_as_base() {
    let t = OverlayTransform {
        scale: Vec2::new(1.0, 2.0),
        ..OverlayTransform::IDENTITY
    };
    let t = t.apply(TransformDelta::ScaleUniform { step: 0.5 }, limits());
    assert_eq!(t.scale, Vec2::new(1.5, 1.5));
}

#[test]
fn opacity_is_clamped() {
    let t = OverlayTransform::IDENTITY.apply(TransformDelta::SetOpacity { opacity: 1.7 }, limits());
    assert_eq!(t.opacity, 1.0);
    let t = t.apply(TransformDelta::SetOpacity { opacity: -0.3 }, limits());
    assert_eq!(t.opacity, 0.0);
}

#[test]
fn rotation_wraps_into_range() {
    assert_eq!(wrap_degrees(180.0), 180.0);
    assert_eq!(wrap_degrees(-180.0), -180.0);
    assert_eq!(wrap_degrees(190.0), -170.0);
    assert_eq!(wrap_degrees(-190.0), 170.0);
    assert_eq!(wrap_degrees(720.0 + 45.0), 45.0);

    let t = OverlayTransform::IDENTITY.apply(TransformDelta::RotateBy { degrees: 270.0 }, limits());
    assert_eq!(t.rotation, -90.0);
}

#[test]
fn non_finite_inputs_leave_fields_unchanged() {
    let t = OverlayTransform::IDENTITY
        .apply(TransformDelta::SetOpacity { opacity: f64::NAN }, limits())
        .apply(
            TransformDelta::Translate {
                by: Vec2::new(f64::INFINITY, 1.0),
            },
            limits(),
        )
        .apply(
            TransformDelta::SetRotation {
                degrees: f64::NAN,
            },
            limits(),
        );
    assert_eq!(t, OverlayTransform::IDENTITY);
}

#[test]
fn any_sequence_stays_within_ranges() {
    let deltas = [
        TransformDelta::ScaleUniform { step: 0.9 },
        TransformDelta::RotateBy { degrees: 359.0 },
        TransformDelta::SetOpacity { opacity: 3.0 },
        TransformDelta::SetScale {
            to: Vec2::new(0.0, 1e9),
        },
        TransformDelta::RotateBy { degrees: -1000.0 },
        TransformDelta::ScaleUniform { step: -7.0 },
        TransformDelta::SetOpacity { opacity: -1.0 },
        TransformDelta::Translate {
            by: Vec2::new(-3.0, 4.0),
        },
    ];
    let mut t = OverlayTransform::IDENTITY;
    for round in 0..50 {
        let d = deltas[round % deltas.len()];
        t = t.apply(d, limits());
        assert!(t.is_within(limits()), "round {round}: {t:?}");
    }
}

#[test]
fn sanitized_repairs_foreign_values() {
    let raw: OverlayTransform = serde_json::from_str(
        r#"{"position":{"x":1,"y":2},"scale":{"x":0,"y":9},"rotation":540,"opacity":2}"#,
    )
    .unwrap();
    let t = raw.sanitized(limits());
    assert_eq!(t.position, Vec2::new(1.0, 2.0));
    assert_eq!(t.scale, Vec2::new(0.1, 3.0));
    assert_eq!(t.rotation, -180.0);
    assert_eq!(t.opacity, 1.0);
}

#[test]
fn json_shape_matches_wire_format() {
    let v = serde_json::to_value(OverlayTransform::IDENTITY).unwrap();
    assert_eq!(
        v,
        serde_json::json!({
            "position": {"x": 0.0, "y": 0.0},
            "scale": {"x": 1.0, "y": 1.0},
            "rotation": 0.0,
            "opacity": 1.0
        })
    );
    let partial: OverlayTransform = serde_json::from_str(r#"{"rotation": 15}"#).unwrap();
    assert_eq!(partial.rotation, 15.0);
    assert_eq!(partial.scale, Vec2::new(1.0, 1.0));
}

#[test]
fn limits_validate() {
    assert!(ScaleLimits::new(0.0, 1.0).is_err());
    assert!(ScaleLimits::new(2.0, 1.0).is_err());
    assert!(ScaleLimits::new(0.5, f64::INFINITY).is_err());
    assert!(ScaleLimits::new(0.1, 3.0).is_ok());
}
