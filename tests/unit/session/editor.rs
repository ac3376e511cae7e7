use std::io::Cursor;

use super::*;
use crate::foundation::core::Canvas;

fn small_config() -> EditorConfig {
    EditorConfig {
        canvas: Canvas::new(40, 30).unwrap(),
        worker_threads: 1,
        ..EditorConfig::default()
    }
}

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn new_session_is_idle_in_file_mode() {
    let mut s = EditorSession::new(small_config()).unwrap();
    assert_eq!(s.mode(), AcquisitionMode::File);
    assert_eq!(s.camera_status(), CameraStatus::Inactive);
    assert_eq!(s.transform(), OverlayTransform::IDENTITY);
    assert!(!s.is_image_ready());
    assert_eq!(s.pump(), 0);
    assert!(s.frame().is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let cfg = EditorConfig {
        worker_threads: 0,
        ..small_config()
    };
    assert!(EditorSession::new(cfg).is_err());
}

#[test]
fn adjustments_before_base_queue_a_render_but_draw_nothing() {
    let mut s = EditorSession::new(small_config()).unwrap();
    assert!(s.apply(TransformDelta::SetOpacity { opacity: 0.5 }));
    assert!(!s.apply(TransformDelta::SetOpacity { opacity: 0.5 }));
    assert!(s.render_pending());
    s.pump();
    assert!(s.frame().is_none());
    assert!(s.render_pending());
    assert_eq!(s.render_count(), 0);
}

#[test]
fn rejected_selection_changes_nothing_and_posts_a_notice() {
    let mut s = EditorSession::new(small_config()).unwrap();
    let err = s
        .accept_files(vec![FileSelection::new("a.txt", "text/plain", vec![1])])
        .unwrap_err();
    assert!(matches!(err, SynthError::InvalidInput(_)));
    assert!(matches!(
        s.take_notices().as_slice(),
        [Notice::Rejected { .. }]
    ));
    assert!(s.settle(Duration::from_secs(5)));
    assert!(!s.is_image_ready());
}

#[test]
fn undecodable_bytes_report_a_decode_failure() {
    let mut s = EditorSession::new(small_config()).unwrap();
    s.accept_files(vec![FileSelection::new("a.png", "image/png", vec![1, 2, 3])])
        .unwrap();
    assert!(s.settle(Duration::from_secs(5)));
    assert!(!s.is_image_ready());
    assert!(matches!(
        s.take_notices().as_slice(),
        [Notice::DecodeFailed {
            layer: Layer::Base,
            ..
        }]
    ));
}

#[test]
fn export_and_draft_need_a_base_and_a_style() {
    let mut s = EditorSession::new(small_config()).unwrap();
    assert!(s.export_png().is_err());

    s.accept_files(vec![FileSelection::new(
        "me.png",
        "image/png",
        png(4, 3, [255, 0, 0, 255]),
    )])
    .unwrap();
    assert!(s.settle(Duration::from_secs(5)));
    assert!(s.export_png().is_ok());
    assert!(s.draft().is_err());

    s.load_overlay(HairStyleId::new("bob"), png(2, 2, [0, 0, 255, 255]))
        .unwrap();
    assert!(s.settle(Duration::from_secs(5)));
    let draft = s.draft().unwrap();
    assert_eq!(draft.hair_style_id, HairStyleId::new("bob"));
    assert_eq!(&draft.composite_jpeg[..2], &[0xFF, 0xD8]);

    let req = draft.into_request(Visibility::Private);
    assert_eq!(req.composite.mime, "image/jpeg");
    assert_eq!(req.transform, Some(OverlayTransform::IDENTITY));
    assert_eq!(
        req.base_image,
        Some(Upload::new("image/png", png(4, 3, [255, 0, 0, 255])))
    );
}

#[test]
fn draft_keeps_the_last_successfully_decoded_base() {
    let mut s = EditorSession::new(small_config()).unwrap();
    s.load_overlay(HairStyleId::new("bob"), png(2, 2, [0, 0, 255, 255]))
        .unwrap();
    let first = png(4, 3, [0, 255, 0, 255]);
    s.accept_files(vec![FileSelection::new("a.png", "image/png", first.clone())])
        .unwrap();
    assert!(s.settle(Duration::from_secs(5)));

    s.accept_files(vec![FileSelection::new("b.png", "image/png", vec![1, 2, 3])])
        .unwrap();
    assert!(s.settle(Duration::from_secs(5)));
    assert!(matches!(
        s.take_notices().as_slice(),
        [Notice::DecodeFailed { .. }]
    ));
    let base = s.draft().unwrap().base_image.unwrap();
    assert_eq!(base.bytes, first);

    let second = png(5, 5, [9, 9, 9, 255]);
    s.accept_files(vec![FileSelection::new("c.png", "image/png", second.clone())])
        .unwrap();
    assert!(s.settle(Duration::from_secs(5)));
    assert_eq!(s.draft().unwrap().base_image.unwrap().bytes, second);
}

#[test]
fn camera_commands_need_camera_mode() {
    let mut s = EditorSession::new(small_config()).unwrap();
    assert!(s.start_camera().is_err());
    assert!(s.capture().is_err());

    s.select_mode(AcquisitionMode::Camera);
    assert_eq!(s.camera_status(), CameraStatus::Stopped);
    let err = s.start_camera().unwrap_err();
    assert!(matches!(
        err,
        SynthError::DeviceUnavailable(DeviceFailure::NotFound)
    ));
    assert!(s.accept_files(Vec::new()).is_err());
}

#[test]
fn close_cancels_background_work() {
    let s = EditorSession::new(small_config()).unwrap();
    let token = s.cancel_token();
    assert!(!token.is_cancelled());
    s.close();
    assert!(token.is_cancelled());
}
