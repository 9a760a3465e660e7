//! Integration tests for the detector adapter and annotation rendering.
//!
//! Tests cover:
//! - Threshold validation and the empty-vocabulary short circuit
//! - Confidence filtering and class-name resolution
//! - Drawing boxes and the base64 JPEG payload
//! - Falling back to the source image on malformed boxes

mod common;

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{GenericImageView, Rgb, RgbImage};

use common::*;
use vocab_detect::render::label_text;

fn detector_with(classes: &[&str]) -> (Detector, Arc<FakeEngine>) {
    let engine = Arc::new(FakeEngine::new("yolov8s-world.pt"));
    let detector = Detector::new(engine.clone());
    let classes: Vec<String> = classes.iter().map(|c| c.to_string()).collect();
    detector.set_classes(&classes).expect("fake engine accepts classes");
    (detector, engine)
}

#[test]
fn test_threshold_out_of_range_is_rejected() {
    let (detector, engine) = detector_with(&["person"]);
    let image = create_test_image();

    for bad in [-0.1f32, 1.5, f32::NAN] {
        match detector.predict(image.path(), bad) {
            Err(Error::ConfidenceOutOfRange(_)) => {}
            other => panic!("expected ConfidenceOutOfRange for {}, got {:?}", bad, other),
        }
    }
    assert_eq!(engine.predict_calls(), 0);
}

#[test]
fn test_threshold_bounds_are_inclusive() -> anyhow::Result<()> {
    let (detector, _engine) = detector_with(&["person"]);
    let image = create_test_image();
    assert!(matches!(detector.predict(image.path(), 0.0)?, Prediction::Detections(_)));
    assert!(matches!(detector.predict(image.path(), 1.0)?, Prediction::Detections(_)));
    Ok(())
}

#[test]
fn test_empty_vocabulary_short_circuits() -> anyhow::Result<()> {
    let (detector, engine) = detector_with(&[]);
    engine.script(vec![raw(0, 0.9, [0.0, 0.0, 10.0, 10.0])]);
    let image = create_test_image();

    assert_eq!(detector.predict(image.path(), 0.25)?, Prediction::NoClasses);
    assert_eq!(engine.predict_calls(), 0);
    Ok(())
}

#[test]
fn test_filters_by_confidence_and_resolves_names() -> anyhow::Result<()> {
    let (detector, engine) = detector_with(&["person", "car"]);
    engine.script(vec![
        raw(0, 0.91, [10.0, 10.0, 50.0, 80.0]),
        raw(1, 0.40, [60.0, 20.0, 90.0, 40.0]),
        raw(1, 0.10, [0.0, 0.0, 5.0, 5.0]),
        // Index outside the vocabulary is dropped
        raw(5, 0.99, [0.0, 0.0, 5.0, 5.0]),
    ]);
    let image = create_test_image();

    let Prediction::Detections(found) = detector.predict(image.path(), 0.4)? else {
        panic!("expected detections");
    };
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].class_name, "person");
    assert_eq!(found[0].bbox, [10.0, 10.0, 50.0, 80.0]);
    assert_eq!(found[1].class_name, "car");
    assert!(found.iter().all(|d| d.confidence >= 0.4));
    Ok(())
}

#[test]
fn test_detection_serializes_class_field() -> anyhow::Result<()> {
    let det = Detection { class_name: "person".into(), confidence: 0.5, bbox: [1.0, 2.0, 3.0, 4.0] };
    let value = serde_json::to_value(&det)?;
    assert_eq!(value["class"], "person");
    assert_eq!(value["bbox"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    assert!(value.get("class_name").is_none());
    Ok(())
}

#[test]
fn test_load_weights_keeps_vocabulary() -> anyhow::Result<()> {
    let (detector, _engine) = detector_with(&["person"]);
    let weights = tempfile::Builder::new().suffix(".pt").tempfile()?;

    detector.load_weights(weights.path())?;
    assert_eq!(detector.weights(), weights.path());
    assert_eq!(detector.classes(), vec!["person"]);

    assert!(detector.load_weights(std::path::Path::new("/no/such/best.pt")).is_err());
    assert_eq!(detector.weights(), weights.path());
    Ok(())
}

#[test]
fn test_label_text_rounds_to_percent() {
    let det = Detection { class_name: "dog".into(), confidence: 0.876, bbox: [0.0, 0.0, 1.0, 1.0] };
    assert_eq!(label_text(&det), "dog 88%");
}

#[test]
fn test_draw_marks_box_outline() -> anyhow::Result<()> {
    let renderer = AnnotationRenderer::without_font();
    let source = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
    let det = Detection { class_name: "person".into(), confidence: 0.9, bbox: [50.0, 80.0, 150.0, 180.0] };

    let canvas = renderer.draw(&source, &[det])?;
    assert_eq!(canvas.dimensions(), (200, 200));
    // Left edge of the box is painted, its interior is not
    assert_ne!(*canvas.get_pixel(50, 130), Rgb([0, 0, 0]));
    assert_eq!(*canvas.get_pixel(100, 130), Rgb([0, 0, 0]));
    // Source is untouched
    assert_eq!(*source.get_pixel(50, 130), Rgb([0, 0, 0]));
    Ok(())
}

#[test]
fn test_draw_rejects_malformed_box() {
    let renderer = AnnotationRenderer::without_font();
    let source = RgbImage::from_pixel(50, 50, Rgb([0, 0, 0]));
    let inverted = Detection { class_name: "x".into(), confidence: 0.9, bbox: [40.0, 10.0, 10.0, 40.0] };
    assert!(matches!(renderer.draw(&source, &[inverted]), Err(Error::Render(_))));
}

#[test]
fn test_render_returns_decodable_jpeg() -> anyhow::Result<()> {
    let renderer = AnnotationRenderer::without_font();
    let source = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([10, 200, 10])));
    let det = Detection { class_name: "leaf".into(), confidence: 0.7, bbox: [5.0, 5.0, 30.0, 30.0] };

    let encoded = renderer.render(&source, &[det])?;
    let bytes = STANDARD.decode(encoded)?;
    assert_eq!(image::guess_format(&bytes)?, image::ImageFormat::Jpeg);
    assert_eq!(image::load_from_memory(&bytes)?.dimensions(), (64, 48));
    Ok(())
}

#[test]
fn test_render_falls_back_on_malformed_box() -> anyhow::Result<()> {
    let renderer = AnnotationRenderer::without_font();
    let source = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([0, 0, 0])));
    let bad = Detection { class_name: "x".into(), confidence: 0.9, bbox: [f32::NAN, 0.0, 10.0, 10.0] };

    let fallback = renderer.render(&source, &[bad])?;
    let plain = renderer.render(&source, &[])?;
    assert_eq!(fallback, plain);
    Ok(())
}

#[test]
fn test_huge_coordinates_do_not_panic() -> anyhow::Result<()> {
    let renderer = AnnotationRenderer::without_font();
    let source = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
    let wide = Detection { class_name: "beam".into(), confidence: 0.9, bbox: [-3.0e9, 0.0, 3.0e9, 10.0] };
    let tall = Detection { class_name: "pole".into(), confidence: 0.9, bbox: [5.0, -3.0e9, 15.0, 3.0e9] };

    let canvas = renderer.draw(&source, &[wide.clone(), tall.clone()])?;
    assert_eq!(canvas.dimensions(), (40, 40));
    // The wide box is drawn across the canvas instead of being dropped
    assert_ne!(*canvas.get_pixel(30, 9), Rgb([0, 0, 0]));

    let encoded = renderer.render(&image::DynamicImage::ImageRgb8(source), &[wide, tall])?;
    let bytes = STANDARD.decode(encoded)?;
    assert_eq!(image::load_from_memory(&bytes)?.dimensions(), (40, 40));
    Ok(())
}
