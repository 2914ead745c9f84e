use std::io::Write;
use image::DynamicImage;
use yolo_vision::{DetectError, ModelConfig, ModelVersion, ResizeMode, YoloSession};

mod common;
use common::{output, StubEngine};

fn image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::new_rgb8(w, h)
}

#[test]
fn v5_output_is_filtered_mapped_and_suppressed() {
    // cx, cy, w, h, obj, cat, dog
    let engine = StubEngine::new(output(3, 7, vec![
        100., 100., 50., 50., 0.9, 0.1, 1.0,
        105., 100., 50., 50., 0.8, 0.0, 1.0,
        400., 400., 20., 20., 0.2, 1.0, 0.0,
    ]))
    .with_names(&["cat", "dog"]);

    let config = ModelConfig::new("stub.onnx");
    let mut session = YoloSession::with_engine(engine, &config).unwrap();
    assert_eq!(session.nc(), 2);

    let img = image(1280, 640);
    let detections = session.run(&img).unwrap();

    assert_eq!(session.engine().seen, vec![vec![1, 3, 640, 640]]);
    assert_eq!(detections.len(), 1);
    let det = &detections[0];
    assert_eq!(det.class_id, 1);
    assert_eq!(det.label.as_deref(), Some("dog"));
    assert!((det.confidence - 0.9).abs() < 1e-6);
    // x is stretched by 0.5, y is untouched
    assert_eq!(det.bbox.xy1_xy2(), (150., 75., 250., 125.));
    assert!(det.bbox.x2 <= img.width() as f32);
    assert_eq!(session.ts().runs(), 1);
}

#[test]
fn v8_layout_infers_class_count_from_output() {
    // (4 + nc, anchors) with two anchors and two classes
    let engine = StubEngine::new(output(6, 2, vec![
        320., 100.,
        320., 100.,
        64., 10.,
        64., 10.,
        0.05, 0.7,
        0.95, 0.1,
    ]))
    .with_output_dims(&[1, 6, -1]);

    let config = ModelConfig::new("stub.onnx").with_version(ModelVersion::YoloV8);
    let mut session = YoloSession::with_engine(engine, &config).unwrap();
    assert_eq!(session.nc(), 2);
    assert_eq!(session.names(), ["# 0", "# 1"]);

    let detections = session.run(&image(640, 640)).unwrap();
    assert_eq!(detections.len(), 2);
    assert_eq!(detections[0].class_id, 1);
    assert_eq!(detections[0].label.as_deref(), Some("# 1"));
    assert_eq!(detections[0].bbox.xy1_xy2(), (288., 288., 352., 352.));
    assert_eq!(detections[1].class_id, 0);
}

#[test]
fn static_model_input_overrides_configured_size() {
    let engine = StubEngine::new(output(0, 6, vec![]))
        .with_names(&["only"])
        .with_input_size(320, 256);
    let config = ModelConfig::new("stub.onnx").with_input_size(640);
    let mut session = YoloSession::with_engine(engine, &config).unwrap();
    assert_eq!((session.width(), session.height()), (320, 256));

    assert!(session.run(&image(100, 100)).unwrap().is_empty());
    assert_eq!(session.engine().seen, vec![vec![1, 3, 256, 320]]);
}

#[test]
fn letterbox_boxes_return_to_source_coordinates() {
    let engine = StubEngine::new(output(1, 6, vec![320., 320., 100., 100., 1.0, 0.9]))
        .with_names(&["thing"]);
    let config = ModelConfig::new("stub.onnx").with_resize_mode(ResizeMode::Letterbox);
    let mut session = YoloSession::with_engine(engine, &config).unwrap();

    // scale 0.5, 160 rows of padding on top
    let detections = session.run(&image(1280, 640)).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].bbox.xy1_xy2(), (540., 220., 740., 420.));
}

#[test]
fn run_many_keeps_image_order() {
    let engine = StubEngine::new(output(1, 6, vec![32., 32., 8., 8., 1.0, 0.9])).with_names(&["a"]);
    let config = ModelConfig::new("stub.onnx").with_input_size(64);
    let mut session = YoloSession::with_engine(engine, &config).unwrap();

    let results = session.run_many(&[image(64, 64), image(128, 64)]).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0][0].bbox.xy1_xy2(), (28., 28., 36., 36.));
    assert_eq!(results[1][0].bbox.xy1_xy2(), (56., 28., 72., 36.));
    assert_eq!(session.ts().runs(), 2);
}

#[test]
fn labels_file_must_agree_with_model_names() {
    let path = std::env::temp_dir().join(format!("yolo_vision_test_labels_{}.txt", std::process::id()));
    {
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "person\ncar\nbus").unwrap();
    }

    let mut config = ModelConfig::new("stub.onnx");
    config.labels_path = Some(path.to_string_lossy().to_string());

    let engine = StubEngine::new(output(0, 8, vec![])).with_names(&["a", "b"]);
    let err = YoloSession::with_engine(engine, &config).unwrap_err();
    assert!(matches!(err, DetectError::InvalidConfig(_)));

    let engine = StubEngine::new(output(0, 8, vec![]));
    let session = YoloSession::with_engine(engine, &config).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(session.names(), ["person", "car", "bus"]);
}

#[test]
fn unknown_class_count_is_a_config_error() {
    let engine = StubEngine::new(output(0, 6, vec![]));
    let config = ModelConfig::new("stub.onnx").with_version(ModelVersion::YoloV10);
    let err = YoloSession::with_engine(engine, &config).unwrap_err();
    assert!(matches!(err, DetectError::InvalidConfig(_)));
}

#[test]
fn invalid_thresholds_are_rejected_before_loading() {
    let engine = StubEngine::new(output(0, 6, vec![])).with_names(&["a"]);
    let config = ModelConfig::new("stub.onnx").with_thresholds(0.25, 1.2);
    let err = YoloSession::with_engine(engine, &config).unwrap_err();
    assert!(matches!(err, DetectError::InvalidConfig(_)));
}
