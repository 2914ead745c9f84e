use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::common::inference_device::InferenceDevice;
use crate::common::model_version::ModelVersion;
use crate::common::ResizeMode;
use crate::error::DetectError;

pub const DEFAULT_CONF_THRESHOLD: f32 = 0.25;
pub const DEFAULT_NMS_THRESHOLD: f32 = 0.45;
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Everything needed to build a [`crate::YoloSession`] and run it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub weights_path: String,
    /// Path to `libonnxruntime`. When absent the library is resolved by the
    /// dynamic loader (`ORT_DYLIB_PATH` or the system search path).
    pub ort_lib_path: Option<String>,
    /// Plain text file, one class name per line.
    pub labels_path: Option<String>,
    pub inference_device: InferenceDevice,
    pub model_version: ModelVersion,
    pub conf_threshold: f32,
    pub nms_threshold: f32,
    pub input_size: u32,
    pub resize_mode: ResizeMode,
    /// Number of classes, used when neither labels nor model metadata name them.
    pub nc: Option<usize>,
    pub retain_classes: Vec<usize>,
    pub exclude_classes: Vec<usize>,
    /// Half precision for TensorRT engines.
    pub trt_fp16: bool,
    /// Intra-op threads; ONNX Runtime picks when absent.
    pub num_threads: Option<usize>,
    /// Log per-stage engine timings after every run.
    pub profile: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: String::new(),
            ort_lib_path: None,
            labels_path: None,
            inference_device: InferenceDevice::CPU,
            model_version: ModelVersion::YoloV5,
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            input_size: DEFAULT_INPUT_SIZE,
            resize_mode: ResizeMode::FitExact,
            nc: None,
            retain_classes: vec![],
            exclude_classes: vec![],
            trt_fp16: true,
            num_threads: None,
            profile: false,
        }
    }
}

impl ModelConfig {
    pub fn new(weights_path: &str) -> Self {
        Self {
            weights_path: weights_path.to_string(),
            ..Default::default()
        }
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DetectError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        let config: ModelConfig = serde_json::from_str(&raw)
            .map_err(|e| DetectError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects thresholds outside `[0, 1]` and zero sizes or counts.
    pub fn validate(&self) -> Result<(), DetectError> {
        check_unit_range("conf_threshold", self.conf_threshold)?;
        check_unit_range("nms_threshold", self.nms_threshold)?;
        if self.input_size == 0 {
            return Err(DetectError::InvalidConfig("input_size must be positive".to_string()));
        }
        if self.nc == Some(0) {
            return Err(DetectError::InvalidConfig("nc must be positive".to_string()));
        }
        if self.num_threads == Some(0) {
            return Err(DetectError::InvalidConfig("num_threads must be positive".to_string()));
        }
        Ok(())
    }

    pub fn with_device(mut self, device: InferenceDevice) -> Self {
        self.inference_device = device;
        self
    }

    pub fn with_version(mut self, version: ModelVersion) -> Self {
        self.model_version = version;
        self
    }

    pub fn with_thresholds(mut self, conf: f32, nms: f32) -> Self {
        self.conf_threshold = conf;
        self.nms_threshold = nms;
        self
    }

    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size;
        self
    }

    pub fn with_class_filters(mut self, retain: &[usize], exclude: &[usize]) -> Self {
        self.retain_classes = retain.to_vec();
        self.exclude_classes = exclude.to_vec();
        self
    }

    pub fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    pub fn summary(&self) -> String {
        format!("Weights File Path: {}\n\
        Labels Path: {}\n\
        OnnxRuntime Lib Path: {}\n\
        Inference Device: {}\n\
        Model Version: {}\n\
        Model Input Resolution: {}x{} ({:?})\n\
        Detection Threshold: {} | NMS Threshold: {}",
                self.weights_path,
                self.labels_path.as_deref().unwrap_or("-"),
                self.ort_lib_path.as_deref().unwrap_or("-"),
                self.inference_device, self.model_version.name(),
                self.input_size, self.input_size, self.resize_mode,
                self.conf_threshold, self.nms_threshold)
    }
}

fn check_unit_range(name: &str, value: f32) -> Result<(), DetectError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DetectError::InvalidConfig(format!("{} must be in [0, 1], got {}", name, value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_standard_yolo_values() {
        let config = ModelConfig::default();
        assert_eq!(config.conf_threshold, 0.25);
        assert_eq!(config.nms_threshold, 0.45);
        assert_eq!(config.input_size, 640);
        assert!(config.trt_fp16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let config = ModelConfig::default().with_thresholds(1.5, 0.45);
        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));

        let config = ModelConfig::default().with_thresholds(0.25, -0.1);
        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));

        let config = ModelConfig::default().with_thresholds(f32::NAN, 0.45);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ModelConfig = serde_json::from_str(
            r#"{ "weights_path": "yolov5s.onnx", "model_version": "yolov8", "resize_mode": "letterbox", "inference_device": { "CUDA": 1 } }"#,
        ).unwrap();
        assert_eq!(config.weights_path, "yolov5s.onnx");
        assert_eq!(config.model_version, ModelVersion::YoloV8);
        assert_eq!(config.resize_mode, ResizeMode::Letterbox);
        assert_eq!(config.inference_device, InferenceDevice::CUDA(1));
        assert_eq!(config.nms_threshold, DEFAULT_NMS_THRESHOLD);
    }

    #[test]
    fn rejects_zero_counts() {
        let mut config = ModelConfig::default();
        config.nc = Some(0);
        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));

        let mut config = ModelConfig::default();
        config.num_threads = Some(0);
        assert!(matches!(config.validate(), Err(DetectError::InvalidConfig(_))));
    }
}
