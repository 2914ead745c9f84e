//! Options for building an ONNX Runtime engine.

use crate::common::{InferenceDevice, ModelConfig};

#[derive(Debug, Clone)]
pub struct ConfigOrt {
    pub onnx_path: String,
    pub ort_lib_path: Option<String>,
    pub device: InferenceDevice,
    pub num_threads: Option<usize>,
    pub profile: bool,

    // trt related
    pub trt_engine_cache_enable: bool,
    pub trt_fp16_enable: bool,
}

impl Default for ConfigOrt {
    fn default() -> Self {
        Self {
            onnx_path: String::new(),
            ort_lib_path: None,
            device: InferenceDevice::CPU,
            num_threads: None,
            profile: false,

            trt_engine_cache_enable: true,
            trt_fp16_enable: false,
        }
    }
}

impl From<&ModelConfig> for ConfigOrt {
    fn from(config: &ModelConfig) -> Self {
        let ort = Self::new()
            .with_model(&config.weights_path)
            .with_ort_lib_path(config.ort_lib_path.as_deref())
            .with_device(config.inference_device)
            .with_trt_fp16(config.trt_fp16)
            .with_profile(config.profile);
        match config.num_threads {
            Some(n) => ort.with_num_threads(n),
            None => ort,
        }
    }
}

impl ConfigOrt {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_model(mut self, onnx_path: &str) -> Self {
        self.onnx_path = onnx_path.to_string();
        self
    }

    pub fn with_ort_lib_path(mut self, ort_lib_path: Option<&str>) -> Self {
        self.ort_lib_path = ort_lib_path.map(str::to_string);
        self
    }

    pub fn with_device(mut self, device_type: InferenceDevice) -> Self {
        self.device = device_type;
        self
    }

    pub fn with_num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    pub fn with_trt_fp16(mut self, x: bool) -> Self {
        self.trt_fp16_enable = x;
        self
    }

    pub fn with_profile(mut self, profile: bool) -> Self {
        self.profile = profile;
        self
    }
}
