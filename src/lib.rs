//! YOLO object detection on top of ONNX Runtime.
//!
//! An image is resized and normalized into an NCHW tensor, run through an
//! explicitly owned [`YoloSession`], and the raw model output is decoded into
//! [`Detection`]s: confidence filtering, mapping back to source pixels and
//! per-class non-maximum suppression.

mod utils;
mod error;
pub mod data;
pub mod detection_runners;
pub mod common;

pub use common::{BBox, Detection, ImageTransformInfo, InferenceDevice, ModelConfig, ModelVersion, ResizeMode};
pub use data::{RawPrediction, YoloPreds, X};
pub use detection_runners::{
    decode, preprocess, preprocess_batch, preprocess_with, Decoder, InferenceEngine, InferenceProcess, OrtEngine,
    YoloSession,
};
pub use error::DetectError;

pub type Result<T, E = DetectError> = std::result::Result<T, E>;
