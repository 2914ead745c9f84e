pub mod inference_process;
pub mod ort_detector;

pub use inference_process::*;
pub use ort_detector::*;
