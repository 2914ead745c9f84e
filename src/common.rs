mod annotate;
mod det_box;
mod detection;
mod image_transform;
mod inference_device;
mod model_config;
mod model_version;

pub use annotate::*;
pub use det_box::*;
pub use detection::*;
pub use image_transform::*;
pub use inference_device::*;
pub use model_config::*;
pub use model_version::*;
