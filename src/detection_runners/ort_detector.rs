mod ort_engine;
mod ort_inference;
pub mod decoder;
pub mod image_ops;
pub mod input_wrapper;
pub mod nms;

pub use decoder::{decode, Decoder};
pub use image_ops::{preprocess, preprocess_batch, preprocess_with};
pub use ort_engine::*;
pub use ort_inference::*;
