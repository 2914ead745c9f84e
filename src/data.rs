mod config_ort;
mod raw_prediction;
mod time_calc;
mod yolo_types;

pub use config_ort::ConfigOrt;
pub use raw_prediction::RawPrediction;
pub use time_calc::TimeCalc;
pub use yolo_types::*;

pub use crate::detection_runners::ort_detector::input_wrapper::X;
