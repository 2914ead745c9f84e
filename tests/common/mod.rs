#![allow(dead_code)]

use ndarray::ArrayD;
use yolo_vision::{DetectError, InferenceEngine, X};

/// Engine that replays a fixed output and records the input shapes it saw.
#[derive(Debug, Default)]
pub struct StubEngine {
    pub output: ArrayD<f32>,
    pub names: Option<Vec<String>>,
    pub input_size: Option<(u32, u32)>,
    pub output_dims: Option<Vec<i64>>,
    pub seen: Vec<Vec<usize>>,
}

impl StubEngine {
    pub fn new(output: ArrayD<f32>) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_input_size(mut self, w: u32, h: u32) -> Self {
        self.input_size = Some((w, h));
        self
    }

    pub fn with_output_dims(mut self, dims: &[i64]) -> Self {
        self.output_dims = Some(dims.to_vec());
        self
    }
}

impl InferenceEngine for StubEngine {
    fn run(&mut self, xs: X) -> Result<X, DetectError> {
        self.seen.push(xs.shape().to_vec());
        Ok(X::from(self.output.clone()))
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.input_size
    }

    fn output_dims(&self) -> Option<Vec<i64>> {
        self.output_dims.clone()
    }

    fn class_names(&self) -> Option<Vec<String>> {
        self.names.clone()
    }
}

/// `(1, rows, cols)` tensor from row-major values.
pub fn output(rows: usize, cols: usize, values: Vec<f32>) -> ArrayD<f32> {
    ndarray::Array3::from_shape_vec((1, rows, cols), values)
        .unwrap()
        .into_dyn()
}
