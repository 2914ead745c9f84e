use std::time::{Duration, Instant};
use crate::common::ImageTransformInfo;
use crate::data::TimeCalc;
use crate::detection_runners::ort_detector::input_wrapper::X;
use crate::error::DetectError;
use crate::utils;

/// The inference boundary: a model that maps one prepared input tensor to
/// its raw output tensor.
pub trait InferenceEngine {
    fn run(&mut self, xs: X) -> Result<X, DetectError>;

    /// Static `(width, height)` of the model input, if the model fixes it.
    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }

    /// Declared output dimensions, `-1` for dynamic axes.
    fn output_dims(&self) -> Option<Vec<i64>> {
        None
    }

    /// Class names embedded in the model.
    fn class_names(&self) -> Option<Vec<String>> {
        None
    }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn run(&mut self, xs: X) -> Result<X, DetectError> {
        (**self).run(xs)
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        (**self).input_size()
    }

    fn output_dims(&self) -> Option<Vec<i64>> {
        (**self).output_dims()
    }

    fn class_names(&self) -> Option<Vec<String>> {
        (**self).class_names()
    }
}

pub trait InferenceProcess {
    type Input;
    type Output;

    /// Pre-process the input data.
    fn preprocess(&self, xs: &[Self::Input]) -> Result<(X, Vec<ImageTransformInfo>), DetectError>;

    /// Executes the model on the preprocessed data.
    fn inference(&mut self, xs: X) -> Result<X, DetectError>;

    /// Post-process the model's output.
    fn postprocess(&self, ys: X, transforms: &[ImageTransformInfo]) -> Result<Vec<Self::Output>, DetectError>;

    /// Stage timings, indexed preprocess / inference / postprocess.
    fn timings(&mut self) -> &mut TimeCalc;

    /// Executes the full pipeline, logging each stage at trace level.
    fn forward(&mut self, xs: &[Self::Input]) -> Result<Vec<Self::Output>, DetectError> {
        let detect_time = Instant::now();

        let (ys, transforms) = self.preprocess(xs)?;
        let t_pre = utils::trace("TIME", "Preprocessing input", detect_time, Duration::ZERO);

        let ys = self.inference(ys)?;
        let t_exe = utils::trace("TIME", "Detection run", detect_time, t_pre);

        let ys = self.postprocess(ys, &transforms)?;
        let t_post = utils::trace("TIME", "Postprocessing", detect_time, t_exe);

        let ts = self.timings();
        ts.add_or_push(0, t_pre);
        ts.add_or_push(1, t_exe - t_pre);
        ts.add_or_push(2, t_post - t_exe);
        ts.finish_run();
        log::debug!("Pipeline finished in {:.2?}", t_post);

        Ok(ys)
    }
}
