use image::DynamicImage;

use crate::common::{Detection, ImageTransformInfo, ModelConfig, ModelVersion, ResizeMode};
use crate::data::{ConfigOrt, TimeCalc, YoloPreds};
use crate::detection_runners::inference_process::{InferenceEngine, InferenceProcess};
use crate::detection_runners::ort_detector::decoder::Decoder;
use crate::detection_runners::ort_detector::image_ops::preprocess_batch;
use crate::detection_runners::ort_detector::input_wrapper::X;
use crate::detection_runners::ort_detector::OrtEngine;
use crate::error::DetectError;
use crate::utils;

/// An owned detection pipeline: engine, class names, output layout and
/// thresholds. Nothing is shared between sessions.
#[derive(Debug)]
pub struct YoloSession<E: InferenceEngine = OrtEngine> {
    engine: E,
    decoder: Decoder,
    layout: YoloPreds,
    version: ModelVersion,
    nc: usize,
    width: u32,
    height: u32,
    resize_mode: ResizeMode,
    ts: TimeCalc,
}

impl YoloSession<OrtEngine> {
    /// Loads the model described by `config` into ONNX Runtime.
    pub fn new(config: &ModelConfig) -> Result<Self, DetectError> {
        config.validate()?;
        log::info!("Initializing ORT session with ({}) execution provider", config.inference_device);
        let engine = OrtEngine::new(&ConfigOrt::from(config))
            .map_err(|e| DetectError::model_load(format!("{e:#}")))?;
        if engine.device() != &config.inference_device {
            log::warn!("Requested {}, running on {}", config.inference_device, engine.device());
        }
        Self::with_engine(engine, config)
    }
}

impl<E: InferenceEngine> YoloSession<E> {
    /// Builds a session around an already loaded engine.
    pub fn with_engine(engine: E, config: &ModelConfig) -> Result<Self, DetectError> {
        config.validate()?;

        let version = config.model_version;
        let layout = version.layout();

        // Class names: user-defined.or(parsed)
        let names_user = match &config.labels_path {
            Some(path) => Some(utils::file_to_vec(path).map_err(|e| {
                DetectError::InvalidConfig(format!("cannot read labels file {path}: {e}"))
            })?),
            None => None,
        };
        let names_parsed = engine.class_names().filter(|names| !names.is_empty());
        let names = match (names_user, names_parsed) {
            (Some(names), Some(parsed)) => {
                if names.len() != parsed.len() {
                    return Err(DetectError::InvalidConfig(format!(
                        "The lengths of parsed class names: {} and user-defined class names: {} do not match.",
                        parsed.len(),
                        names.len(),
                    )));
                }
                Some(names)
            }
            (names, parsed) => names.or(parsed),
        };

        // nc: names.len().or(config.nc).or(output shape)
        let nc = match &names {
            Some(names) => names.len(),
            None => match config
                .nc
                .or_else(|| engine.output_dims().and_then(|dims| layout.infer_nc(&dims)))
            {
                Some(nc) => nc,
                None => {
                    return Err(DetectError::InvalidConfig(
                        "Unable to obtain the number of classes. Provide a labels file or set `nc`.".to_string(),
                    ))
                }
            },
        };
        let names = names.unwrap_or_else(|| n2s(nc));

        let (width, height) = match engine.input_size() {
            Some((w, h)) => {
                if (w, h) != (config.input_size, config.input_size) {
                    log::info!(
                        "Model input is fixed at {}x{}, ignoring configured size {}",
                        w, h, config.input_size
                    );
                }
                (w, h)
            }
            None => (config.input_size, config.input_size),
        };

        let decoder = Decoder::from(config).with_names(names);

        log::info!("YOLO Version: {} | Classes: {} | Input: {}x{}", version.name(), nc, width, height);

        Ok(Self {
            engine,
            decoder,
            layout,
            version,
            nc,
            width,
            height,
            resize_mode: config.resize_mode,
            ts: TimeCalc::default(),
        })
    }

    /// Detects objects in one image.
    pub fn run(&mut self, image: &DynamicImage) -> Result<Vec<Detection>, DetectError> {
        let mut ys = self.forward(std::slice::from_ref(image))?;
        ys.pop().ok_or_else(|| DetectError::InvalidOutputShape("model returned no batch".to_string()))
    }

    /// Runs each image through the session in turn.
    pub fn run_many(&mut self, images: &[DynamicImage]) -> Result<Vec<Vec<Detection>>, DetectError> {
        images.iter().map(|image| self.run(image)).collect()
    }

    pub fn names(&self) -> &[String] {
        &self.decoder.names
    }

    pub fn nc(&self) -> usize {
        self.nc
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn version(&self) -> ModelVersion {
        self.version
    }

    pub fn layout(&self) -> &YoloPreds {
        &self.layout
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn ts(&self) -> &TimeCalc {
        &self.ts
    }
}

impl<E: InferenceEngine> InferenceProcess for YoloSession<E> {
    type Input = DynamicImage;
    type Output = Vec<Detection>;

    fn preprocess(&self, xs: &[Self::Input]) -> Result<(X, Vec<ImageTransformInfo>), DetectError> {
        preprocess_batch(xs, self.width, self.height, self.resize_mode)
    }

    fn inference(&mut self, xs: X) -> Result<X, DetectError> {
        self.engine.run(xs)
    }

    fn postprocess(&self, ys: X, transforms: &[ImageTransformInfo]) -> Result<Vec<Self::Output>, DetectError> {
        let batches = self.layout.parse_output(ys.view(), self.nc, (self.width, self.height))?;
        if batches.len() != transforms.len() {
            return Err(DetectError::InvalidOutputShape(format!(
                "got a batch of {}, expected {}",
                batches.len(),
                transforms.len()
            )));
        }

        Ok(batches
            .iter()
            .zip(transforms)
            .map(|(preds, transform)| self.decoder.decode(preds, transform))
            .collect())
    }

    fn timings(&mut self) -> &mut TimeCalc {
        &mut self.ts
    }
}

fn n2s(n: usize) -> Vec<String> {
    (0..n).map(|x| format!("# {}", x)).collect::<Vec<String>>()
}
