//! ONNX Runtime backend.

use anyhow::Result;
use half::{bf16, f16};
use ndarray::{Array, IxDyn};
use ort::{
    execution_providers::{ExecutionProvider,
                          CPUExecutionProvider,
                          CUDAExecutionProvider,
                          TensorRTExecutionProvider,
                          CoreMLExecutionProvider},
    session::builder::{GraphOptimizationLevel, SessionBuilder},
    session::{Input, Output, Session},
    tensor::TensorElementType,
    value::{DynValue, Tensor, ValueType},
};
use regex::Regex;
use std::time::Instant;
use crate::common::InferenceDevice;
use crate::data::{ConfigOrt, TimeCalc};
use crate::detection_runners::inference_process::InferenceEngine;
use crate::detection_runners::ort_detector::input_wrapper::X;
use crate::error::DetectError;

pub(crate) const CROSS_MARK: &str = "❌";

/// Names, element types and dimensions of a model's inputs or outputs.
/// Dynamic dimensions are `-1`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrtTensorAttr {
    pub names: Vec<String>,
    pub dtypes: Vec<TensorElementType>,
    pub dimss: Vec<Vec<i64>>,
}

impl OrtTensorAttr {
    fn push(&mut self, name: &str, value_type: &ValueType) -> Result<()> {
        let dtype = match value_type.tensor_type() {
            Some(dtype) => dtype,
            None => anyhow::bail!("{CROSS_MARK} `{name}` is not a tensor: {value_type:?}"),
        };
        let dims = value_type
            .tensor_shape()
            .map(|shape| shape.to_vec())
            .unwrap_or_default();

        self.names.push(name.to_string());
        self.dtypes.push(dtype);
        self.dimss.push(dims);
        Ok(())
    }

    fn from_inputs(inputs: &[Input]) -> Result<Self> {
        let mut attrs = Self::default();
        for input in inputs {
            attrs.push(&input.name, &input.input_type)?;
        }
        Ok(attrs)
    }

    fn from_outputs(outputs: &[Output]) -> Result<Self> {
        let mut attrs = Self::default();
        for output in outputs {
            attrs.push(&output.name, &output.output_type)?;
        }
        Ok(attrs)
    }
}

/// An owned ONNX Runtime session. Dropping it releases the session.
#[derive(Debug)]
pub struct OrtEngine {
    session: Session,
    device: InferenceDevice,
    inputs_attrs: OrtTensorAttr,
    outputs_attrs: OrtTensorAttr,
    profile: bool,
    pub infer_time: TimeCalc,
}

impl OrtEngine {
    pub fn new(config: &ConfigOrt) -> Result<Self> {
        if let Some(lib) = &config.ort_lib_path {
            if let Err(e) = ort::init_from(lib).commit() {
                anyhow::bail!("{CROSS_MARK} Failed to load ONNX Runtime from {lib}: {e}");
            }
        }

        let mut builder = Session::builder()?;
        if let Some(n) = config.num_threads {
            builder = builder.with_intra_threads(n)?;
        }

        let mut device = config.device;
        match device {
            InferenceDevice::TensorRT(device_id) => {
                Self::build_trt(
                    &mut builder,
                    device_id,
                    config.trt_fp16_enable,
                    config.trt_engine_cache_enable,
                )
                .unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CUDA(device_id) => {
                Self::build_cuda(&mut builder, device_id).unwrap_or_else(|err| {
                    log::warn!("{err}, Using cpu");
                    device = InferenceDevice::CPU;
                })
            }
            InferenceDevice::CoreML => Self::build_coreml(&mut builder).unwrap_or_else(|err| {
                log::warn!("{err}, Using cpu");
                device = InferenceDevice::CPU;
            }),
            InferenceDevice::CPU => {
                Self::build_cpu(&mut builder)?;
            }
        }

        let session = builder
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&config.onnx_path)?;

        let inputs_attrs = OrtTensorAttr::from_inputs(&session.inputs)?;
        let outputs_attrs = OrtTensorAttr::from_outputs(&session.outputs)?;
        if inputs_attrs.names.is_empty() || outputs_attrs.names.is_empty() {
            anyhow::bail!("{CROSS_MARK} Model has no inputs or no outputs");
        }

        log::info!(
            "Backend: ONNXRuntime | Device: {} | Inputs: {:?} {:?} | Outputs: {:?} {:?}",
            device,
            inputs_attrs.names,
            inputs_attrs.dimss,
            outputs_attrs.names,
            outputs_attrs.dimss,
        );

        Ok(Self {
            session,
            device,
            inputs_attrs,
            outputs_attrs,
            profile: config.profile,
            infer_time: TimeCalc::default(),
        })
    }

    fn build_trt(
        builder: &mut SessionBuilder,
        device_id: usize,
        fp16_enable: bool,
        engine_cache_enable: bool,
    ) -> Result<()> {
        let trt = TensorRTExecutionProvider::default()
            .with_device_id(device_id as i32)
            .with_fp16(fp16_enable)
            .with_engine_cache(engine_cache_enable)
            .with_engine_cache_path("trt-cache");
        if trt.is_available()? {
            if let Err(err) = trt.register(builder) {
                anyhow::bail!("{CROSS_MARK} TensorRT initialization failed: {:?}", err)
            }
            log::info!("Initial model serialization with TensorRT may take some time...");
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} TensorRT execution provider not available")
        }
    }

    fn build_cuda(builder: &mut SessionBuilder, device_id: usize) -> Result<()> {
        let ep = CUDAExecutionProvider::default().with_device_id(device_id as i32);
        if ep.is_available()? {
            if let Err(err) = ep.register(builder) {
                anyhow::bail!("{CROSS_MARK} CUDA initialization failed: {:?}", err)
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CUDA execution provider not available")
        }
    }

    fn build_coreml(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CoreMLExecutionProvider::default().with_subgraphs(false);
        if ep.is_available()? {
            if let Err(err) = ep.register(builder) {
                anyhow::bail!("{CROSS_MARK} CoreML initialization failed: {:?}", err)
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CoreML execution provider not available")
        }
    }

    fn build_cpu(builder: &mut SessionBuilder) -> Result<()> {
        let ep = CPUExecutionProvider::default();
        if ep.is_available()? {
            if let Err(err) = ep.register(builder) {
                anyhow::bail!("{CROSS_MARK} CPU initialization failed: {:?}", err)
            }
            Ok(())
        } else {
            anyhow::bail!("{CROSS_MARK} CPU execution provider not available")
        }
    }

    /// Converts the `f32` input to the element type the model expects.
    fn tensor_preprocess(x: X, dtype: &TensorElementType) -> Result<DynValue> {
        let x = x.into_inner();
        let x = match dtype {
            TensorElementType::Float32 => Tensor::from_array(x)?.into_dyn(),
            TensorElementType::Float16 => Tensor::from_array(x.mapv(f16::from_f32))?.into_dyn(),
            TensorElementType::Bfloat16 => Tensor::from_array(x.mapv(bf16::from_f32))?.into_dyn(),
            TensorElementType::Float64 => Tensor::from_array(x.mapv(f64::from))?.into_dyn(),
            _ => anyhow::bail!("Unsupported model input type: {:?}", dtype),
        };
        Ok(x)
    }

    fn tensor_postprocess(x: &DynValue, dtype: &TensorElementType) -> Result<Array<f32, IxDyn>> {
        fn _extract_and_convert<T>(x: &DynValue, map_fn: impl Fn(T) -> f32) -> Result<Array<f32, IxDyn>>
        where
            T: Clone + 'static + ort::tensor::PrimitiveTensorElementType,
        {
            Ok(x.try_extract_array::<T>()?.mapv(map_fn))
        }
        match dtype {
            TensorElementType::Float32 => _extract_and_convert::<f32>(x, |x| x),
            TensorElementType::Float16 => _extract_and_convert::<f16>(x, f16::to_f32),
            TensorElementType::Bfloat16 => _extract_and_convert::<bf16>(x, bf16::to_f32),
            TensorElementType::Float64 => _extract_and_convert::<f64>(x, |x| x as f32),
            TensorElementType::Int64 => _extract_and_convert::<i64>(x, |x| x as f32),
            TensorElementType::Int32 => _extract_and_convert::<i32>(x, |x| x as f32),
            _ => anyhow::bail!("Unsupported ort tensor type: {:?}", dtype),
        }
    }

    /// Runs the first input and returns the first output as `f32`.
    pub fn engine_run(&mut self, xs: X) -> Result<X> {
        let t_pre = Instant::now();
        let x = Self::tensor_preprocess(xs, &self.inputs_attrs.dtypes[0])?;
        let t_pre = t_pre.elapsed();
        self.infer_time.add_or_push(0, t_pre);

        let t_run = Instant::now();
        let outputs = self
            .session
            .run(ort::inputs![self.inputs_attrs.names[0].as_str() => x])?;
        let t_run = t_run.elapsed();
        self.infer_time.add_or_push(1, t_run);

        let t_post = Instant::now();
        let name = self.outputs_attrs.names[0].as_str();
        let y = match outputs.get(name) {
            Some(y) => Self::tensor_postprocess(y, &self.outputs_attrs.dtypes[0])?,
            None => anyhow::bail!("Missing model output `{name}`"),
        };
        let t_post = t_post.elapsed();
        self.infer_time.add_or_push(2, t_post);
        self.infer_time.finish_run();

        if self.profile {
            log::info!(
                "[Profile] {:?} ({:?} avg) [alignment: {:?} | inference: {:?} | to_f32: {:?}]",
                t_pre + t_run + t_post,
                self.infer_time.avg(),
                t_pre,
                t_run,
                t_post,
            );
        }

        Ok(X::from(y))
    }

    pub fn try_fetch(&self, key: &str) -> Option<String> {
        match self.session.metadata() {
            Err(_) => None,
            Ok(metadata) => metadata.custom(key).unwrap_or_default(),
        }
    }

    /// Device the session actually runs on, CPU after a provider fallback.
    pub fn device(&self) -> &InferenceDevice {
        &self.device
    }
}

/// Class names from the `names` metadata entry exported by Ultralytics,
/// e.g. `{0: 'person', 1: 'bicycle', 27: "yellow_lady's_slipper"}`.
pub fn parse_names(names: &str) -> Vec<String> {
    let re = match Regex::new(r#"(['"])([-()\w '"]+)(['"])"#) {
        Ok(re) => re,
        Err(_) => return vec![],
    };
    re.captures_iter(names)
        .map(|x| x.extract())
        .map(|(_, [_, name, _])| name.to_string())
        .collect()
}

/// `(width, height)` of an NCHW input when both are static.
pub(crate) fn static_hw(dims: &[i64]) -> Option<(u32, u32)> {
    match dims {
        [_, _, h, w] if *h > 0 && *w > 0 => Some((*w as u32, *h as u32)),
        _ => None,
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&mut self, xs: X) -> Result<X, DetectError> {
        self.engine_run(xs).map_err(|e| DetectError::inference(format!("{e:#}")))
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        self.inputs_attrs.dimss.first().and_then(|dims| static_hw(dims))
    }

    fn output_dims(&self) -> Option<Vec<i64>> {
        self.outputs_attrs.dimss.first().cloned()
    }

    fn class_names(&self) -> Option<Vec<String>> {
        self.try_fetch("names").map(|names| parse_names(&names))
    }
}
