use std::time::Instant;
use anyhow::{Context, Result};
use clap::Parser;
use yolo_vision::common::{annotate, InferenceDevice, ModelConfig, ModelVersion, ResizeMode};
use yolo_vision::YoloSession;

/// Run a YOLO ONNX model on one image and print the detections as JSON.
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
struct Args {
    /// ONNX model file
    #[arg(long, value_name = "FILE")]
    model: Option<String>,

    /// Input image
    #[arg(long, value_name = "IMAGE")]
    source: String,

    /// Path to the ONNX Runtime shared library
    #[arg(long, value_name = "FILE")]
    ort_lib: Option<String>,

    /// Class names, one per line
    #[arg(long, value_name = "FILE")]
    labels: Option<String>,

    /// Model family, e.g. yolov5, yolov8, yolo11
    #[arg(long = "version", value_name = "VERSION")]
    model_version: Option<String>,

    /// cpu, cuda, tensorrt or coreml
    #[arg(long)]
    device: Option<String>,

    #[arg(long, default_value = "0")]
    device_id: usize,

    /// Square model input size
    #[arg(long)]
    input_size: Option<u32>,

    /// Confidence threshold (0.0 - 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    conf: Option<f32>,

    /// NMS IoU threshold (0.0 - 1.0)
    #[arg(long, value_name = "THRESHOLD")]
    nms: Option<f32>,

    /// Keep aspect ratio and pad instead of stretching
    #[arg(long)]
    letterbox: bool,

    /// Number of classes, when neither labels nor the model name them
    #[arg(long)]
    nc: Option<usize>,

    /// Only report these class ids, e.g. 0,2,3
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    retain_classes: Vec<usize>,

    /// Never report these class ids
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    exclude_classes: Vec<usize>,

    /// Half precision TensorRT engines (default true)
    #[arg(long, value_name = "BOOL")]
    trt_fp16: Option<bool>,

    /// Intra-op threads for ONNX Runtime
    #[arg(long)]
    num_threads: Option<usize>,

    /// Log engine stage timings after each run
    #[arg(long)]
    profile: bool,

    /// JSON model config; command line flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Save a copy of the image with the detections drawn
    #[arg(long, value_name = "IMAGE")]
    output: Option<String>,
}

impl Args {
    fn model_config(&self) -> Result<ModelConfig> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_json_file(path)?,
            None => ModelConfig::default(),
        };

        if let Some(model) = &self.model {
            config.weights_path = model.clone();
        }
        if config.weights_path.is_empty() {
            anyhow::bail!("No model given, use --model or --config");
        }
        if self.ort_lib.is_some() {
            config.ort_lib_path = self.ort_lib.clone();
        }
        if self.labels.is_some() {
            config.labels_path = self.labels.clone();
        }
        if let Some(version) = &self.model_version {
            config.model_version = ModelVersion::parse(version)
                .with_context(|| format!("Unknown model version: {version}"))?;
        }
        if let Some(device) = &self.device {
            config.inference_device = InferenceDevice::from_str(device, self.device_id)
                .with_context(|| {
                    format!(
                        "Unknown device: {device}, expected one of {:?}",
                        InferenceDevice::all_inference_devices()
                    )
                })?;
        }
        if let Some(size) = self.input_size {
            config.input_size = size;
        }
        if let Some(conf) = self.conf {
            config.conf_threshold = conf;
        }
        if let Some(nms) = self.nms {
            config.nms_threshold = nms;
        }
        if self.letterbox {
            config.resize_mode = ResizeMode::Letterbox;
        }
        if self.nc.is_some() {
            config.nc = self.nc;
        }
        if !self.retain_classes.is_empty() || !self.exclude_classes.is_empty() {
            config = config.with_class_filters(&self.retain_classes, &self.exclude_classes);
        }
        if let Some(fp16) = self.trt_fp16 {
            config.trt_fp16 = fp16;
        }
        if self.num_threads.is_some() {
            config.num_threads = self.num_threads;
        }
        if self.profile {
            config.profile = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.model_config()?;
    log::info!("\n{}", config.summary());

    let image = image::open(&args.source).with_context(|| format!("Failed to open {}", args.source))?;
    // grey and RGBA files are flattened to RGB here; the library only accepts 3 channels
    let image = match image.color().channel_count() {
        3 => image,
        _ => image::DynamicImage::ImageRgb8(image.to_rgb8()),
    };

    let mut session = YoloSession::new(&config)?;

    let now = Instant::now();
    let detections = session.run(&image)?;
    log::info!("Detected {} objects in {:.2?}", detections.len(), now.elapsed());

    println!("{}", serde_json::to_string_pretty(&detections)?);

    if let Some(output) = &args.output {
        annotate(&image, &detections)
            .save(output)
            .with_context(|| format!("Failed to save {output}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("yolo-detect").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_reach_the_model_config() {
        let config = parse(&[
            "--model", "yolov8n.onnx",
            "--source", "bus.jpg",
            "--version", "yolov8",
            "--device", "tensorrt",
            "--device-id", "1",
            "--nc", "3",
            "--retain-classes", "0,2",
            "--exclude-classes", "2",
            "--trt-fp16", "false",
            "--num-threads", "4",
            "--profile",
            "--letterbox",
        ])
        .model_config()
        .unwrap();

        assert_eq!(config.weights_path, "yolov8n.onnx");
        assert_eq!(config.model_version, ModelVersion::YoloV8);
        assert_eq!(config.inference_device, InferenceDevice::TensorRT(1));
        assert_eq!(config.nc, Some(3));
        assert_eq!(config.retain_classes, [0, 2]);
        assert_eq!(config.exclude_classes, [2]);
        assert!(!config.trt_fp16);
        assert_eq!(config.num_threads, Some(4));
        assert!(config.profile);
        assert_eq!(config.resize_mode, ResizeMode::Letterbox);
    }

    #[test]
    fn defaults_without_flags() {
        let config = parse(&["--model", "m.onnx", "--source", "bus.jpg"]).model_config().unwrap();
        assert!(config.trt_fp16);
        assert!(config.retain_classes.is_empty());
        assert_eq!(config.nc, None);
        assert_eq!(config.conf_threshold, 0.25);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(parse(&["--source", "bus.jpg"]).model_config().is_err());
        assert!(parse(&["--model", "m.onnx", "--source", "bus.jpg", "--nms", "1.5"]).model_config().is_err());
        assert!(parse(&["--model", "m.onnx", "--source", "bus.jpg", "--nc", "0"]).model_config().is_err());
        assert!(parse(&["--model", "m.onnx", "--source", "bus.jpg", "--device", "tpu"]).model_config().is_err());
    }
}
