use crate::common::{Detection, ImageTransformInfo, ModelConfig, DEFAULT_CONF_THRESHOLD, DEFAULT_NMS_THRESHOLD};
use crate::data::RawPrediction;
use crate::detection_runners::ort_detector::nms::nms;

/// Turns raw model predictions into final detections: confidence filter,
/// class filters, mapping back to source pixels, then per-class NMS.
/// Candidates with a non-finite or empty box are dropped, as are boxes that
/// clamp to nothing inside the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoder {
    pub conf_threshold: f32,
    pub nms_threshold: f32,
    pub apply_nms: bool,
    pub retain_classes: Vec<usize>,
    pub exclude_classes: Vec<usize>,
    pub names: Vec<String>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            conf_threshold: DEFAULT_CONF_THRESHOLD,
            nms_threshold: DEFAULT_NMS_THRESHOLD,
            apply_nms: true,
            retain_classes: vec![],
            exclude_classes: vec![],
            names: vec![],
        }
    }
}

impl From<&ModelConfig> for Decoder {
    fn from(config: &ModelConfig) -> Self {
        Self::new(config.conf_threshold, config.nms_threshold)
            .with_apply_nms(config.model_version.layout().apply_nms)
            .with_class_filters(&config.retain_classes, &config.exclude_classes)
    }
}

impl Decoder {
    pub fn new(conf_threshold: f32, nms_threshold: f32) -> Self {
        Self {
            conf_threshold,
            nms_threshold,
            ..Default::default()
        }
    }

    pub fn with_apply_nms(mut self, apply_nms: bool) -> Self {
        self.apply_nms = apply_nms;
        self
    }

    /// An empty `retain` list keeps every class.
    pub fn with_class_filters(mut self, retain: &[usize], exclude: &[usize]) -> Self {
        self.retain_classes = retain.to_vec();
        self.exclude_classes = exclude.to_vec();
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    fn keeps_class(&self, class_id: usize) -> bool {
        (self.retain_classes.is_empty() || self.retain_classes.contains(&class_id))
            && !self.exclude_classes.contains(&class_id)
    }

    /// Detections sorted by descending confidence; equal confidences keep
    /// the order of `preds`.
    pub fn decode(&self, preds: &[RawPrediction], transform: &ImageTransformInfo) -> Vec<Detection> {
        let mut detections: Vec<Detection> = preds
            .iter()
            .filter_map(|pred| {
                let (class_id, confidence) = pred.score()?;
                // NaN fails this too
                if !(confidence >= self.conf_threshold)
                    || !self.keeps_class(class_id)
                    || !pred.has_valid_geometry()
                {
                    return None;
                }
                let bbox = transform.unmap_box(&pred.bbox());
                // wholly outside the source image, e.g. in letterbox padding
                if bbox.area() <= 0. {
                    return None;
                }
                Some(Detection::new(
                    class_id,
                    bbox,
                    self.names.get(class_id).cloned(),
                    confidence,
                ))
            })
            .collect();

        if self.apply_nms {
            nms(&mut detections, self.nms_threshold, true);
        } else {
            detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        }

        detections
    }
}

/// Decodes with default class handling.
pub fn decode(
    preds: &[RawPrediction],
    conf_threshold: f32,
    nms_threshold: f32,
    transform: &ImageTransformInfo,
) -> Vec<Detection> {
    Decoder::new(conf_threshold, nms_threshold).decode(preds, transform)
}
