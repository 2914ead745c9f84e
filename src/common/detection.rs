use serde::{Deserialize, Serialize};
use crate::common::BBox;
use crate::detection_runners::ort_detector::nms::Nms;

/// A finalized detection in original-image pixel coordinates.
#[derive(Default, Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub bbox: BBox,
    pub label: Option<String>,
    pub confidence: f32,
}

impl Nms for Detection {
    fn iou(&self, other: &Self) -> f32 {
        self.bbox.iou(&other.bbox)
    }

    fn confidence(&self) -> f32 {
        self.confidence
    }

    fn class_id(&self) -> usize {
        self.class_id
    }
}

impl Detection {
    pub fn new(class_id: usize, bbox: BBox, label: Option<String>, confidence: f32) -> Self {
        Self {
            class_id,
            bbox,
            label,
            confidence,
        }
    }

    pub fn get_label(&self) -> String {
        self.label.clone().unwrap_or("Unknown".to_string())
    }
}
