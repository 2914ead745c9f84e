use serde::{Deserialize, Serialize};
use crate::data::YoloPreds;

/// Exported YOLO family, used to pick the output layout.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    #[default] YoloV5,
    YoloV6,
    YoloV7,
    YoloV8,
    YoloV9,
    YoloV10,
    YoloV11,
    YoloV12,
}

impl ModelVersion {
    pub fn name(&self) -> String {
        match self {
            Self::YoloV5 => "YoloV5".to_string(),
            Self::YoloV6 => "YoloV6".to_string(),
            Self::YoloV7 => "YoloV7".to_string(),
            Self::YoloV8 => "YoloV8".to_string(),
            Self::YoloV9 => "YoloV9".to_string(),
            Self::YoloV10 => "YoloV10".to_string(),
            Self::YoloV11 => "YoloV11".to_string(),
            Self::YoloV12 => "YoloV12".to_string(),
        }
    }

    /// Parses `yolov8`, `v8` or `8`. Unknown strings yield `None`.
    pub fn parse(version: &str) -> Option<ModelVersion> {
        let version = version.to_lowercase();
        let version = version
            .trim_start_matches("yolo")
            .trim_start_matches('v');
        match version {
            "5" => Some(ModelVersion::YoloV5),
            "6" => Some(ModelVersion::YoloV6),
            "7" => Some(ModelVersion::YoloV7),
            "8" => Some(ModelVersion::YoloV8),
            "9" => Some(ModelVersion::YoloV9),
            "10" => Some(ModelVersion::YoloV10),
            "11" => Some(ModelVersion::YoloV11),
            "12" => Some(ModelVersion::YoloV12),
            _ => None,
        }
    }

    /// Output layout produced by this family's standard export.
    pub fn layout(&self) -> YoloPreds {
        match self {
            ModelVersion::YoloV5 | ModelVersion::YoloV6 | ModelVersion::YoloV7 => YoloPreds::n_a_cxcywh_confclss(),
            ModelVersion::YoloV8 | ModelVersion::YoloV9 | ModelVersion::YoloV11 | ModelVersion::YoloV12 => YoloPreds::n_cxcywh_clss_a(),
            ModelVersion::YoloV10 => YoloPreds::n_a_xyxy_confcls().apply_nms(false),
        }
    }
}
