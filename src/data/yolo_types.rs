//! Output layouts of the exported YOLO families and the parser that turns a
//! raw output tensor into [`RawPrediction`]s.

use ndarray::{ArrayView2, ArrayViewD, Axis, Ix2};
use crate::data::RawPrediction;
use crate::error::DetectError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxType {
    /// cx, cy, w, h
    Cxcywh,

    /// x1, y1, x2, y2
    Xyxy,

    /// x1, y1, w, h
    Xywh,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClssType {
    /// One score per class.
    Clss,
    /// Objectness followed by one score per class.
    ConfClss,
    /// A single score followed by the class id.
    ConfCls,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnchorsPosition {
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YoloPreds {
    pub clss: ClssType,
    pub bbox: BoxType,
    pub anchors: AnchorsPosition,
    pub is_bbox_normalized: bool,
    pub apply_nms: bool,
}

impl Default for YoloPreds {
    fn default() -> Self {
        Self::n_a_cxcywh_confclss()
    }
}

impl YoloPreds {
    pub fn apply_nms(mut self, x: bool) -> Self {
        self.apply_nms = x;
        self
    }

    pub fn bbox_normalized(mut self, x: bool) -> Self {
        self.is_bbox_normalized = x;
        self
    }

    pub fn n_a_cxcywh_confclss() -> Self {
        // YOLOv5 | YOLOv6 | YOLOv7 | YOLOX : NACxcywhConfClss
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::ConfClss,
            anchors: AnchorsPosition::Before,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn n_cxcywh_clss_a() -> Self {
        // YOLOv8 | YOLOv9 | YOLO11 : NCxcywhClssA
        Self {
            bbox: BoxType::Cxcywh,
            clss: ClssType::Clss,
            anchors: AnchorsPosition::After,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn n_a_xyxy_confcls() -> Self {
        // YOLOv10 : NAXyxyConfCls
        Self {
            bbox: BoxType::Xyxy,
            clss: ClssType::ConfCls,
            anchors: AnchorsPosition::Before,
            is_bbox_normalized: false,
            apply_nms: true,
        }
    }

    pub fn is_anchors_first(&self) -> bool {
        matches!(self.anchors, AnchorsPosition::Before)
    }

    /// Columns per anchor once the anchor axis is first.
    pub fn num_features(&self, nc: usize) -> usize {
        match self.clss {
            ClssType::Clss => 4 + nc,
            ClssType::ConfClss => 5 + nc,
            ClssType::ConfCls => 6,
        }
    }

    /// Number of classes implied by a static output shape, if the layout
    /// encodes it.
    pub fn infer_nc(&self, dims: &[i64]) -> Option<usize> {
        let features = match dims {
            [_, a, b] | [a, b] => if self.is_anchors_first() { *b } else { *a },
            _ => return None,
        };
        let features = usize::try_from(features).ok()?;
        match self.clss {
            ClssType::Clss => features.checked_sub(4).filter(|&nc| nc > 0),
            ClssType::ConfClss => features.checked_sub(5).filter(|&nc| nc > 0),
            ClssType::ConfCls => None,
        }
    }

    /// Splits a `(batch, .., ..)` output into one prediction list per image.
    /// A rank-2 output is treated as a batch of one.
    pub fn parse_output(
        &self,
        output: ArrayViewD<f32>,
        nc: usize,
        input_size: (u32, u32),
    ) -> Result<Vec<Vec<RawPrediction>>, DetectError> {
        let output = match output.ndim() {
            2 => output.insert_axis(Axis(0)),
            3 => output,
            _ => {
                return Err(DetectError::output_shape(
                    output.shape(),
                    "a rank 3 tensor (batch, anchors, features)",
                ))
            }
        };

        output
            .axis_iter(Axis(0))
            .map(|preds| {
                let preds = preds
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| DetectError::InvalidOutputShape(e.to_string()))?;
                self.parse_preds(preds, nc, input_size)
            })
            .collect()
    }

    /// Parses the predictions of a single image.
    pub fn parse_preds(
        &self,
        x: ArrayView2<f32>,
        nc: usize,
        input_size: (u32, u32),
    ) -> Result<Vec<RawPrediction>, DetectError> {
        let x = if self.is_anchors_first() {
            x
        } else {
            x.reversed_axes()
        };

        let features = self.num_features(nc);
        if x.ncols() != features {
            let expected = match self.anchors {
                AnchorsPosition::Before => format!("(anchors, {})", features),
                AnchorsPosition::After => format!("({}, anchors)", features),
            };
            let shape = match self.anchors {
                AnchorsPosition::Before => [x.nrows(), x.ncols()],
                AnchorsPosition::After => [x.ncols(), x.nrows()],
            };
            return Err(DetectError::output_shape(&shape, &expected));
        }

        let (sx, sy) = if self.is_bbox_normalized {
            (input_size.0 as f32, input_size.1 as f32)
        } else {
            (1., 1.)
        };

        let mut preds = Vec::with_capacity(x.nrows());
        for row in x.outer_iter() {
            let (a, b, c, d) = (row[0] * sx, row[1] * sy, row[2] * sx, row[3] * sy);
            let (cx, cy, w, h) = match self.bbox {
                BoxType::Cxcywh => (a, b, c, d),
                BoxType::Xyxy => ((a + c) / 2., (b + d) / 2., c - a, d - b),
                BoxType::Xywh => (a + c / 2., b + d / 2., c, d),
            };

            let (objectness, class_scores) = match self.clss {
                ClssType::Clss => (1., row.slice(ndarray::s![4..]).to_vec()),
                ClssType::ConfClss => (row[4], row.slice(ndarray::s![5..]).to_vec()),
                ClssType::ConfCls => {
                    let class_id = row[5];
                    if !(class_id >= 0. && (class_id as usize) < nc) {
                        return Err(DetectError::InvalidOutputShape(format!(
                            "class id {} out of range for {} classes",
                            class_id, nc
                        )));
                    }
                    let mut scores = vec![0.; nc];
                    scores[class_id as usize] = row[4];
                    (1., scores)
                }
            };

            preds.push(RawPrediction::new(cx, cy, w, h, objectness, class_scores));
        }

        Ok(preds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    fn v5_rows() -> Array2<f32> {
        // cx, cy, w, h, obj, c0, c1
        Array2::from_shape_vec(
            (2, 7),
            vec![
                50., 60., 20., 10., 0.9, 0.1, 0.8,
                10., 10., 4., 4., 0.5, 0.6, 0.2,
            ],
        )
        .unwrap()
    }

    #[test]
    fn parses_v5_rows() {
        let preds = YoloPreds::n_a_cxcywh_confclss()
            .parse_preds(v5_rows().view(), 2, (640, 640))
            .unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0], RawPrediction::new(50., 60., 20., 10., 0.9, vec![0.1, 0.8]));
        assert_eq!(preds[1].objectness, 0.5);
    }

    #[test]
    fn v8_layout_is_transposed_v5_without_objectness() {
        // (4 + nc, anchors)
        let x = Array2::from_shape_vec(
            (6, 2),
            vec![
                50., 10.,
                60., 10.,
                20., 4.,
                10., 4.,
                0.1, 0.6,
                0.8, 0.2,
            ],
        )
        .unwrap();
        let preds = YoloPreds::n_cxcywh_clss_a().parse_preds(x.view(), 2, (640, 640)).unwrap();
        assert_eq!(preds[0], RawPrediction::new(50., 60., 20., 10., 1.0, vec![0.1, 0.8]));
        assert_eq!(preds[1], RawPrediction::new(10., 10., 4., 4., 1.0, vec![0.6, 0.2]));
    }

    #[test]
    fn v10_rows_become_center_form_with_one_hot_scores() {
        let x = Array2::from_shape_vec((1, 6), vec![10., 20., 30., 60., 0.7, 2.]).unwrap();
        let preds = YoloPreds::n_a_xyxy_confcls().parse_preds(x.view(), 3, (640, 640)).unwrap();
        assert_eq!(preds[0], RawPrediction::new(20., 40., 20., 40., 1.0, vec![0., 0., 0.7]));
    }

    #[test]
    fn v10_rejects_unknown_class_id() {
        let x = Array2::from_shape_vec((1, 6), vec![10., 20., 30., 60., 0.7, 5.]).unwrap();
        let err = YoloPreds::n_a_xyxy_confcls().parse_preds(x.view(), 3, (640, 640));
        assert!(matches!(err, Err(DetectError::InvalidOutputShape(_))));
    }

    #[test]
    fn normalized_boxes_scale_to_input_size() {
        let x = Array2::from_shape_vec((1, 6), vec![0.5, 0.25, 0.1, 0.2, 0.3, 0.9]).unwrap();
        let preds = YoloPreds::n_a_cxcywh_confclss()
            .bbox_normalized(true)
            .parse_preds(x.view(), 1, (640, 320))
            .unwrap();
        assert_eq!((preds[0].cx, preds[0].cy, preds[0].w, preds[0].h), (320., 80., 64., 64.));
    }

    #[test]
    fn wrong_feature_count_is_an_output_shape_error() {
        let err = YoloPreds::n_a_cxcywh_confclss().parse_preds(v5_rows().view(), 80, (640, 640));
        assert!(matches!(err, Err(DetectError::InvalidOutputShape(_))));
    }

    #[test]
    fn parse_output_rejects_bad_rank_and_accepts_missing_batch() {
        let layout = YoloPreds::n_a_cxcywh_confclss();

        let flat = ndarray::Array1::<f32>::zeros(7).into_dyn();
        assert!(matches!(
            layout.parse_output(flat.view(), 2, (640, 640)),
            Err(DetectError::InvalidOutputShape(_))
        ));

        let rows = v5_rows().into_dyn();
        let batches = layout.parse_output(rows.view(), 2, (640, 640)).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);

        let empty = Array3::<f32>::zeros((1, 0, 7)).into_dyn();
        let batches = layout.parse_output(empty.view(), 2, (640, 640)).unwrap();
        assert!(batches[0].is_empty());
    }

    #[test]
    fn infers_class_count_from_static_shape() {
        assert_eq!(YoloPreds::n_a_cxcywh_confclss().infer_nc(&[1, 25200, 85]), Some(80));
        assert_eq!(YoloPreds::n_cxcywh_clss_a().infer_nc(&[1, 84, 8400]), Some(80));
        assert_eq!(YoloPreds::n_cxcywh_clss_a().infer_nc(&[1, -1, 8400]), None);
        assert_eq!(YoloPreds::n_a_xyxy_confcls().infer_nc(&[1, 300, 6]), None);
    }
}
