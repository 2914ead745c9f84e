use crate::common::BBox;

/// One candidate emitted by the model, box in model-input pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPrediction {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
    /// Layouts without an objectness column use 1.0.
    pub objectness: f32,
    pub class_scores: Vec<f32>,
}

impl RawPrediction {
    pub fn new(cx: f32, cy: f32, w: f32, h: f32, objectness: f32, class_scores: Vec<f32>) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            objectness,
            class_scores,
        }
    }

    /// Highest class score and its index. The lowest index wins ties; NaN
    /// scores never win.
    pub fn best_class(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (class_id, &score) in self.class_scores.iter().enumerate() {
            match best {
                Some((_, best_score)) if !(score > best_score) => {}
                _ if score.is_nan() => {}
                _ => best = Some((class_id, score)),
            }
        }
        best
    }

    /// `objectness * max(class scores)` with the winning class.
    pub fn score(&self) -> Option<(usize, f32)> {
        self.best_class()
            .map(|(class_id, score)| (class_id, score * self.objectness))
    }

    /// Finite centre and a positive, finite size.
    pub fn has_valid_geometry(&self) -> bool {
        [self.cx, self.cy, self.w, self.h].iter().all(|v| v.is_finite())
            && self.w > 0.
            && self.h > 0.
    }

    pub fn bbox(&self) -> BBox {
        BBox::default().with_cxcy_wh(self.cx, self.cy, self.w, self.h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_multiplies_objectness_by_best_class() {
        let p = RawPrediction::new(0., 0., 1., 1., 0.5, vec![0.1, 0.8, 0.3]);
        let (class_id, score) = p.score().unwrap();
        assert_eq!(class_id, 1);
        assert!((score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn ties_pick_lowest_class_index() {
        let p = RawPrediction::new(0., 0., 1., 1., 1.0, vec![0.2, 0.7, 0.7]);
        assert_eq!(p.best_class(), Some((1, 0.7)));
    }

    #[test]
    fn nan_scores_are_ignored() {
        let p = RawPrediction::new(0., 0., 1., 1., 1.0, vec![f32::NAN, 0.3]);
        assert_eq!(p.best_class(), Some((1, 0.3)));

        let p = RawPrediction::new(0., 0., 1., 1., 1.0, vec![f32::NAN]);
        assert_eq!(p.best_class(), None);
        assert_eq!(RawPrediction::default().score(), None);
    }
}
