use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates, stored as both corners and size.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize, PartialOrd)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub w: f32,
    pub h: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::default().with_x1y1_x2y2(x1, y1, x2, y2)
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f32 {
        self.w
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f32 {
        self.h
    }

    /// Returns the center x-coordinate of the bounding box.
    pub fn cx(&self) -> f32 {
        self.x1 + self.w / 2.
    }

    /// Returns the center y-coordinate of the bounding box.
    pub fn cy(&self) -> f32 {
        self.y1 + self.h / 2.
    }

    /// Returns the bounding box coordinates as `(x1, y1, x2, y2)`.
    pub fn xy1_xy2(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.y1, self.x2, self.y2)
    }

    /// Returns the center coordinates and size of the bounding box as `(cx, cy, w, h)`.
    pub fn cxy_wh(&self) -> (f32, f32, f32, f32) {
        (self.cx(), self.cy(), self.w, self.h)
    }

    /// Computes the area of the bounding box.
    pub fn area(&self) -> f32 {
        self.w.max(0.) * self.h.max(0.)
    }

    /// Computes the intersection area between this bounding box and another.
    pub fn intersect(&self, other: &BBox) -> f32 {
        let left = self.x1.max(other.x1);
        let right = self.x2.min(other.x2);
        let top = self.y1.max(other.y1);
        let bottom = self.y2.min(other.y2);
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this bounding box and another.
    pub fn union(&self, other: &BBox) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Intersection over union. Degenerate boxes never overlap anything.
    pub fn iou(&self, other: &BBox) -> f32 {
        let union = self.union(other);
        if union <= 0. {
            return 0.;
        }
        self.intersect(other) / union
    }

    /// Clamps both corners into `[0, width] x [0, height]`.
    pub fn clamp_to(self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0., width),
            self.y1.clamp(0., height),
            self.x2.clamp(0., width),
            self.y2.clamp(0., height),
        )
    }

    pub fn as_xy_wh_i32(&self) -> (i32, i32, i32, i32) {
        (self.x1.round() as i32,
         self.y1.round() as i32,
         self.w.round() as i32,
         self.h.round() as i32)
    }

    /// Sets the bounding box's coordinates using `(x1, y1, x2, y2)` and calculates width and height.
    ///
    /// # Arguments
    ///
    /// * `x1` - The x-coordinate of the top-left corner.
    /// * `y1` - The y-coordinate of the top-left corner.
    /// * `x2` - The x-coordinate of the bottom-right corner.
    /// * `y2` - The y-coordinate of the bottom-right corner.
    pub fn with_x1y1_x2y2(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;

        self.w = x2 - x1;
        self.h = y2 - y1;
        self
    }

    /// Sets the bounding box's coordinates and dimensions using `(cx, cy, w, h)`.
    ///
    /// # Arguments
    ///
    /// * `cx` - The x-coordinate of the horizontal center.
    /// * `cy` - The y-coordinate of the vertical center.
    /// * `w` - The width of the bounding box.
    /// * `h` - The height of the bounding box.
    pub fn with_cxcy_wh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - (w / 2.0);
        self.y1 = cy - (h / 2.0);
        self.w = w;
        self.h = h;

        self.x2 = cx + (w / 2.0);
        self.y2 = cy + (h / 2.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = BBox::new(10., 10., 50., 50.);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox::new(0., 0., 10., 10.);
        let b = BBox::new(20., 20., 30., 30.);
        assert_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn iou_of_half_overlap() {
        // 10x10 boxes sharing a 5x10 strip: 50 / 150
        let a = BBox::new(0., 0., 10., 10.);
        let b = BBox::new(5., 0., 15., 10.);
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_area_boxes_do_not_divide_by_zero() {
        let a = BBox::new(5., 5., 5., 5.);
        assert_eq!(a.iou(&a), 0.0);
    }

    #[test]
    fn center_form_matches_corner_form() {
        let a = BBox::default().with_cxcy_wh(20., 30., 10., 20.);
        assert_eq!(a.xy1_xy2(), (15., 20., 25., 40.));
        assert_eq!(a.cxy_wh(), (20., 30., 10., 20.));
    }

    #[test]
    fn clamp_keeps_box_inside_image() {
        let a = BBox::new(-5., -3., 120., 90.).clamp_to(100., 80.);
        assert_eq!(a.xy1_xy2(), (0., 0., 100., 80.));
        assert_eq!((a.width(), a.height()), (100., 80.));
    }
}
