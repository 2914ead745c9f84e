use serde::{Deserialize, Serialize};
use crate::common::BBox;

/// How an image is fitted into the square model input.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Stretch to the target size, ignoring aspect ratio.
    #[default]
    FitExact,
    /// Keep aspect ratio, center the image and pad the rest.
    Letterbox,
}

/// Records the mapping from source image to model input so boxes can be
/// projected back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImageTransformInfo {
    pub mode: ResizeMode,
    pub width_src: u32,
    pub height_src: u32,
    pub width_dst: u32,
    pub height_dst: u32,
    pub width_scale: f32,
    pub height_scale: f32,
    pub width_pad: f32,
    pub height_pad: f32,
}

impl ImageTransformInfo {
    pub fn fit_exact(width_src: u32, height_src: u32, width_dst: u32, height_dst: u32) -> Self {
        Self {
            mode: ResizeMode::FitExact,
            width_src,
            height_src,
            width_dst,
            height_dst,
            width_scale: width_dst as f32 / width_src as f32,
            height_scale: height_dst as f32 / height_src as f32,
            width_pad: 0.,
            height_pad: 0.,
        }
    }

    pub fn letterbox(width_src: u32, height_src: u32, width_dst: u32, height_dst: u32) -> Self {
        let scale = (width_dst as f32 / width_src as f32).min(height_dst as f32 / height_src as f32);
        let (new_w, new_h) = Self::letterbox_size(width_src, height_src, width_dst, height_dst, scale);
        Self {
            mode: ResizeMode::Letterbox,
            width_src,
            height_src,
            width_dst,
            height_dst,
            width_scale: scale,
            height_scale: scale,
            width_pad: ((width_dst - new_w) / 2) as f32,
            height_pad: ((height_dst - new_h) / 2) as f32,
        }
    }

    pub fn new(mode: ResizeMode, width_src: u32, height_src: u32, width_dst: u32, height_dst: u32) -> Self {
        match mode {
            ResizeMode::FitExact => Self::fit_exact(width_src, height_src, width_dst, height_dst),
            ResizeMode::Letterbox => Self::letterbox(width_src, height_src, width_dst, height_dst),
        }
    }

    /// Size of the resized content inside a letterboxed canvas, never larger
    /// than the canvas and never empty.
    pub(crate) fn letterbox_size(width_src: u32, height_src: u32, width_dst: u32, height_dst: u32, scale: f32) -> (u32, u32) {
        let new_w = ((width_src as f32 * scale).round() as u32).clamp(1, width_dst);
        let new_h = ((height_src as f32 * scale).round() as u32).clamp(1, height_dst);
        (new_w, new_h)
    }

    /// Resized content region `(left, top, width, height)` inside the model input.
    pub fn content_rect(&self) -> (u32, u32, u32, u32) {
        let (w, h) = match self.mode {
            ResizeMode::FitExact => (self.width_dst, self.height_dst),
            ResizeMode::Letterbox => {
                Self::letterbox_size(self.width_src, self.height_src, self.width_dst, self.height_dst, self.width_scale)
            }
        };
        (self.width_pad as u32, self.height_pad as u32, w, h)
    }

    /// Maps a model-space box back into source pixels, clamped to the image.
    pub fn unmap_box(&self, bbox: &BBox) -> BBox {
        let x1 = (bbox.x1 - self.width_pad) / self.width_scale;
        let y1 = (bbox.y1 - self.height_pad) / self.height_scale;
        let x2 = (bbox.x2 - self.width_pad) / self.width_scale;
        let y2 = (bbox.y2 - self.height_pad) / self.height_scale;
        BBox::new(x1, y1, x2, y2).clamp_to(self.width_src as f32, self.height_src as f32)
    }
}
