use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use crate::common::Detection;

pub fn get_class_colour(class: usize) -> Rgb<u8> {
    match class {
        0 => Rgb([128, 0, 128]),     // purple (people)
        1..=8 => Rgb([0, 255, 0]),   // green (vehicles)
        14..=23 => Rgb([255, 0, 0]), // red (animals)
        _ => Rgb([0, 0, 255])        // blue (everything else)
    }
}

/// Copy of `image` with a box outline drawn around every detection.
pub fn annotate(image: &DynamicImage, detections: &[Detection]) -> RgbImage {
    let mut img = image.to_rgb8();
    for det in detections {
        let (x, y, w, h) = det.bbox.as_xy_wh_i32();
        if w <= 0 || h <= 0 {
            continue;
        }
        let rect = Rect::at(x, y).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(&mut img, rect, get_class_colour(det.class_id));
    }
    img
}
