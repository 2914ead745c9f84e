pub trait Nms {
    fn iou(&self, other: &Self) -> f32;
    fn confidence(&self) -> f32;
    fn class_id(&self) -> usize;
}

/// Greedy non-maximum suppression, in place.
///
/// Boxes are stable-sorted by descending confidence, so equal scores keep
/// their original order. A box is dropped when its IoU with an already kept
/// box exceeds `iou_threshold`; with `per_class` only boxes of the same class
/// suppress each other. The survivors stay sorted by descending confidence.
pub fn nms<T: Nms>(boxes: &mut Vec<T>, iou_threshold: f32, per_class: bool) {
    boxes.sort_by(|b1, b2| b2.confidence().total_cmp(&b1.confidence()));

    let mut current_index = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if per_class && boxes[prev_index].class_id() != boxes[index].class_id() {
                continue;
            }
            let iou = boxes[prev_index].iou(&boxes[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}
