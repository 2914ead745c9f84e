//! Functions to preprocess images.

use fast_image_resize::{
    images::{CroppedImageMut, Image as FirImage},
    pixels::PixelType,
    FilterType, ResizeAlg, ResizeOptions, Resizer,
};
use image::{DynamicImage, GenericImageView};
use rayon::prelude::*;
use crate::common::{ImageTransformInfo, ResizeMode};
use crate::detection_runners::ort_detector::input_wrapper::X;
use crate::error::DetectError;

/// Grey used to fill letterbox padding.
pub const LETTERBOX_FILL: u8 = 114;

/// Converts an RGB image into a `(1, 3, S, S)` tensor with values in `[0, 1]`.
///
/// The image is stretched to `S x S` with bilinear filtering.
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Result<X, DetectError> {
    preprocess_with(image, input_size, input_size, ResizeMode::FitExact).map(|(x, _)| x)
}

/// Same as [`preprocess`] for a `width x height` input, also returning the
/// transform needed to map boxes back onto `image`.
pub fn preprocess_with(
    image: &DynamicImage,
    width: u32,
    height: u32,
    resize_mode: ResizeMode,
) -> Result<(X, ImageTransformInfo), DetectError> {
    validate_image(image)?;
    if width == 0 || height == 0 {
        return Err(DetectError::InvalidImage(format!(
            "model input size must be positive, got {}x{}",
            width, height
        )));
    }

    let (w0, h0) = image.dimensions();
    let transform = ImageTransformInfo::new(resize_mode, w0, h0, width, height);

    let src = to_fir_image(image)?;
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();
    let resized = match resize_mode {
        ResizeMode::FitExact => resize_image(&src, width, height, &mut resizer, &options)?,
        ResizeMode::Letterbox => letterbox_image(&src, &transform, LETTERBOX_FILL, &mut resizer, &options)?,
    };

    let flat = nchw_normalize_flat(&resized)?;
    let x = X::from_shape_vec(&[1, 3, height as usize, width as usize], flat)?;
    Ok((x, transform))
}

/// Preprocesses several images in parallel and stacks them into one
/// `(N, 3, height, width)` batch.
pub fn preprocess_batch(
    images: &[DynamicImage],
    width: u32,
    height: u32,
    resize_mode: ResizeMode,
) -> Result<(X, Vec<ImageTransformInfo>), DetectError> {
    if images.is_empty() {
        return Err(DetectError::InvalidImage("no images to preprocess".to_string()));
    }

    let (xs, transforms): (Vec<X>, Vec<ImageTransformInfo>) = images
        .par_iter()
        .map(|img| preprocess_with(img, width, height, resize_mode))
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();

    Ok((X::concatenate(&xs)?, transforms))
}

fn validate_image(image: &DynamicImage) -> Result<(), DetectError> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return Err(DetectError::InvalidImage(format!("image is empty ({}x{})", w, h)));
    }
    let channels = image.color().channel_count();
    if channels != 3 {
        return Err(DetectError::InvalidImage(format!(
            "expected 3 channels, got {} ({:?})",
            channels,
            image.color()
        )));
    }
    Ok(())
}

fn to_fir_image(image: &DynamicImage) -> Result<FirImage<'static>, DetectError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    FirImage::from_vec_u8(width, height, rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| DetectError::InvalidImage(e.to_string()))
}

fn resize_image(
    img: &FirImage,
    target_w: u32,
    target_h: u32,
    resizer: &mut Resizer,
    options: &ResizeOptions,
) -> Result<FirImage<'static>, DetectError> {
    let mut dst = FirImage::new(target_w, target_h, PixelType::U8x3);
    resizer
        .resize(img, &mut dst, options)
        .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
    Ok(dst)
}

fn letterbox_image(
    img: &FirImage,
    transform: &ImageTransformInfo,
    bg: u8,
    resizer: &mut Resizer,
    options: &ResizeOptions,
) -> Result<FirImage<'static>, DetectError> {
    let (target_w, target_h) = (transform.width_dst, transform.height_dst);
    let mut padded = FirImage::from_vec_u8(
        target_w,
        target_h,
        vec![bg; rgb_len(target_w, target_h)],
        PixelType::U8x3,
    )
    .map_err(|e| DetectError::InvalidImage(e.to_string()))?;

    let (left, top, new_w, new_h) = transform.content_rect();
    {
        let mut cropped = CroppedImageMut::new(&mut padded, left, top, new_w, new_h)
            .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
        resizer
            .resize(img, &mut cropped, options)
            .map_err(|e| DetectError::InvalidImage(e.to_string()))?;
    }

    Ok(padded)
}

/// Byte length of a packed RGB image, computed in `usize` so large inputs
/// do not wrap.
fn rgb_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 3
}

/// Interleaved RGB bytes to planar CHW floats in `[0, 1]`.
fn nchw_normalize_flat(img: &FirImage) -> Result<Vec<f32>, DetectError> {
    let buf = img.buffer();
    let expected = rgb_len(img.width(), img.height());

    if buf.len() != expected {
        return Err(DetectError::InvalidImage(format!(
            "unexpected buffer size: got {}, expected {}",
            buf.len(),
            expected
        )));
    }

    let hw = expected / 3;
    let mut out = vec![0.0f32; buf.len()];
    for (i, px) in buf.chunks_exact(3).enumerate() {
        out[i] = px[0] as f32 / 255.0;
        out[i + hw] = px[1] as f32 / 255.0;
        out[i + 2 * hw] = px[2] as f32 / 255.0;
    }

    Ok(out)
}
