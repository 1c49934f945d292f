//! Finger width from a skin segmentation mask
//!
//! Runs once per still capture. From the middle finger PIP joint, probe the
//! skin mask pixel by pixel in both directions perpendicular to the finger
//! axis; the two probe lengths add up to the finger width.

use image::{GrayImage, Luma, RgbaImage};
use nalgebra::Vector2;

use super::error::PoseError;
use super::landmark::{FrameSize, HandPose, MIDDLE_MCP, MIDDLE_PIP};

/// Preferred label name in the selfie multiclass segmenter
pub const SKIN_LABEL: &str = "body-skin";

const OPAQUE: u8 = 255;
const TRANSPARENT: u8 = 0;

/// Result of one width measurement (pixels of the still frame)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthEstimate {
    pub width_px: f32,
    /// Midpoint between the two boundary points
    pub center: (f32, f32),
    pub negative_edge: (f32, f32),
    pub positive_edge: (f32, f32),
}

// ============================================================================
// MASK PREPARATION
// ============================================================================

/// Resolve the skin category index from the segmenter's label table
pub fn skin_category<S: AsRef<str>>(labels: &[S]) -> Result<u8, PoseError> {
    let position = labels
        .iter()
        .position(|label| label.as_ref() == SKIN_LABEL)
        .or_else(|| labels.iter().position(|label| label.as_ref().contains("skin")))
        .ok_or(PoseError::NoSkinCategory)?;
    u8::try_from(position).map_err(|_| PoseError::NoSkinCategory)
}

/// Wrap a row-major per-pixel label buffer
pub fn category_mask_from_raw(width: u32, height: u32, labels: Vec<u8>) -> Result<GrayImage, PoseError> {
    let expected = width as usize * height as usize;
    let actual = labels.len();
    if actual != expected {
        return Err(PoseError::MalformedMask { expected, actual });
    }
    GrayImage::from_raw(width, height, labels).ok_or(PoseError::MalformedMask { expected, actual })
}

/// Wrap a row-major RGBA pixel buffer (e.g. canvas `ImageData`)
pub fn rgba_frame_from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<RgbaImage, PoseError> {
    let expected = width as usize * height as usize * 4;
    let actual = pixels.len();
    if actual != expected {
        return Err(PoseError::MalformedFrame { expected, actual });
    }
    RgbaImage::from_raw(width, height, pixels).ok_or(PoseError::MalformedFrame { expected, actual })
}

/// Opaque where the pixel is skin, transparent elsewhere
pub fn alpha_mask(categories: &GrayImage, skin: u8) -> GrayImage {
    let (w, h) = categories.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if categories.get_pixel(x, y)[0] == skin {
            Luma([OPAQUE])
        } else {
            Luma([TRANSPARENT])
        }
    })
}

/// Copy of `frame` with the mask written into its alpha channel
pub fn cutout_rgba(frame: &RgbaImage, alpha: &GrayImage) -> Result<RgbaImage, PoseError> {
    check_dimensions(alpha, FrameSize::new(frame.width(), frame.height()))?;
    let mut out = frame.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        pixel[3] = alpha.get_pixel(x, y)[0];
    }
    Ok(out)
}

fn check_dimensions(mask: &GrayImage, frame: FrameSize) -> Result<(), PoseError> {
    let (mask_width, mask_height) = mask.dimensions();
    if mask_width != frame.width || mask_height != frame.height {
        return Err(PoseError::MaskSizeMismatch {
            mask_width,
            mask_height,
            frame_width: frame.width,
            frame_height: frame.height,
        });
    }
    Ok(())
}

// ============================================================================
// PROBE
// ============================================================================

/// March from `origin` along `direction` (unit length) one pixel per step.
///
/// Returns the boundary point and its distance from `origin`. Hitting a
/// transparent pixel puts the boundary halfway between the last opaque
/// sample and the transparent one; leaving the canvas puts it on the last
/// in-canvas sample.
fn probe(alpha: &GrayImage, origin: Vector2<f32>, direction: Vector2<f32>) -> (Vector2<f32>, f32) {
    let (w, h) = alpha.dimensions();
    let max_steps = w + h;
    let mut last_inside = 0.0_f32;

    for step in 0..=max_steps {
        let distance = step as f32;
        let point = origin + direction * distance;
        let (px, py) = (point.x.round(), point.y.round());

        if px < 0.0 || py < 0.0 || px >= w as f32 || py >= h as f32 {
            return (origin + direction * last_inside, last_inside);
        }
        if alpha.get_pixel(px as u32, py as u32)[0] == TRANSPARENT {
            if step == 0 {
                return (origin, 0.0);
            }
            let boundary = last_inside + 0.5;
            return (origin + direction * boundary, boundary);
        }
        last_inside = distance;
    }

    (origin + direction * last_inside, last_inside)
}

/// Measure finger width across the middle finger at its PIP joint
pub fn estimate_finger_width(
    pose: &HandPose,
    alpha: &GrayImage,
    frame: FrameSize,
) -> Result<WidthEstimate, PoseError> {
    check_dimensions(alpha, frame)?;

    let (mx, my) = pose.pixel(MIDDLE_MCP, frame);
    let (px, py) = pose.pixel(MIDDLE_PIP, frame);
    let axis = Vector2::new(px - mx, py - my);
    let length = axis.norm();
    if length < 1e-4 {
        return Err(PoseError::DegenerateSegment);
    }

    let along = axis / length;
    let across = Vector2::new(-along.y, along.x);
    let origin = Vector2::new(px, py);

    let (negative_edge, negative_distance) = probe(alpha, origin, -across);
    let (positive_edge, positive_distance) = probe(alpha, origin, across);
    let center = (negative_edge + positive_edge) / 2.0;

    let estimate = WidthEstimate {
        width_px: negative_distance.abs() + positive_distance.abs(),
        center: (center.x, center.y),
        negative_edge: (negative_edge.x, negative_edge.y),
        positive_edge: (positive_edge.x, positive_edge.y),
    };

    if estimate.width_px <= 0.0 {
        log::warn!("PIP joint at ({:.1}, {:.1}) is not on skin; width unavailable", px, py);
    } else {
        log::debug!("mask finger width {:.1}px", estimate.width_px);
    }
    Ok(estimate)
}
