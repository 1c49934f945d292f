//! Ring transform estimation - where, how big and how rotated the ring sits
//!
//! All geometry is done in pixel space of the displayed canvas:
//! 1. Anchor: a point part-way along middle MCP → PIP (ring sits nearer PIP)
//! 2. Rotation: angle of the finger axis, plus a fixed offset for the asset
//! 3. Scale: index MCP ↔ middle MCP distance, or a mask-measured width
//! 4. Smoothing: per-axis Kalman filters on the anchor (live video only)
//! 5. Mirroring: selfie streams are displayed flipped, so x and angle flip too
//! 6. Hand side: picks the asset's lateral alignment offset

use nalgebra::Vector2;

use super::error::PoseError;
use super::handedness::{classify_hand_side, HandSide};
use super::kalman::PositionSmoother;
use super::landmark::{FrameSize, HandPose, INDEX_MCP, MIDDLE_MCP, MIDDLE_PIP};

/// Segments shorter than this (pixels) have no usable direction
const MIN_SEGMENT_PX: f32 = 1e-4;

/// Which way the active camera points
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CameraFacing {
    /// Selfie camera; the video is shown mirrored
    User,
    /// Rear camera; shown as captured
    #[default]
    Environment,
}

impl CameraFacing {
    pub fn is_mirrored(&self) -> bool {
        matches!(self, CameraFacing::User)
    }
}

/// Tunables and display context for one transform computation
#[derive(Clone, Copy, Debug)]
pub struct TransformParams {
    pub frame: FrameSize,
    pub facing: CameraFacing,
    /// Fraction of the MCP → PIP segment at which the ring is centered
    pub anchor_fraction: f32,
    /// Displayed ring side as a fraction of the measured finger width
    pub width_multiplier: f32,
    /// Added to the finger-axis angle to stand the ring graphic upright
    pub rotation_offset_deg: f32,
    /// Lateral alignment of the ring artwork, percent of its width
    pub right_hand_offset_pct: f32,
    pub left_hand_offset_pct: f32,
}

/// Placement handed to the rendering layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingTransform {
    /// Anchor position in canvas pixels (already mirrored if needed)
    pub x: f32,
    pub y: f32,
    /// Final CSS-style rotation, offset included
    pub rotation_degrees: f32,
    /// Side length of the ring element in pixels
    pub scale_px: f32,
    pub mirrored: bool,
    pub hand_side: HandSide,
    pub lateral_offset_pct: f32,
}

// ============================================================================
// GEOMETRY HELPERS
// ============================================================================

fn to_vector((x, y): (f32, f32)) -> Vector2<f32> {
    Vector2::new(x, y)
}

/// Point at `fraction` of the way from `from` to `to`
pub fn anchor_point(from: (f32, f32), to: (f32, f32), fraction: f32) -> Result<(f32, f32), PoseError> {
    let start = to_vector(from);
    let axis = to_vector(to) - start;
    let length = axis.norm();
    if length < MIN_SEGMENT_PX {
        return Err(PoseError::DegenerateSegment);
    }

    let point = start + axis / length * (length * fraction);
    Ok((point.x, point.y))
}

/// Angle of the `from` → `to` axis in degrees, before any offset
pub fn finger_axis_degrees(from: (f32, f32), to: (f32, f32)) -> Result<f32, PoseError> {
    let axis = to_vector(to) - to_vector(from);
    if axis.norm() < MIN_SEGMENT_PX {
        return Err(PoseError::DegenerateSegment);
    }
    Ok(axis.y.atan2(axis.x).to_degrees())
}

/// Landmark-only finger width: index MCP to middle MCP, in pixels
pub fn landmark_finger_width(pose: &HandPose, frame: FrameSize) -> f32 {
    let index = to_vector(pose.pixel(INDEX_MCP, frame));
    let middle = to_vector(pose.pixel(MIDDLE_MCP, frame));
    (middle - index).norm()
}

/// Reflect an x coordinate across the canvas' vertical center line
pub fn mirror_x(x: f32, width: f32) -> f32 {
    width - x
}

fn lateral_offset_pct(side: HandSide, params: &TransformParams) -> f32 {
    match side {
        HandSide::Right => params.right_hand_offset_pct,
        HandSide::Left => params.left_hand_offset_pct,
    }
}

// ============================================================================
// ESTIMATOR
// ============================================================================

/// Computes ring transforms; owns the anchor smoothing filters of one
/// camera session
#[derive(Clone, Debug)]
pub struct RingTransformEstimator {
    smoother: PositionSmoother,
}

impl RingTransformEstimator {
    pub fn new(measurement_noise: f32, process_noise: f32) -> Self {
        Self {
            smoother: PositionSmoother::new(measurement_noise, process_noise),
        }
    }

    /// Live-video transform: anchor goes through the smoothing filters
    pub fn estimate_live(
        &mut self,
        pose: &HandPose,
        params: &TransformParams,
    ) -> Result<RingTransform, PoseError> {
        compute_transform(pose, params, None, Some(&mut self.smoother))
    }

    /// Still-capture transform: no temporal smoothing, optional measured width
    pub fn estimate_still(
        pose: &HandPose,
        params: &TransformParams,
        refined_width_px: Option<f32>,
    ) -> Result<RingTransform, PoseError> {
        compute_transform(pose, params, refined_width_px, None)
    }

    /// Fresh filters for a new camera session
    pub fn reset(&mut self) {
        self.smoother.reset();
    }
}

fn compute_transform(
    pose: &HandPose,
    params: &TransformParams,
    refined_width_px: Option<f32>,
    smoother: Option<&mut PositionSmoother>,
) -> Result<RingTransform, PoseError> {
    let mcp = pose.pixel(MIDDLE_MCP, params.frame);
    let pip = pose.pixel(MIDDLE_PIP, params.frame);

    let anchor = anchor_point(mcp, pip, params.anchor_fraction)?;
    let axis_deg = finger_axis_degrees(mcp, pip)?;

    let finger_width = refined_width_px
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or_else(|| landmark_finger_width(pose, params.frame));

    let (x, y) = match smoother {
        Some(smoother) => smoother.update(anchor),
        None => anchor,
    };

    let mirrored = params.facing.is_mirrored();
    let (x, axis_deg) = if mirrored {
        (mirror_x(x, params.frame.width as f32), -axis_deg)
    } else {
        (x, axis_deg)
    };

    let hand_side = classify_hand_side(pose);

    Ok(RingTransform {
        x,
        y,
        rotation_degrees: axis_deg + params.rotation_offset_deg,
        scale_px: finger_width * params.width_multiplier,
        mirrored,
        hand_side,
        lateral_offset_pct: lateral_offset_pct(hand_side, params),
    })
}
