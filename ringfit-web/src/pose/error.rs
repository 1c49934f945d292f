//! Error type shared by the pose pipeline
//!
//! "No hand" and "probe ran off the mask" are valid outcomes, not errors.

use thiserror::Error;

/// Errors that can occur while processing a frame or capture
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoseError {
    /// Detector handed over a landmark buffer of the wrong size
    #[error("malformed landmark data: expected {expected} values, got {actual}")]
    MalformedLandmarks { expected: usize, actual: usize },

    /// Landmarks 9 and 10 coincide, so the finger axis has no direction
    #[error("degenerate finger segment: MCP and PIP landmarks coincide")]
    DegenerateSegment,

    /// Mask buffer length does not match its declared dimensions
    #[error("malformed mask: expected {expected} pixels, got {actual}")]
    MalformedMask { expected: usize, actual: usize },

    /// Pixel buffer length does not match `width * height * 4`
    #[error("malformed RGBA frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("mask is {mask_width}x{mask_height} but frame is {frame_width}x{frame_height}")]
    MaskSizeMismatch {
        mask_width: u32,
        mask_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("segmentation labels contain no skin category")]
    NoSkinCategory,

    #[error("no camera session is running")]
    SessionNotRunning,

    /// Capture requested while the gate has not accepted a pose
    #[error("no stable hand pose available for capture")]
    NoStablePose,

    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),
}
