//! Pose module - landmark gating and ring placement
//!
//! Re-exports only. All logic in submodules.

mod error;
mod landmark;
mod kalman;
mod gate;
mod handedness;
mod transform;
mod segmentation;

pub use error::PoseError;
pub use landmark::{
    poses_from_flat, FrameSize, HandPose, Landmark, LANDMARK_COUNT, REFERENCE_POSE,
    VALUES_PER_LANDMARK,
};
pub use kalman::{PositionSmoother, ScalarKalmanFilter};
pub use gate::{
    evaluate_pose, flatness_report, flatness_threshold, is_hand_flat, landmarks_in_square,
    FrameGateResult, GateParams, HandPoseGate, TargetSquare, FLATNESS_JOINTS,
};
pub use handedness::{classify_hand_side, palm_winding, HandSide};
pub use transform::{
    anchor_point, finger_axis_degrees, landmark_finger_width, mirror_x, CameraFacing,
    RingTransform, RingTransformEstimator, TransformParams,
};
pub use segmentation::{
    alpha_mask, category_mask_from_raw, cutout_rgba, estimate_finger_width, rgba_frame_from_raw,
    skin_category, WidthEstimate,
};
