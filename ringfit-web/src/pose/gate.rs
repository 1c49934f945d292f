//! Hand pose gate - decides when a frame's hand is steady enough to act on
//!
//! Two checks: every landmark inside the on-screen guide square, and the
//! palm held flat to the camera (knuckle depths close to the reference pose).
//! Only a passing frame's pose is kept for a later capture.

use super::landmark::{
    FrameSize, HandPose, INDEX_MCP, INDEX_PIP, MIDDLE_MCP, MIDDLE_PIP, REFERENCE_POSE, RING_MCP,
    RING_PIP, WRIST,
};

pub const FLATNESS_JOINT_COUNT: usize = 7;

/// Joints whose depth is compared against the reference pose
pub const FLATNESS_JOINTS: [usize; FLATNESS_JOINT_COUNT] = [
    WRIST, INDEX_MCP, INDEX_PIP, MIDDLE_MCP, MIDDLE_PIP, RING_MCP, RING_PIP,
];

// ============================================================================
// TARGET SQUARE
// ============================================================================

/// Guide square in pixel coordinates (top-left corner + side length)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetSquare {
    pub x: f32,
    pub y: f32,
    pub side: f32,
}

impl TargetSquare {
    pub fn new(x: f32, y: f32, side: f32) -> Self {
        Self { x, y, side }
    }

    /// Square of `fraction` times the frame's shorter side, centered
    pub fn centered(frame: FrameSize, fraction: f32) -> Self {
        let side = frame.min_side() * fraction;
        Self {
            x: (frame.width as f32 - side) / 2.0,
            y: (frame.height as f32 - side) / 2.0,
            side,
        }
    }

    /// Inclusive on all four edges
    pub fn contains(&self, (px, py): (f32, f32)) -> bool {
        px >= self.x && px <= self.x + self.side && py >= self.y && py <= self.y + self.side
    }
}

// ============================================================================
// PER-FRAME CHECKS
// ============================================================================

/// Outcome of gating one frame
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameGateResult {
    pub hand_detected: bool,
    pub in_region: bool,
    pub is_flat: bool,
}

impl FrameGateResult {
    /// Capture is permitted only when all three hold
    pub fn passed(&self) -> bool {
        self.hand_detected && self.in_region && self.is_flat
    }
}

/// Everything the gate needs besides the pose itself
#[derive(Clone, Copy, Debug)]
pub struct GateParams {
    pub frame: FrameSize,
    pub square: TargetSquare,
    /// Maximum allowed |z - reference z|, already resolution-scaled
    pub z_threshold: f32,
}

/// Depth tolerance for the flatness check.
///
/// With `reference_resolution` set, the base threshold is scaled by
/// `square_side / reference_resolution` so a larger guide square (a hand
/// closer to or larger on screen) tolerates proportionally more depth spread.
pub fn flatness_threshold(base: f32, square_side: f32, reference_resolution: Option<f32>) -> f32 {
    match reference_resolution {
        Some(reference) if reference > 0.0 => base * square_side / reference,
        _ => base,
    }
}

/// True when every landmark projects inside the square
pub fn landmarks_in_square(pose: &HandPose, square: &TargetSquare, frame: FrameSize) -> bool {
    pose.landmarks()
        .iter()
        .all(|landmark| square.contains(landmark.to_pixels(frame)))
}

/// Absolute depth deviation from the reference pose for each checked joint
pub fn flatness_report(pose: &HandPose) -> [(usize, f32); FLATNESS_JOINT_COUNT] {
    FLATNESS_JOINTS.map(|joint| {
        let deviation = (pose.landmark(joint).z - REFERENCE_POSE.landmark(joint).z).abs();
        (joint, deviation)
    })
}

/// True when every checked joint is strictly within `z_threshold`
pub fn is_hand_flat(pose: &HandPose, z_threshold: f32) -> bool {
    flatness_report(pose)
        .iter()
        .all(|&(_, deviation)| deviation < z_threshold)
}

/// Gate a single pose (pure)
pub fn evaluate_pose(pose: &HandPose, params: &GateParams) -> FrameGateResult {
    let in_region = landmarks_in_square(pose, &params.square, params.frame);
    let is_flat = is_hand_flat(pose, params.z_threshold);

    if in_region && !is_flat {
        for (joint, deviation) in flatness_report(pose) {
            if deviation >= params.z_threshold {
                log::trace!(
                    "joint {}: |dz| = {:.4} exceeds {:.4}",
                    joint,
                    deviation,
                    params.z_threshold
                );
            }
        }
    }

    FrameGateResult {
        hand_detected: true,
        in_region,
        is_flat,
    }
}

// ============================================================================
// STATEFUL GATE
// ============================================================================

/// Holds the last accepted pose between frames
#[derive(Clone, Debug, Default)]
pub struct HandPoseGate {
    best_pose: Option<HandPose>,
    last_result: FrameGateResult,
}

impl HandPoseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate one frame's detections.
    ///
    /// The first passing hand wins and becomes the best known pose. When no
    /// hand passes, the result of the last hand examined is reported and
    /// any previously retained pose is dropped.
    pub fn evaluate(&mut self, poses: &[HandPose], params: &GateParams) -> FrameGateResult {
        let mut result = FrameGateResult::default();
        self.best_pose = None;

        for pose in poses {
            result = evaluate_pose(pose, params);
            if result.passed() {
                self.best_pose = Some(*pose);
                break;
            }
        }

        self.last_result = result;
        result
    }

    /// Withdraw the current frame's acceptance (e.g. unusable geometry)
    pub fn reject(&mut self) {
        self.best_pose = None;
    }

    pub fn best_pose(&self) -> Option<&HandPose> {
        self.best_pose.as_ref()
    }

    pub fn capture_permitted(&self) -> bool {
        self.best_pose.is_some() && self.last_result.passed()
    }

    pub fn last_result(&self) -> FrameGateResult {
        self.last_result
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::{Landmark, LANDMARK_COUNT};

    fn frame() -> FrameSize {
        FrameSize::new(640, 480)
    }

    fn params() -> GateParams {
        let square = TargetSquare::centered(frame(), 0.9);
        GateParams {
            frame: frame(),
            square,
            z_threshold: flatness_threshold(0.05, square.side, Some(640.0)),
        }
    }

    /// Reference depths, with x/y packed around the frame center
    fn centered_flat_pose() -> HandPose {
        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (i, landmark) in landmarks.iter_mut().enumerate() {
            let reference = REFERENCE_POSE.landmark(i);
            *landmark = Landmark::new(0.4 + i as f32 * 0.01, 0.5, reference.z);
        }
        HandPose::new(landmarks)
    }

    fn with_landmark(pose: &HandPose, index: usize, landmark: Landmark) -> HandPose {
        let mut landmarks = *pose.landmarks();
        landmarks[index] = landmark;
        HandPose::new(landmarks)
    }

    #[test]
    fn test_centered_square() {
        let square = TargetSquare::centered(frame(), 0.9);
        assert!((square.side - 432.0).abs() < 1e-3);
        assert!((square.x - 104.0).abs() < 1e-3);
        assert!((square.y - 24.0).abs() < 1e-3);
    }

    #[test]
    fn test_containment_all_inside() {
        let p = params();
        assert!(landmarks_in_square(&centered_flat_pose(), &p.square, p.frame));
    }

    #[test]
    fn test_containment_single_landmark_outside() {
        let p = params();
        let pose = centered_flat_pose();
        for index in [WRIST, MIDDLE_PIP, 20] {
            let moved = with_landmark(&pose, index, Landmark::new(0.01, 0.5, pose.landmark(index).z));
            assert!(!landmarks_in_square(&moved, &p.square, p.frame));
        }
    }

    #[test]
    fn test_containment_edges_inclusive() {
        let square = TargetSquare::new(10.0, 10.0, 100.0);
        assert!(square.contains((10.0, 110.0)));
        assert!(!square.contains((110.5, 50.0)));
    }

    #[test]
    fn test_reference_pose_is_flat() {
        for threshold in [1e-6, 0.01, 0.05, 1.0] {
            assert!(is_hand_flat(&REFERENCE_POSE, threshold));
        }
    }

    #[test]
    fn test_perturbed_joint_is_not_flat() {
        for joint in FLATNESS_JOINTS {
            let reference = REFERENCE_POSE.landmark(joint);
            let bent = with_landmark(
                &REFERENCE_POSE,
                joint,
                Landmark::new(reference.x, reference.y, reference.z + 0.06),
            );
            assert!(!is_hand_flat(&bent, 0.05), "joint {joint} should fail");
        }
    }

    #[test]
    fn test_unchecked_joint_is_ignored() {
        let tip = REFERENCE_POSE.landmark(8);
        let bent = with_landmark(&REFERENCE_POSE, 8, Landmark::new(tip.x, tip.y, tip.z + 1.0));
        assert!(is_hand_flat(&bent, 0.05));
    }

    #[test]
    fn test_threshold_scaling() {
        assert!((flatness_threshold(0.05, 320.0, Some(640.0)) - 0.025).abs() < 1e-6);
        assert_eq!(flatness_threshold(0.05, 320.0, None), 0.05);
    }

    #[test]
    fn test_gate_retains_only_passing_pose() {
        let p = params();
        let mut gate = HandPoseGate::new();

        let good = centered_flat_pose();
        assert!(gate.evaluate(&[good], &p).passed());
        assert_eq!(gate.best_pose(), Some(&good));
        assert!(gate.capture_permitted());

        let outside = with_landmark(&good, WRIST, Landmark::new(0.0, 0.0, 0.0));
        let result = gate.evaluate(&[outside], &p);
        assert!(result.hand_detected && !result.in_region);
        assert_eq!(gate.best_pose(), None);
        assert!(!gate.capture_permitted());
    }

    #[test]
    fn test_gate_no_hand() {
        let mut gate = HandPoseGate::new();
        let result = gate.evaluate(&[], &params());
        assert_eq!(result, FrameGateResult::default());
        assert!(!gate.capture_permitted());
    }

    #[test]
    fn test_gate_picks_passing_hand_among_several() {
        let p = params();
        let good = centered_flat_pose();
        let outside = with_landmark(&good, WRIST, Landmark::new(0.0, 0.0, 0.0));
        let mut gate = HandPoseGate::new();
        assert!(gate.evaluate(&[outside, good], &p).passed());
        assert_eq!(gate.best_pose(), Some(&good));
    }
}
