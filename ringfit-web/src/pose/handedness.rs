//! Left/right hand classification from palm orientation
//!
//! Cross product of wrist→thumb base and wrist→pinky base; the sign of its
//! z component tells which way the palm winds in the image.

use nalgebra::Vector3;

use super::landmark::{HandPose, Landmark, PINKY_MCP, THUMB_CMC, WRIST};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub fn name(&self) -> &'static str {
        match self {
            HandSide::Left => "left",
            HandSide::Right => "right",
        }
    }
}

fn to_vector(landmark: Landmark) -> Vector3<f32> {
    Vector3::new(landmark.x, landmark.y, landmark.z)
}

/// z component of (thumb - wrist) × (pinky - wrist)
pub fn palm_winding(pose: &HandPose) -> f32 {
    let wrist = to_vector(pose.landmark(WRIST));
    let to_thumb = to_vector(pose.landmark(THUMB_CMC)) - wrist;
    let to_pinky = to_vector(pose.landmark(PINKY_MCP)) - wrist;
    to_thumb.cross(&to_pinky).z
}

/// Positive winding is a right hand, anything else a left hand
pub fn classify_hand_side(pose: &HandPose) -> HandSide {
    if palm_winding(pose) > 0.0 {
        HandSide::Right
    } else {
        HandSide::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::landmark::LANDMARK_COUNT;

    fn hand(wrist: (f32, f32), thumb: (f32, f32), pinky: (f32, f32)) -> HandPose {
        let mut landmarks = [Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        landmarks[WRIST] = Landmark::new(wrist.0, wrist.1, 0.0);
        landmarks[THUMB_CMC] = Landmark::new(thumb.0, thumb.1, -0.01);
        landmarks[PINKY_MCP] = Landmark::new(pinky.0, pinky.1, -0.03);
        HandPose::new(landmarks)
    }

    fn mirror(pose: &HandPose) -> HandPose {
        HandPose::new(pose.landmarks().map(|l| Landmark::new(1.0 - l.x, l.y, l.z)))
    }

    #[test]
    fn test_right_hand_winding() {
        let right = hand((0.5, 0.8), (0.4, 0.7), (0.6, 0.6));
        assert!(palm_winding(&right) > 0.0);
        assert_eq!(classify_hand_side(&right), HandSide::Right);
    }

    #[test]
    fn test_mirroring_flips_side() {
        let right = hand((0.5, 0.8), (0.4, 0.7), (0.6, 0.6));
        let left = mirror(&right);
        assert!(palm_winding(&left) < 0.0);
        assert_eq!(classify_hand_side(&left), HandSide::Left);
        assert!((palm_winding(&left) + palm_winding(&right)).abs() < 1e-6);
    }

    #[test]
    fn test_collinear_defaults_to_left() {
        let flat = hand((0.5, 0.8), (0.5, 0.7), (0.5, 0.6));
        assert_eq!(classify_hand_side(&flat), HandSide::Left);
    }
}
