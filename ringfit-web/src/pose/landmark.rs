//! Hand landmark types and the calibration reference pose
//!
//! Landmarks arrive from the MediaPipe hand landmarker as normalized
//! coordinates: x/y in [0, 1] relative to the frame, z a small signed depth.

use super::error::PoseError;

// ============================================================================
// HAND LANDMARK INDICES (MediaPipe Hands - 21 total)
// ============================================================================

pub const LANDMARK_COUNT: usize = 21;

/// Floats per landmark in the flat buffer handed over by JS
pub const VALUES_PER_LANDMARK: usize = 3;

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const PINKY_MCP: usize = 17;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A single 3D landmark point (normalized coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    pub z: f32, // Relative depth
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Project onto a pixel grid of the given size
    pub fn to_pixels(&self, frame: FrameSize) -> (f32, f32) {
        (self.x * frame.width as f32, self.y * frame.height as f32)
    }
}

/// Pixel dimensions of the canvas the landmarks are projected onto
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height) as f32
    }
}

/// All 21 landmarks of one detected hand, in MediaPipe order.
///
/// The array length makes the landmark count a type-level invariant; the
/// only fallible step is decoding from the detector's flat buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    landmarks: [Landmark; LANDMARK_COUNT],
}

impl HandPose {
    pub const fn new(landmarks: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    /// Decode one hand from `[x0, y0, z0, x1, y1, z1, ...]` (63 floats)
    pub fn from_flat(data: &[f32]) -> Result<Self, PoseError> {
        let expected = LANDMARK_COUNT * VALUES_PER_LANDMARK;
        if data.len() != expected {
            return Err(PoseError::MalformedLandmarks {
                expected,
                actual: data.len(),
            });
        }

        let mut landmarks = [Landmark::default(); LANDMARK_COUNT];
        for (landmark, xyz) in landmarks.iter_mut().zip(data.chunks_exact(VALUES_PER_LANDMARK)) {
            *landmark = Landmark::new(xyz[0], xyz[1], xyz[2]);
        }
        Ok(Self { landmarks })
    }

    pub fn landmark(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }

    pub fn landmarks(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.landmarks
    }

    /// Pixel position of one landmark
    pub fn pixel(&self, index: usize, frame: FrameSize) -> (f32, f32) {
        self.landmarks[index].to_pixels(frame)
    }
}

impl Default for HandPose {
    fn default() -> Self {
        Self::new([Landmark::default(); LANDMARK_COUNT])
    }
}

/// Decode every hand in a multi-hand flat buffer.
///
/// The buffer must hold exactly `num_hands * 63` floats; a short or long
/// buffer rejects the whole frame instead of reading past a hand boundary.
pub fn poses_from_flat(data: &[f32], num_hands: usize) -> Result<Vec<HandPose>, PoseError> {
    let per_hand = LANDMARK_COUNT * VALUES_PER_LANDMARK;
    let expected = num_hands.checked_mul(per_hand).ok_or(PoseError::MalformedLandmarks {
        expected: usize::MAX,
        actual: data.len(),
    })?;
    if data.len() != expected {
        return Err(PoseError::MalformedLandmarks {
            expected,
            actual: data.len(),
        });
    }
    data.chunks_exact(per_hand).map(HandPose::from_flat).collect()
}

// ============================================================================
// REFERENCE POSE
// ============================================================================

/// Flat open hand held square to the camera, recorded once from the
/// detector. Only the z column is used, as a per-joint depth baseline.
pub const REFERENCE_POSE: HandPose = HandPose::new([
    Landmark::new(0.484_305_65, 0.811_085_46, 5.423_733_6e-7),
    Landmark::new(0.550_202_37, 0.734_880_7, -0.009_480_2),
    Landmark::new(0.589_587_9, 0.645_168_84, -0.021_786_006),
    Landmark::new(0.615_73, 0.546_079_2, -0.032_154_25),
    Landmark::new(0.646_448_9, 0.479_074_9, -0.043_226_02),
    Landmark::new(0.531_158_27, 0.509_684_3, -0.030_539_619),
    Landmark::new(0.554_233_3, 0.371_182_62, -0.044_056_404),
    Landmark::new(0.564_358_5, 0.288_001_36, -0.050_699_46),
    Landmark::new(0.571_424_07, 0.228_133_89, -0.055_220_43),
    Landmark::new(0.483_373_17, 0.499_543_13, -0.033_838_082),
    Landmark::new(0.487_073_36, 0.336_614_97, -0.047_285_67),
    Landmark::new(0.488_981_25, 0.242_554_1, -0.052_544_754),
    Landmark::new(0.490_909_1, 0.176_313_28, -0.056_235_34),
    Landmark::new(0.440_474_63, 0.518_342_3, -0.036_675_22),
    Landmark::new(0.433_072_12, 0.362_076_88, -0.050_330_4),
    Landmark::new(0.431_870_4, 0.270_070_52, -0.059_464_604),
    Landmark::new(0.434_102_54, 0.201_865_73, -0.065_923_13),
    Landmark::new(0.404_581_13, 0.554_827_3, -0.038_843_442),
    Landmark::new(0.380_648_8, 0.445_825_7, -0.054_020_99),
    Landmark::new(0.368_934_57, 0.376_631_32, -0.061_909_623),
    Landmark::new(0.362_724_15, 0.314_471_7, -0.065_923_13),
]);

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand(offset: f32) -> Vec<f32> {
        (0..LANDMARK_COUNT)
            .flat_map(|i| [offset + i as f32 * 0.01, 0.5, -0.01])
            .collect()
    }

    #[test]
    fn test_from_flat_keeps_order() {
        let pose = HandPose::from_flat(&flat_hand(0.1)).unwrap();
        assert_eq!(pose.landmark(WRIST).x, 0.1);
        assert!((pose.landmark(MIDDLE_PIP).x - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        let err = HandPose::from_flat(&[0.0; 60]).unwrap_err();
        assert_eq!(err, PoseError::MalformedLandmarks { expected: 63, actual: 60 });
    }

    #[test]
    fn test_poses_from_flat_two_hands() {
        let mut data = flat_hand(0.1);
        data.extend(flat_hand(0.3));
        let poses = poses_from_flat(&data, 2).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[1].landmark(WRIST).x, 0.3);
    }

    #[test]
    fn test_poses_from_flat_rejects_partial_hand() {
        let mut data = flat_hand(0.1);
        data.pop();
        assert!(poses_from_flat(&data, 1).is_err());
        assert!(poses_from_flat(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_poses_from_flat_rejects_huge_hand_count() {
        let err = poses_from_flat(&[0.0; 63], usize::MAX / 2).unwrap_err();
        assert!(matches!(err, PoseError::MalformedLandmarks { actual: 63, .. }));
    }

    #[test]
    fn test_pixel_projection() {
        let frame = FrameSize::new(640, 480);
        let (x, y) = Landmark::new(0.5, 0.25, 0.0).to_pixels(frame);
        assert_eq!((x, y), (320.0, 120.0));
    }
}
