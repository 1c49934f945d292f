//! Try-on session - explicit state for one camera run
//!
//! Owns everything that survives between frames: the gate's accepted pose,
//! the anchor smoothing filters, the detector mode and the frame clock.
//! Starting a session resets the pose, filters and clock; capture stops it.
//! The detector mode follows the host's reconfigurations, not the session.

use image::GrayImage;

use crate::pose::{
    alpha_mask, estimate_finger_width, CameraFacing, FrameGateResult, FrameSize, HandPose,
    HandPoseGate, PoseError, RingTransform, RingTransformEstimator, TargetSquare, WidthEstimate,
};

use super::clock::FrameClock;
use super::config::PipelineConfig;

/// Running mode the host's detector is configured in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunningMode {
    #[default]
    Image,
    Video,
}

/// Per-frame result for the rendering layer
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameOutput {
    pub gate: FrameGateResult,
    pub capture_permitted: bool,
    pub transform: Option<RingTransform>,
}

/// Still frame detections handed over on capture
#[derive(Clone, Debug)]
pub struct StillFrame {
    /// Landmarks detected on the still; `None` reuses the gate's pose
    pub pose: Option<HandPose>,
    /// Per-pixel segmentation labels, same size as the frame
    pub categories: Option<GrayImage>,
    pub skin_category: u8,
}

/// Final placement after a capture
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureResult {
    pub transform: RingTransform,
    pub refinement: Option<WidthEstimate>,
}

pub struct TryOnSession {
    config: PipelineConfig,
    frame: FrameSize,
    facing: CameraFacing,
    running: bool,
    mode: RunningMode,
    gate: HandPoseGate,
    estimator: RingTransformEstimator,
    clock: FrameClock,
    frames_processed: u64,
}

impl TryOnSession {
    pub fn new(config: PipelineConfig) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self::with_checked_config(config))
    }

    fn with_checked_config(config: PipelineConfig) -> Self {
        let estimator = RingTransformEstimator::new(config.measurement_noise, config.process_noise);
        Self {
            config,
            frame: FrameSize::new(0, 0),
            facing: CameraFacing::default(),
            running: false,
            mode: RunningMode::default(),
            gate: HandPoseGate::new(),
            estimator,
            clock: FrameClock::new(),
            frames_processed: 0,
        }
    }

    /// Swap the config; the smoothing filters restart with the new noise
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<(), PoseError> {
        config.validate()?;
        self.estimator = RingTransformEstimator::new(config.measurement_noise, config.process_noise);
        self.gate.reset();
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Begin a camera run; all per-session state starts fresh
    pub fn start(&mut self, frame: FrameSize, facing: CameraFacing) {
        self.frame = frame;
        self.facing = facing;
        self.gate.reset();
        self.estimator.reset();
        self.clock.reset();
        self.frames_processed = 0;
        self.running = true;
        log::info!(
            "session started: {}x{}, {:?} camera",
            frame.width,
            frame.height,
            facing
        );
    }

    /// Stop signal from the host; no further frames are processed
    pub fn stop(&mut self) {
        if self.running {
            log::info!("session stopped after {} frames", self.frames_processed);
        }
        self.running = false;
        self.gate.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Frame size changed mid-session (e.g. video metadata arrived)
    pub fn resize(&mut self, frame: FrameSize) {
        if frame != self.frame {
            log::debug!("frame resized to {}x{}", frame.width, frame.height);
            self.frame = frame;
        }
    }

    pub fn frame(&self) -> FrameSize {
        self.frame
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Record the mode needed for the next detector call.
    ///
    /// Returns `true` when the host must reconfigure the detector first.
    /// Session start leaves the recorded mode untouched; only the host's
    /// reconfiguration changes it.
    pub fn require_mode(&mut self, mode: RunningMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }

    pub fn mode(&self) -> RunningMode {
        self.mode
    }

    /// Strictly increasing timestamp for the video detector
    pub fn next_timestamp(&mut self, now_ms: f64) -> f64 {
        self.clock.next(now_ms)
    }

    pub fn target_square(&self) -> TargetSquare {
        self.config.target_square(self.frame)
    }

    pub fn capture_permitted(&self) -> bool {
        self.running && self.gate.capture_permitted()
    }

    // ========================================================================
    // PER FRAME
    // ========================================================================

    /// Gate one live frame and, if it passes, place the ring
    pub fn process_frame(&mut self, poses: &[HandPose]) -> FrameOutput {
        if !self.running {
            return FrameOutput::default();
        }
        self.frames_processed += 1;

        let hands = &poses[..poses.len().min(self.config.num_hands)];
        let gate = self.gate.evaluate(hands, &self.config.gate_params(self.frame));

        let Some(pose) = self.gate.best_pose().copied() else {
            return FrameOutput {
                gate,
                capture_permitted: false,
                transform: None,
            };
        };

        let params = self.config.transform_params(self.frame, self.facing);
        match self.estimator.estimate_live(&pose, &params) {
            Ok(transform) => FrameOutput {
                gate,
                capture_permitted: true,
                transform: Some(transform),
            },
            Err(err) => {
                log::debug!("frame {} skipped: {}", self.frames_processed, err);
                self.gate.reject();
                FrameOutput {
                    gate,
                    capture_permitted: false,
                    transform: None,
                }
            }
        }
    }

    // ========================================================================
    // CAPTURE
    // ========================================================================

    /// Place the ring on a captured still and end the session.
    ///
    /// Requires the gate to have accepted the latest live frame. With
    /// segmentation refinement enabled and a mask supplied, the finger width
    /// is measured on the mask; otherwise the landmark width is used.
    pub fn capture(&mut self, still: Option<StillFrame>) -> Result<CaptureResult, PoseError> {
        if !self.running {
            return Err(PoseError::SessionNotRunning);
        }
        let live_pose = match self.gate.best_pose() {
            Some(pose) if self.gate.capture_permitted() => *pose,
            _ => return Err(PoseError::NoStablePose),
        };

        let (pose, categories, skin) = match still {
            Some(still) => (
                still.pose.unwrap_or(live_pose),
                still.categories,
                still.skin_category,
            ),
            None => (live_pose, None, 0),
        };

        let refinement = match categories {
            Some(categories) if self.config.use_segmentation_refinement => {
                let alpha = alpha_mask(&categories, skin);
                Some(estimate_finger_width(&pose, &alpha, self.frame)?)
            }
            _ => None,
        };

        let params = self.config.transform_params(self.frame, self.facing);
        let refined_width = refinement.map(|r| r.width_px);
        let transform = RingTransformEstimator::estimate_still(&pose, &params, refined_width)?;

        log::info!(
            "captured {} hand: ring {:.1}px at ({:.1}, {:.1}), {:.1}°",
            transform.hand_side.name(),
            transform.scale_px,
            transform.x,
            transform.y,
            transform.rotation_degrees
        );

        self.stop();
        Ok(CaptureResult {
            transform,
            refinement,
        })
    }
}

impl Default for TryOnSession {
    fn default() -> Self {
        Self::with_checked_config(PipelineConfig::default())
    }
}
