//! Pipeline configuration - one record for every try-on variant
//!
//! Guide square size, flatness tolerance, ring placement tunables and
//! smoothing noise all live here, so the variants differ only in data.

use serde::{Deserialize, Serialize};

use crate::pose::{
    flatness_threshold, CameraFacing, FrameSize, GateParams, PoseError, TargetSquare,
    TransformParams,
};

/// Tunables for gating, placement and smoothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Guide square side as a fraction of the frame's shorter side
    pub square_fraction: f32,
    /// Base depth tolerance for the flatness check
    pub z_threshold: f32,
    /// Scale `z_threshold` by `square side / reference_resolution`
    pub scale_threshold_by_square: bool,
    pub reference_resolution: f32,
    /// Measure finger width from the skin mask on capture
    pub use_segmentation_refinement: bool,
    /// Maximum hands examined per frame
    pub num_hands: usize,
    /// Ring center along middle MCP → PIP
    pub anchor_fraction: f32,
    /// Ring side / finger width
    pub width_multiplier: f32,
    pub rotation_offset_deg: f32,
    /// Kalman R for the anchor filters
    pub measurement_noise: f32,
    /// Kalman Q for the anchor filters
    pub process_noise: f32,
    pub right_hand_offset_pct: f32,
    pub left_hand_offset_pct: f32,
    /// 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
    pub log_level: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            square_fraction: 0.9,
            z_threshold: 0.05,
            scale_threshold_by_square: true,
            reference_resolution: 640.0,
            use_segmentation_refinement: false,
            num_hands: 1,
            anchor_fraction: 0.6,
            width_multiplier: 0.9,
            rotation_offset_deg: 90.0,
            measurement_noise: 1.0,
            process_noise: 3.0,
            right_hand_offset_pct: -56.0,
            left_hand_offset_pct: -42.0,
            log_level: 3,
        }
    }
}

impl PipelineConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, PoseError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PoseError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Named variants of the try-on flow
    ///
    /// - `guided`: default capture flow, landmark width
    /// - `midpoint`: ring at the segment midpoint, unscaled tolerance
    /// - `segmented`: mask-measured width on capture
    /// - `preview`: two hands, looser gate, landmark width
    pub fn preset(name: &str) -> Option<Self> {
        let base = Self::default();
        match name {
            "guided" => Some(base),
            "midpoint" => Some(Self {
                anchor_fraction: 0.5,
                width_multiplier: 0.95,
                scale_threshold_by_square: false,
                ..base
            }),
            "segmented" => Some(Self {
                use_segmentation_refinement: true,
                width_multiplier: 1.0,
                ..base
            }),
            "preview" => Some(Self {
                num_hands: 2,
                z_threshold: 0.035,
                scale_threshold_by_square: false,
                ..base
            }),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), PoseError> {
        let positive = [
            ("square_fraction", self.square_fraction),
            ("z_threshold", self.z_threshold),
            ("reference_resolution", self.reference_resolution),
            ("width_multiplier", self.width_multiplier),
            ("measurement_noise", self.measurement_noise),
            ("process_noise", self.process_noise),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PoseError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.square_fraction > 1.0 {
            return Err(PoseError::InvalidConfig(format!(
                "square_fraction must be at most 1, got {}",
                self.square_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.anchor_fraction) {
            return Err(PoseError::InvalidConfig(format!(
                "anchor_fraction must be within [0, 1], got {}",
                self.anchor_fraction
            )));
        }
        let finite = [
            self.rotation_offset_deg,
            self.right_hand_offset_pct,
            self.left_hand_offset_pct,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(PoseError::InvalidConfig("offsets must be finite".into()));
        }
        if self.num_hands == 0 {
            return Err(PoseError::InvalidConfig("num_hands must be at least 1".into()));
        }
        Ok(())
    }

    pub fn target_square(&self, frame: FrameSize) -> TargetSquare {
        TargetSquare::centered(frame, self.square_fraction)
    }

    pub fn gate_params(&self, frame: FrameSize) -> GateParams {
        let square = self.target_square(frame);
        let reference = self
            .scale_threshold_by_square
            .then_some(self.reference_resolution);
        GateParams {
            frame,
            square,
            z_threshold: flatness_threshold(self.z_threshold, square.side, reference),
        }
    }

    pub fn transform_params(&self, frame: FrameSize, facing: CameraFacing) -> TransformParams {
        TransformParams {
            frame,
            facing,
            anchor_fraction: self.anchor_fraction,
            width_multiplier: self.width_multiplier,
            rotation_offset_deg: self.rotation_offset_deg,
            right_hand_offset_pct: self.right_hand_offset_pct,
            left_hand_offset_pct: self.left_hand_offset_pct,
        }
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.log_level {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json(r#"{"square_fraction": 0.8, "num_hands": 2}"#).unwrap();
        assert_eq!(config.square_fraction, 0.8);
        assert_eq!(config.num_hands, 2);
        assert_eq!(config.anchor_fraction, 0.6);
        assert_eq!(config.z_threshold, 0.05);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(PipelineConfig::from_json(r#"{"z_threshold": -1.0}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"square_fraction": 1.5}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"anchor_fraction": 2.0}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"num_hands": 0}"#).is_err());
        assert!(matches!(
            PipelineConfig::from_json("not json"),
            Err(PoseError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_presets_are_valid() {
        for name in ["guided", "midpoint", "segmented", "preview"] {
            let config = PipelineConfig::preset(name).unwrap();
            assert!(config.validate().is_ok(), "{name}");
        }
        assert!(PipelineConfig::preset("unknown").is_none());
        assert!(PipelineConfig::preset("segmented").unwrap().use_segmentation_refinement);
    }

    #[test]
    fn test_gate_params_scaling() {
        let frame = FrameSize::new(640, 480);
        let scaled = PipelineConfig::default().gate_params(frame);
        assert!((scaled.square.side - 432.0).abs() < 1e-3);
        assert!((scaled.z_threshold - 0.05 * 432.0 / 640.0).abs() < 1e-6);

        let unscaled = PipelineConfig::preset("midpoint").unwrap().gate_params(frame);
        assert_eq!(unscaled.z_threshold, 0.05);
    }

    #[test]
    fn test_log_level_mapping() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
        config.log_level = 0;
        assert_eq!(config.log_level_filter(), log::LevelFilter::Off);
    }
}
