//! Try-on session storage and JS bridge
//!
//! Holds the page's single session and exposes it to JavaScript. Landmarks
//! arrive as flat Float32Arrays, masks as Uint8Arrays of label indices.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use crate::pipeline::{FrameOutput, PipelineConfig, RunningMode, StillFrame, TryOnSession};
use crate::pose::{
    alpha_mask, category_mask_from_raw, cutout_rgba, poses_from_flat, rgba_frame_from_raw,
    skin_category, CameraFacing, FrameSize, PoseError, RingTransform,
};

/// Floats per flattened transform:
/// `[x, y, rotation_deg, side_px, mirrored, lateral_offset_pct]`
pub const TRANSFORM_STRIDE: usize = 6;

#[derive(Default)]
struct BridgeState {
    session: TryOnSession,
    last_output: FrameOutput,
}

// Thread-local storage (WASM is single-threaded)
thread_local! {
    static STATE: RefCell<BridgeState> = RefCell::new(BridgeState::default());
}

impl From<PoseError> for JsValue {
    fn from(err: PoseError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

pub fn transform_to_js(transform: &RingTransform) -> Vec<f32> {
    vec![
        transform.x,
        transform.y,
        transform.rotation_degrees,
        transform.scale_px,
        if transform.mirrored { 1.0 } else { 0.0 },
        transform.lateral_offset_pct,
    ]
}

/// `[hand_detected, in_region, is_flat, capture_permitted]` as 0/1
pub fn gate_flags(output: &FrameOutput) -> Vec<u8> {
    [
        output.gate.hand_detected,
        output.gate.in_region,
        output.gate.is_flat,
        output.capture_permitted,
    ]
    .map(u8::from)
    .to_vec()
}

/// Build still-frame detections from raw detector output.
///
/// No hands reuses the live pose; an empty mask skips refinement.
fn decode_still(
    flat_data: &[f32],
    num_hands: usize,
    mask: Vec<u8>,
    frame: FrameSize,
    labels: &[String],
) -> Result<StillFrame, PoseError> {
    let pose = poses_from_flat(flat_data, num_hands)?.into_iter().next();
    if mask.is_empty() {
        return Ok(StillFrame {
            pose,
            categories: None,
            skin_category: 0,
        });
    }

    let skin = skin_category(labels)?;
    let categories = category_mask_from_raw(frame.width, frame.height, mask)?;
    Ok(StillFrame {
        pose,
        categories: Some(categories),
        skin_category: skin,
    })
}

fn skin_cutout_pixels(
    rgba: Vec<u8>,
    mask: Vec<u8>,
    width: u32,
    height: u32,
    labels: &[String],
) -> Result<Vec<u8>, PoseError> {
    let frame = rgba_frame_from_raw(width, height, rgba)?;
    let categories = category_mask_from_raw(width, height, mask)?;
    let alpha = alpha_mask(&categories, skin_category(labels)?);
    Ok(cutout_rgba(&frame, &alpha)?.into_raw())
}

fn js_strings(array: &js_sys::Array) -> Vec<String> {
    array.iter().filter_map(|value| value.as_string()).collect()
}

fn apply_config(config: PipelineConfig) -> Result<(), JsValue> {
    log::set_max_level(config.log_level_filter());
    STATE.with(|state_cell| state_cell.borrow_mut().session.set_config(config))?;
    Ok(())
}

// ============================================================================
// WASM-BINDGEN ENTRY POINTS
// ============================================================================

/// Replace the pipeline config with a (partial) JSON record
#[wasm_bindgen]
pub fn configure(json: &str) -> Result<(), JsValue> {
    apply_config(PipelineConfig::from_json(json)?)
}

/// Switch to a named variant: guided, midpoint, segmented or preview
#[wasm_bindgen]
pub fn configure_preset(name: &str) -> Result<(), JsValue> {
    let config = PipelineConfig::preset(name)
        .ok_or_else(|| PoseError::InvalidConfig(format!("unknown preset '{name}'")))?;
    apply_config(config)
}

#[wasm_bindgen]
pub fn start_session(width: u32, height: u32, user_facing: bool) {
    let facing = if user_facing {
        CameraFacing::User
    } else {
        CameraFacing::Environment
    };
    STATE.with(|state_cell| {
        let mut state = state_cell.borrow_mut();
        state.session.start(FrameSize::new(width, height), facing);
        state.last_output = FrameOutput::default();
    });
}

#[wasm_bindgen]
pub fn resize_frame(width: u32, height: u32) {
    STATE.with(|state_cell| {
        state_cell
            .borrow_mut()
            .session
            .resize(FrameSize::new(width, height))
    });
}

#[wasm_bindgen]
pub fn stop_session() {
    STATE.with(|state_cell| {
        let mut state = state_cell.borrow_mut();
        state.session.stop();
        state.last_output = FrameOutput::default();
    });
}

/// Called once per video frame with `num_hands * 63` floats.
///
/// Returns the flattened ring transform when the gate passed, else `None`.
/// A malformed buffer counts as a frame without hands.
#[wasm_bindgen]
pub fn process_hand_landmarks(flat_data: &[f32], num_hands: usize) -> Option<Vec<f32>> {
    let poses = poses_from_flat(flat_data, num_hands).unwrap_or_else(|err| {
        log::warn!("{}", err);
        Vec::new()
    });

    STATE.with(|state_cell| {
        let mut state = state_cell.borrow_mut();
        let output = state.session.process_frame(&poses);
        state.last_output = output;
        output.transform.as_ref().map(transform_to_js)
    })
}

#[wasm_bindgen]
pub fn get_gate_flags() -> Vec<u8> {
    STATE.with(|state_cell| gate_flags(&state_cell.borrow().last_output))
}

#[wasm_bindgen]
pub fn is_capture_permitted() -> bool {
    STATE.with(|state_cell| state_cell.borrow().session.capture_permitted())
}

/// Guide square as `[x, y, side]` in canvas pixels
#[wasm_bindgen]
pub fn get_target_square() -> Vec<f32> {
    STATE.with(|state_cell| {
        let square = state_cell.borrow().session.target_square();
        vec![square.x, square.y, square.side]
    })
}

/// Timestamp (ms) for the next `detectForVideo` call
#[wasm_bindgen]
pub fn next_video_timestamp() -> f64 {
    let now = js_sys::Date::now();
    STATE.with(|state_cell| state_cell.borrow_mut().session.next_timestamp(now))
}

/// Returns `true` when the detector must be reconfigured before the call
#[wasm_bindgen]
pub fn detector_mode_change(video: bool) -> bool {
    let mode = if video {
        RunningMode::Video
    } else {
        RunningMode::Image
    };
    STATE.with(|state_cell| state_cell.borrow_mut().session.require_mode(mode))
}

/// Capture using the last accepted live pose and landmark width
#[wasm_bindgen]
pub fn capture_ring_from_live() -> Result<Vec<f32>, JsValue> {
    let result = STATE.with(|state_cell| state_cell.borrow_mut().session.capture(None))?;
    Ok(transform_to_js(&result.transform))
}

/// Capture on a still frame.
///
/// `flat_data` holds the still's landmarks (may be empty), `mask` one
/// segmentation label per pixel (may be empty) and `labels` the
/// segmenter's category names.
#[wasm_bindgen]
pub fn capture_ring(
    flat_data: &[f32],
    num_hands: usize,
    mask: Vec<u8>,
    labels: js_sys::Array,
) -> Result<Vec<f32>, JsValue> {
    let labels = js_strings(&labels);
    let result = STATE.with(|state_cell| {
        let mut state = state_cell.borrow_mut();
        let still = decode_still(flat_data, num_hands, mask, state.session.frame(), &labels)?;
        state.session.capture(Some(still))
    })?;
    Ok(transform_to_js(&result.transform))
}

/// RGBA copy of the frame with non-skin pixels made transparent
#[wasm_bindgen]
pub fn skin_cutout(
    rgba: Vec<u8>,
    mask: Vec<u8>,
    width: u32,
    height: u32,
    labels: js_sys::Array,
) -> Result<Vec<u8>, JsValue> {
    Ok(skin_cutout_pixels(rgba, mask, width, height, &js_strings(&labels))?)
}
