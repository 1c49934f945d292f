//! Ringfit Web - ring try-on placement from hand landmarks
//!
//! Entry point for WASM module. Only contains:
//! - Module declarations
//! - wasm_bindgen entry points that delegate to submodules
//!
//! The `pose` and `pipeline` modules are plain Rust and usable natively.

mod bridge;
pub mod pipeline;
pub mod pose;

use wasm_bindgen::prelude::*;

// Re-export wasm_bindgen functions for JS access
pub use bridge::{
    capture_ring, capture_ring_from_live, configure, configure_preset, detector_mode_change,
    get_gate_flags, get_target_square, is_capture_permitted, next_video_timestamp,
    process_hand_landmarks, resize_frame, skin_cutout, start_session, stop_session,
    TRANSFORM_STRIDE,
};

// ============================================================================
// WASM ENTRY POINTS
// ============================================================================

/// Called automatically when WASM module loads
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
    bridge::init_logging(pipeline::PipelineConfig::default().log_level_filter());
    log::info!("ringfit-web {} loaded", env!("CARGO_PKG_VERSION"));
}
