//! Bridge module - JS ↔ Rust communication
//!
//! All #[wasm_bindgen] entry points live here.
//! Re-exports only in mod.rs, logic in submodules.

mod console;
mod session;

pub use console::init_logging;

pub use session::{
    // WASM entry points
    capture_ring,
    capture_ring_from_live,
    configure,
    configure_preset,
    detector_mode_change,
    get_gate_flags,
    get_target_square,
    is_capture_permitted,
    next_video_timestamp,
    process_hand_landmarks,
    resize_frame,
    skin_cutout,
    start_session,
    stop_session,
    // Constants
    TRANSFORM_STRIDE,
};
