//! Pipeline module - configuration and per-session state
//!
//! Re-exports only. All logic in submodules.

mod clock;
mod config;
mod session;

pub use clock::FrameClock;
pub use config::PipelineConfig;
pub use session::{CaptureResult, FrameOutput, RunningMode, StillFrame, TryOnSession};
