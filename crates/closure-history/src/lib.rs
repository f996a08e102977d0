//! Closure and Nodding History
//!
//! Bounded sliding windows over per-frame vision samples:
//! - Eye-closed booleans for PERCLOS
//! - Head pitch for nodding detection
//! - Continuous eye-closure timer

mod closure;
mod pitch;
mod timer;
mod tracker;
mod window;

pub use closure::ClosureWindow;
pub use pitch::{PitchStats, PitchWindow};
pub use timer::ClosureTimer;
pub use tracker::{HistoryConfig, HistoryTracker};
pub use window::SlidingWindow;
