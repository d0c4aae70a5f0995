//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per render loop
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - animate from `FrameTime::elapsed`, which advances one unit per two seconds

mod frame_clock;

pub use frame_clock::{elapsed_seconds, FrameClock, FrameTime, TIME_SCALE_MS};
