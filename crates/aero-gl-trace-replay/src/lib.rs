//! Replays recorded legacy GL call traces through [`aero_gl::GlContext`] on a
//! [`aero_gl::RecordingDevice`].

mod replay;
mod trace;

pub use replay::{apply, parse_trace, replay_calls, DeviceSummary, ReplayError, ReplaySummary, TraceRecord};
pub use trace::{ClientData, Param, Pointer, TraceCall};
