#![forbid(unsafe_code)]

pub mod observe;
pub mod progression;

pub use observe::{NullTelemetry, TelemetryHook, TelemetrySample};
pub use progression::{ProgressionRuntime, ProgressionWiringConfig, TransitionError};
