#![forbid(unsafe_code)]

use mentor_kernel_contracts::progression::LearnerPhase;

/// One per-call measurement handed to the external metrics collector. The
/// engine defines only this shape; transport and storage belong to the
/// collector.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySample<'a> {
    pub operation: &'static str,
    pub elapsed_ns: u64,
    pub phase: LearnerPhase,
    pub learner_id: &'a str,
}

/// Seam for the external observability collaborator. Implementations must
/// be cheap and non-blocking; they run on the compute hot path.
pub trait TelemetryHook: Send + Sync {
    fn record(&self, sample: &TelemetrySample<'_>);
}

/// Default hook: drops every sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTelemetry;

impl TelemetryHook for NullTelemetry {
    fn record(&self, _sample: &TelemetrySample<'_>) {}
}
