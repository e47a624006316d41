#![forbid(unsafe_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use mentor_engines::interpret::DecisionPolicy;
use mentor_engines::noise::{GaussianNoise, NoiseSource, DEFAULT_STD_DEV};
use mentor_engines::normalize::{normalize_bundle, NormalizedSignals};
use mentor_engines::weights::WeightProfileTable;
use mentor_engines::ProgressionConfigError;
use mentor_kernel_contracts::progression::{
    DecisionRecord, LearnerId, LearnerPhase, SignalBundle, SignalKind, TransitionDiagnostics,
    TransitionWarning,
};
use mentor_kernel_contracts::session::LearnerSession;
use mentor_kernel_contracts::{ContractViolation, MonotonicTimeNs};
use mentor_storage::{SessionStore, StorageError, DEFAULT_SHARD_COUNT};

use crate::observe::{TelemetryHook, TelemetrySample};

pub mod reason_codes {
    use mentor_kernel_contracts::ReasonCodeId;

    // Progression reason-code namespace.
    pub const PROG_OK_TRANSITION_COMPUTE: ReasonCodeId = ReasonCodeId(0x5052_0001);

    pub const PROG_NORMALIZATION_FALLBACK: ReasonCodeId = ReasonCodeId(0x5052_00A1);
    pub const PROG_UNKNOWN_PHASE_FALLBACK: ReasonCodeId = ReasonCodeId(0x5052_00A2);
    pub const PROG_BUDGET_EXCEEDED: ReasonCodeId = ReasonCodeId(0x5052_00A3);

    pub const PROG_LEARNER_ID_INVALID: ReasonCodeId = ReasonCodeId(0x5052_00F1);
    pub const PROG_LOCK_CONTENTION: ReasonCodeId = ReasonCodeId(0x5052_00F2);
    pub const PROG_INTERNAL_PIPELINE_ERROR: ReasonCodeId = ReasonCodeId(0x5052_00F3);
}

pub const OP_TRANSITION_COMPUTE: &str = "progression.transition_compute";
pub const OP_BUDGET_EXCEEDED: &str = "progression.budget_exceeded";

/// Full configuration surface of the integration engine. Validated once at
/// construction and immutable afterwards; every number here is policy, not
/// an engine invariant.
#[derive(Debug, Clone)]
pub struct ProgressionWiringConfig {
    pub weight_table: WeightProfileTable,
    pub policy: DecisionPolicy,
    /// Learning rate applied to the integration value until the learner's
    /// first cycle produces an adaptive pair.
    pub alpha_default: f64,
    /// Exploration factor applied to the stochastic draw, same lifecycle.
    pub beta_default: f64,
    pub std_dev: f64,
    /// Soft budget. Exceeding it is reported, never enforced.
    pub latency_budget_ns: u64,
    pub lock_wait_budget_ns: u64,
}

impl ProgressionWiringConfig {
    pub fn mvp_v1() -> Self {
        Self {
            weight_table: WeightProfileTable::mvp_v1(),
            policy: DecisionPolicy::mvp_v1(),
            alpha_default: 0.7,
            beta_default: 0.15,
            std_dev: DEFAULT_STD_DEV,
            latency_budget_ns: 10_000_000,
            lock_wait_budget_ns: 250_000_000,
        }
    }

    pub fn validate(&self) -> Result<(), ProgressionConfigError> {
        self.weight_table.validate()?;
        self.policy.validate()?;
        let (alpha_lo, alpha_hi) = self.policy.alpha_range;
        if !self.alpha_default.is_finite()
            || self.alpha_default < alpha_lo
            || self.alpha_default > alpha_hi
        {
            return Err(ProgressionConfigError::InvalidDefaults);
        }
        let (beta_lo, beta_hi) = self.policy.beta_range;
        if !self.beta_default.is_finite()
            || self.beta_default < beta_lo
            || self.beta_default > beta_hi
        {
            return Err(ProgressionConfigError::InvalidDefaults);
        }
        if !self.std_dev.is_finite() || self.std_dev < 0.0 {
            return Err(ProgressionConfigError::InvalidStdDev { got: self.std_dev });
        }
        if self.latency_budget_ns == 0 {
            return Err(ProgressionConfigError::InvalidLatencyBudget);
        }
        if self.lock_wait_budget_ns == 0 {
            return Err(ProgressionConfigError::InvalidLockWaitBudget);
        }
        Ok(())
    }
}

/// The few ways a single cycle can fail outright. Everything else degrades
/// into warnings on a well-formed decision.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionError {
    InvalidLearnerId(ContractViolation),
    /// Retryable: the bounded lock wait ran out. No prior update was lost.
    LockContention { waited_ns: u64 },
    Internal(ContractViolation),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLearnerId(violation) => {
                write!(f, "invalid learner id: {violation:?}")
            }
            Self::LockContention { waited_ns } => {
                write!(f, "per-learner scope contended for {waited_ns}ns; retry")
            }
            Self::Internal(violation) => {
                write!(f, "failed to assemble decision record: {violation:?}")
            }
        }
    }
}

impl std::error::Error for TransitionError {}

impl From<StorageError> for TransitionError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::LockContention { waited_ns } => Self::LockContention { waited_ns },
        }
    }
}

/// The real-time state-transition integration engine. One synchronous
/// `transition_compute` per request; callers bring their own thread pool and
/// wire protocol.
pub struct ProgressionRuntime {
    config: ProgressionWiringConfig,
    store: SessionStore,
    noise: Mutex<Box<dyn NoiseSource>>,
    hook: Arc<dyn TelemetryHook>,
    epoch: Instant,
}

impl ProgressionRuntime {
    /// Entropy-backed runtime. Fails fast on any configuration defect; no
    /// partially configured runtime value exists.
    pub fn new(
        config: ProgressionWiringConfig,
        hook: Arc<dyn TelemetryHook>,
    ) -> Result<Self, ProgressionConfigError> {
        config.validate()?;
        let noise = GaussianNoise::from_entropy(config.std_dev)?;
        Ok(Self::assemble(config, Box::new(noise), hook))
    }

    /// Runtime with a caller-supplied randomness source, for seeded replay
    /// and deterministic verification.
    pub fn with_noise_source(
        config: ProgressionWiringConfig,
        noise: Box<dyn NoiseSource>,
        hook: Arc<dyn TelemetryHook>,
    ) -> Result<Self, ProgressionConfigError> {
        config.validate()?;
        Ok(Self::assemble(config, noise, hook))
    }

    fn assemble(
        config: ProgressionWiringConfig,
        noise: Box<dyn NoiseSource>,
        hook: Arc<dyn TelemetryHook>,
    ) -> Self {
        let store = SessionStore::with_shards(
            DEFAULT_SHARD_COUNT,
            Duration::from_nanos(config.lock_wait_budget_ns),
        );
        Self {
            config,
            store,
            noise: Mutex::new(noise),
            hook,
            epoch: Instant::now(),
        }
    }

    pub fn config(&self) -> &ProgressionWiringConfig {
        &self.config
    }

    /// One update cycle: resolve weights for the supplied phase, score the
    /// four payloads, apply the weighted-sum-plus-noise update under the
    /// learner's serialized scope, persist, and interpret the new state.
    pub fn transition_compute(
        &self,
        learner_id: &str,
        phase_label: &str,
        signals: &SignalBundle,
    ) -> Result<DecisionRecord, TransitionError> {
        let started = Instant::now();
        let learner = LearnerId::v1(learner_id.to_string())
            .map_err(TransitionError::InvalidLearnerId)?;

        let mut warnings: Vec<TransitionWarning> = Vec::new();
        let effective_phase = match LearnerPhase::parse(phase_label) {
            Some(phase) => phase,
            None => {
                warnings.push(TransitionWarning::UnknownPhaseFallback {
                    supplied_label: phase_label.to_string(),
                });
                LearnerPhase::fallback()
            }
        };

        let profile = self.config.weight_table.resolve(effective_phase);
        let NormalizedSignals { scores, fallbacks } = normalize_bundle(signals);
        warnings.extend(fallbacks);
        let integration: f64 = SignalKind::ORDERED
            .into_iter()
            .map(|kind| profile.weight(kind) * scores[kind.index()])
            .sum();

        let now = self.now();
        let (_session, (stochastic_draw, next_state, interpretation)) =
            self.store.update(&learner, now, |session| {
                let (alpha, beta) = match &session.adaptive {
                    Some(adaptive) => (adaptive.alpha_baseline, adaptive.beta_exploration),
                    None => (self.config.alpha_default, self.config.beta_default),
                };
                let draw = self.draw_noise();
                let next =
                    (session.state + alpha * integration + beta * draw).clamp(0.0, 1.0);
                let interpretation = self.config.policy.interpret(next, effective_phase);
                session.state = next;
                session.phase = effective_phase;
                session.adaptive = Some(interpretation.adaptive_parameters);
                (draw, next, interpretation)
            })?;

        let elapsed_ns = started.elapsed().as_nanos() as u64;
        if elapsed_ns > self.config.latency_budget_ns {
            warnings.push(TransitionWarning::PerformanceBudgetExceeded {
                elapsed_ns,
                budget_ns: self.config.latency_budget_ns,
            });
            self.hook.record(&TelemetrySample {
                operation: OP_BUDGET_EXCEEDED,
                elapsed_ns,
                phase: effective_phase,
                learner_id: learner.as_str(),
            });
        }

        let diagnostics =
            TransitionDiagnostics::v1(integration, stochastic_draw, elapsed_ns, warnings)
                .map_err(TransitionError::Internal)?;
        let record = DecisionRecord::v1(
            reason_codes::PROG_OK_TRANSITION_COMPUTE,
            next_state,
            interpretation.recommended_action,
            interpretation.confidence,
            interpretation.reasoning,
            interpretation.next_phase,
            interpretation.adaptive_parameters,
            diagnostics,
        )
        .map_err(TransitionError::Internal)?;

        self.hook.record(&TelemetrySample {
            operation: OP_TRANSITION_COMPUTE,
            elapsed_ns,
            phase: effective_phase,
            learner_id: learner.as_str(),
        });

        Ok(record)
    }

    /// Read-only projection of a learner's current session.
    pub fn session_snapshot(
        &self,
        learner_id: &str,
    ) -> Result<Option<LearnerSession>, TransitionError> {
        let learner = LearnerId::v1(learner_id.to_string())
            .map_err(TransitionError::InvalidLearnerId)?;
        Ok(self.store.snapshot(&learner)?)
    }

    pub fn tracked_learners(&self) -> usize {
        self.store.len()
    }

    fn now(&self) -> MonotonicTimeNs {
        MonotonicTimeNs(self.epoch.elapsed().as_nanos() as u64)
    }

    fn draw_noise(&self) -> f64 {
        self.noise
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .draw()
    }
}
