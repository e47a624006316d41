#![forbid(unsafe_code)]

use serde::Serialize;

use crate::common::validate_unit_fraction;
use crate::progression::{AdaptiveParameters, LearnerId, LearnerPhase};
use crate::{ContractViolation, MonotonicTimeNs, Validate};

/// Transition state assigned to a learner on first reference.
pub const NEUTRAL_STATE: f64 = 0.5;

/// Per-learner progression state. Owned exclusively by the session store and
/// mutated only through the integration engine's serialized update path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnerSession {
    pub learner_id: LearnerId,
    /// Scalar progression state; always within [0, 1] after every update.
    pub state: f64,
    pub phase: LearnerPhase,
    /// Previous cycle's tuning pair. `None` until the first cycle completes,
    /// in which case the engine's configured defaults apply.
    pub adaptive: Option<AdaptiveParameters>,
    pub last_updated: MonotonicTimeNs,
}

impl LearnerSession {
    /// Neutral session created lazily on first reference.
    pub fn fresh(learner_id: LearnerId, now: MonotonicTimeNs) -> Self {
        Self {
            learner_id,
            state: NEUTRAL_STATE,
            phase: LearnerPhase::first(),
            adaptive: None,
            last_updated: now,
        }
    }
}

impl Validate for LearnerSession {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.learner_id.validate()?;
        validate_unit_fraction("learner_session.state", self.state)?;
        if let Some(adaptive) = &self.adaptive {
            adaptive.validate()?;
        }
        Ok(())
    }
}
