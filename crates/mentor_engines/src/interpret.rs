#![forbid(unsafe_code)]

use mentor_kernel_contracts::progression::{
    AdaptiveParameters, LearnerPhase, RecommendedAction,
};

use crate::error::ProgressionConfigError;

/// Externally configured decision policy: action thresholds with their
/// confidences, plus the clamp ranges for the per-learner adaptive pair.
/// Business-policy constants, never engine invariants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionPolicy {
    pub advance_floor: f64,
    pub advance_confidence: f64,
    pub continue_floor: f64,
    pub continue_confidence: f64,
    pub support_floor: f64,
    pub support_confidence: f64,
    pub remediate_confidence: f64,
    pub alpha_range: (f64, f64),
    pub beta_range: (f64, f64),
}

impl DecisionPolicy {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        advance_floor: f64,
        advance_confidence: f64,
        continue_floor: f64,
        continue_confidence: f64,
        support_floor: f64,
        support_confidence: f64,
        remediate_confidence: f64,
        alpha_range: (f64, f64),
        beta_range: (f64, f64),
    ) -> Result<Self, ProgressionConfigError> {
        let policy = Self {
            advance_floor,
            advance_confidence,
            continue_floor,
            continue_confidence,
            support_floor,
            support_confidence,
            remediate_confidence,
            alpha_range,
            beta_range,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn mvp_v1() -> Self {
        Self::v1(
            0.8,
            0.9,
            0.6,
            0.7,
            0.4,
            0.6,
            0.8,
            (0.3, 0.9),
            (0.05, 0.25),
        )
        .expect("mvp_v1 decision policy must construct")
    }

    pub fn validate(&self) -> Result<(), ProgressionConfigError> {
        let floors = [self.support_floor, self.continue_floor, self.advance_floor];
        if floors.iter().any(|f| !f.is_finite()) {
            return Err(ProgressionConfigError::InvalidThresholds);
        }
        if !(0.0 < self.support_floor
            && self.support_floor < self.continue_floor
            && self.continue_floor < self.advance_floor
            && self.advance_floor < 1.0)
        {
            return Err(ProgressionConfigError::InvalidThresholds);
        }
        let confidences = [
            self.advance_confidence,
            self.continue_confidence,
            self.support_confidence,
            self.remediate_confidence,
        ];
        if confidences
            .iter()
            .any(|c| !c.is_finite() || !(0.0..=1.0).contains(c))
        {
            return Err(ProgressionConfigError::InvalidConfidence);
        }
        for (lo, hi) in [self.alpha_range, self.beta_range] {
            if !lo.is_finite() || !hi.is_finite() || lo <= 0.0 || hi > 1.0 || lo >= hi {
                return Err(ProgressionConfigError::InvalidAdaptiveRange);
            }
        }
        Ok(())
    }

    /// Map the freshly computed state to its action bucket, phase shift, and
    /// the next cycle's clamped adaptive pair. Pure given the policy.
    pub fn interpret(&self, next_state: f64, phase: LearnerPhase) -> Interpretation {
        let (recommended_action, confidence) = if next_state >= self.advance_floor {
            (RecommendedAction::Advance, self.advance_confidence)
        } else if next_state >= self.continue_floor {
            (RecommendedAction::Continue, self.continue_confidence)
        } else if next_state >= self.support_floor {
            (RecommendedAction::Support, self.support_confidence)
        } else {
            (RecommendedAction::Remediate, self.remediate_confidence)
        };

        let next_phase = match recommended_action {
            RecommendedAction::Advance => phase.advanced(),
            RecommendedAction::Remediate => phase.regressed(),
            RecommendedAction::Continue | RecommendedAction::Support => phase,
        };

        let reasoning = match recommended_action {
            RecommendedAction::Advance => format!(
                "state {next_state:.3} cleared the advance floor {:.2} during {}; moving to {}",
                self.advance_floor,
                phase.as_str(),
                next_phase.as_str()
            ),
            RecommendedAction::Continue => format!(
                "state {next_state:.3} holds the continue band during {}",
                phase.as_str()
            ),
            RecommendedAction::Support => format!(
                "state {next_state:.3} in the support band during {}; extra scaffolding recommended",
                phase.as_str()
            ),
            RecommendedAction::Remediate => format!(
                "state {next_state:.3} below the support floor {:.2} during {}; stepping back to {}",
                self.support_floor,
                phase.as_str(),
                next_phase.as_str()
            ),
        };

        Interpretation {
            recommended_action,
            confidence,
            reasoning,
            next_phase,
            adaptive_parameters: self.adaptive_parameters(next_state, phase),
        }
    }

    /// Monotonic retuning: trust grows and exploration shrinks as state and
    /// phase progress. Both outputs are clamped to their configured ranges.
    fn adaptive_parameters(&self, next_state: f64, phase: LearnerPhase) -> AdaptiveParameters {
        let progress = (next_state + 0.05 * phase.index() as f64).clamp(0.0, 1.0);
        let (alpha_lo, alpha_hi) = self.alpha_range;
        let (beta_lo, beta_hi) = self.beta_range;
        AdaptiveParameters {
            alpha_baseline: (alpha_lo + (alpha_hi - alpha_lo) * progress)
                .clamp(alpha_lo, alpha_hi),
            beta_exploration: (beta_hi - (beta_hi - beta_lo) * progress)
                .clamp(beta_lo, beta_hi),
        }
    }
}

/// Output of one interpretation pass; the os layer attaches diagnostics and
/// the reason code before returning it to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub recommended_action: RecommendedAction,
    pub confidence: f64,
    pub reasoning: String,
    pub next_phase: LearnerPhase,
    pub adaptive_parameters: AdaptiveParameters,
}
