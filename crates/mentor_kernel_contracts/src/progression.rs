#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{validate_text, validate_token, validate_unit_fraction};
use crate::{ContractViolation, ReasonCodeId, SchemaVersion, Validate};

pub const PROGRESSION_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

pub const SIGNAL_COUNT: usize = 4;
pub const PHASE_COUNT: usize = 5;

/// Opaque stable learner identifier supplied by the session layer.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn v1(value: String) -> Result<Self, ContractViolation> {
        let id = Self(value);
        id.validate()?;
        Ok(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for LearnerId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_token("learner_id", &self.0, 96)
    }
}

/// The five pedagogical phases, in progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LearnerPhase {
    Onboarding,
    Introduction,
    Practice,
    Application,
    Mastery,
}

impl LearnerPhase {
    pub const ORDERED: [LearnerPhase; PHASE_COUNT] = [
        LearnerPhase::Onboarding,
        LearnerPhase::Introduction,
        LearnerPhase::Practice,
        LearnerPhase::Application,
        LearnerPhase::Mastery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LearnerPhase::Onboarding => "onboarding",
            LearnerPhase::Introduction => "introduction",
            LearnerPhase::Practice => "practice",
            LearnerPhase::Application => "application",
            LearnerPhase::Mastery => "mastery",
        }
    }

    /// Case-insensitive label lookup. Unknown labels return `None`; the
    /// caller decides the fallback.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ORDERED
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(label.trim()))
    }

    pub fn index(self) -> usize {
        match self {
            LearnerPhase::Onboarding => 0,
            LearnerPhase::Introduction => 1,
            LearnerPhase::Practice => 2,
            LearnerPhase::Application => 3,
            LearnerPhase::Mastery => 4,
        }
    }

    pub fn first() -> Self {
        LearnerPhase::Onboarding
    }

    /// Designated default when a supplied phase label is unrecognized.
    pub fn fallback() -> Self {
        LearnerPhase::Practice
    }

    /// One step forward, capped at the final phase.
    pub fn advanced(self) -> Self {
        match self {
            LearnerPhase::Mastery => LearnerPhase::Mastery,
            other => Self::ORDERED[other.index() + 1],
        }
    }

    /// One step back, capped at the first phase.
    pub fn regressed(self) -> Self {
        match self {
            LearnerPhase::Onboarding => LearnerPhase::Onboarding,
            other => Self::ORDERED[other.index() - 1],
        }
    }
}

/// The four upstream signal sources, in weight-tuple order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    Motivation,
    Performance,
    Engagement,
    Curriculum,
}

impl SignalKind {
    pub const ORDERED: [SignalKind; SIGNAL_COUNT] = [
        SignalKind::Motivation,
        SignalKind::Performance,
        SignalKind::Engagement,
        SignalKind::Curriculum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Motivation => "motivation",
            SignalKind::Performance => "performance",
            SignalKind::Engagement => "engagement",
            SignalKind::Curriculum => "curriculum",
        }
    }

    pub fn index(self) -> usize {
        match self {
            SignalKind::Motivation => 0,
            SignalKind::Performance => 1,
            SignalKind::Engagement => 2,
            SignalKind::Curriculum => 3,
        }
    }
}

/// One cycle's worth of upstream payloads. Each payload is an opaque JSON
/// document already schema-validated by its producer; an absent payload is
/// the "missing" state and normalizes to neutral.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalBundle {
    pub motivation: Option<Value>,
    pub performance: Option<Value>,
    pub engagement: Option<Value>,
    pub curriculum: Option<Value>,
}

impl SignalBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn v1(
        motivation: Option<Value>,
        performance: Option<Value>,
        engagement: Option<Value>,
        curriculum: Option<Value>,
    ) -> Self {
        Self {
            motivation,
            performance,
            engagement,
            curriculum,
        }
    }

    pub fn payload(&self, kind: SignalKind) -> Option<&Value> {
        match kind {
            SignalKind::Motivation => self.motivation.as_ref(),
            SignalKind::Performance => self.performance.as_ref(),
            SignalKind::Engagement => self.engagement.as_ref(),
            SignalKind::Curriculum => self.curriculum.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecommendedAction {
    Advance,
    Continue,
    Support,
    Remediate,
}

impl RecommendedAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendedAction::Advance => "advance",
            RecommendedAction::Continue => "continue",
            RecommendedAction::Support => "support",
            RecommendedAction::Remediate => "remediate",
        }
    }
}

/// Per-learner tuning pair fed back into the next cycle's update equation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptiveParameters {
    pub alpha_baseline: f64,
    pub beta_exploration: f64,
}

impl AdaptiveParameters {
    pub fn v1(alpha_baseline: f64, beta_exploration: f64) -> Result<Self, ContractViolation> {
        let params = Self {
            alpha_baseline,
            beta_exploration,
        };
        params.validate()?;
        Ok(params)
    }
}

impl Validate for AdaptiveParameters {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.alpha_baseline.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "adaptive_parameters.alpha_baseline",
            });
        }
        if !self.beta_exploration.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "adaptive_parameters.beta_exploration",
            });
        }
        if self.alpha_baseline <= 0.0 || self.alpha_baseline > 1.0 {
            return Err(ContractViolation::InvalidRange {
                field: "adaptive_parameters.alpha_baseline",
                min: 0.0,
                max: 1.0,
                got: self.alpha_baseline,
            });
        }
        if self.beta_exploration <= 0.0 || self.beta_exploration > 1.0 {
            return Err(ContractViolation::InvalidRange {
                field: "adaptive_parameters.beta_exploration",
                min: 0.0,
                max: 1.0,
                got: self.beta_exploration,
            });
        }
        Ok(())
    }
}

/// Recoverable per-cycle conditions. These degrade, never abort: a cycle
/// always yields a well-formed decision alongside its warnings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransitionWarning {
    /// A payload (field `None`) or one of its sub-fields was missing or
    /// malformed and the neutral default was substituted.
    NormalizationFallback {
        signal: SignalKind,
        field: Option<&'static str>,
    },
    /// The supplied phase label was unrecognized and the default profile
    /// was used instead.
    UnknownPhaseFallback { supplied_label: String },
    /// The cycle exceeded the soft latency budget. Observability only.
    PerformanceBudgetExceeded { elapsed_ns: u64, budget_ns: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransitionDiagnostics {
    pub integration_value: f64,
    pub stochastic_draw: f64,
    pub elapsed_ns: u64,
    pub warnings: Vec<TransitionWarning>,
}

impl TransitionDiagnostics {
    pub fn v1(
        integration_value: f64,
        stochastic_draw: f64,
        elapsed_ns: u64,
        warnings: Vec<TransitionWarning>,
    ) -> Result<Self, ContractViolation> {
        let diagnostics = Self {
            integration_value,
            stochastic_draw,
            elapsed_ns,
            warnings,
        };
        diagnostics.validate()?;
        Ok(diagnostics)
    }
}

impl Validate for TransitionDiagnostics {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.integration_value.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "transition_diagnostics.integration_value",
            });
        }
        if !self.stochastic_draw.is_finite() {
            return Err(ContractViolation::NotFinite {
                field: "transition_diagnostics.stochastic_draw",
            });
        }
        Ok(())
    }
}

/// The categorical outcome of one update cycle, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionRecord {
    pub schema_version: SchemaVersion,
    pub reason_code: ReasonCodeId,
    pub state: f64,
    pub recommended_action: RecommendedAction,
    pub confidence: f64,
    pub reasoning: String,
    pub next_phase: LearnerPhase,
    pub adaptive_parameters: AdaptiveParameters,
    pub diagnostics: TransitionDiagnostics,
}

impl DecisionRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn v1(
        reason_code: ReasonCodeId,
        state: f64,
        recommended_action: RecommendedAction,
        confidence: f64,
        reasoning: String,
        next_phase: LearnerPhase,
        adaptive_parameters: AdaptiveParameters,
        diagnostics: TransitionDiagnostics,
    ) -> Result<Self, ContractViolation> {
        let record = Self {
            schema_version: PROGRESSION_CONTRACT_VERSION,
            reason_code,
            state,
            recommended_action,
            confidence,
            reasoning,
            next_phase,
            adaptive_parameters,
            diagnostics,
        };
        record.validate()?;
        Ok(record)
    }
}

impl Validate for DecisionRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != PROGRESSION_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "decision_record.schema_version",
                reason: "must match PROGRESSION_CONTRACT_VERSION",
            });
        }
        validate_unit_fraction("decision_record.state", self.state)?;
        validate_unit_fraction("decision_record.confidence", self.confidence)?;
        validate_text("decision_record.reasoning", &self.reasoning, 240)?;
        self.adaptive_parameters.validate()?;
        self.diagnostics.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_prog_contract_01_phase_order_is_linear_and_capped() {
        assert_eq!(LearnerPhase::first(), LearnerPhase::Onboarding);
        assert_eq!(
            LearnerPhase::Onboarding.advanced(),
            LearnerPhase::Introduction
        );
        assert_eq!(LearnerPhase::Mastery.advanced(), LearnerPhase::Mastery);
        assert_eq!(
            LearnerPhase::Mastery.regressed(),
            LearnerPhase::Application
        );
        assert_eq!(
            LearnerPhase::Onboarding.regressed(),
            LearnerPhase::Onboarding
        );
    }

    #[test]
    fn at_prog_contract_02_phase_parse_is_case_insensitive() {
        assert_eq!(
            LearnerPhase::parse("Practice"),
            Some(LearnerPhase::Practice)
        );
        assert_eq!(
            LearnerPhase::parse("  MASTERY  "),
            Some(LearnerPhase::Mastery)
        );
        assert_eq!(LearnerPhase::parse("galaxy"), None);
        assert_eq!(LearnerPhase::parse(""), None);
    }

    #[test]
    fn at_prog_contract_03_learner_id_token_rules() {
        assert!(LearnerId::v1("learner_001".to_string()).is_ok());
        assert!(LearnerId::v1(String::new()).is_err());
        assert!(LearnerId::v1("two words".to_string()).is_err());
        assert!(LearnerId::v1("x".repeat(97)).is_err());
    }

    #[test]
    fn at_prog_contract_04_adaptive_parameters_reject_nonsense() {
        assert!(AdaptiveParameters::v1(0.7, 0.15).is_ok());
        assert!(AdaptiveParameters::v1(0.0, 0.15).is_err());
        assert!(AdaptiveParameters::v1(1.5, 0.15).is_err());
        assert!(AdaptiveParameters::v1(0.7, f64::NAN).is_err());
    }

    #[test]
    fn at_prog_contract_05_decision_record_bounds() {
        let adaptive = AdaptiveParameters::v1(0.7, 0.15).unwrap();
        let diagnostics = TransitionDiagnostics::v1(0.5, 0.0, 1_000, Vec::new()).unwrap();
        let ok = DecisionRecord::v1(
            ReasonCodeId(1),
            0.85,
            RecommendedAction::Advance,
            0.9,
            "state cleared the advance floor".to_string(),
            LearnerPhase::Introduction,
            adaptive,
            diagnostics.clone(),
        );
        assert!(ok.is_ok());

        let bad_state = DecisionRecord::v1(
            ReasonCodeId(1),
            1.2,
            RecommendedAction::Advance,
            0.9,
            "state cleared the advance floor".to_string(),
            LearnerPhase::Introduction,
            adaptive,
            diagnostics,
        );
        assert!(bad_state.is_err());
    }

    #[test]
    fn at_prog_contract_06_bundle_payload_routing() {
        let bundle = SignalBundle::v1(
            Some(serde_json::json!({ "readiness": 0.8 })),
            None,
            None,
            None,
        );
        assert!(bundle.payload(SignalKind::Motivation).is_some());
        assert!(bundle.payload(SignalKind::Performance).is_none());
        assert!(SignalBundle::empty().payload(SignalKind::Curriculum).is_none());
    }
}
