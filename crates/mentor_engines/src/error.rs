#![forbid(unsafe_code)]

use mentor_kernel_contracts::progression::LearnerPhase;

/// Fatal configuration defects detected at construction time. No partially
/// configured engine value exists once one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressionConfigError {
    WeightSumOutOfTolerance { phase: LearnerPhase, sum: f64 },
    NegativeWeight { phase: LearnerPhase, index: usize },
    WeightNotFinite { phase: LearnerPhase, index: usize },
    MissingPhaseProfile { phase: LearnerPhase },
    DuplicatePhaseProfile { phase: LearnerPhase },
    InvalidStdDev { got: f64 },
    InvalidThresholds,
    InvalidConfidence,
    InvalidAdaptiveRange,
    InvalidDefaults,
    InvalidLatencyBudget,
    InvalidLockWaitBudget,
}

impl std::fmt::Display for ProgressionConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeightSumOutOfTolerance { phase, sum } => write!(
                f,
                "weight profile for phase {} sums to {sum:.4}, outside 1.0 tolerance",
                phase.as_str()
            ),
            Self::NegativeWeight { phase, index } => write!(
                f,
                "weight {index} for phase {} is negative",
                phase.as_str()
            ),
            Self::WeightNotFinite { phase, index } => write!(
                f,
                "weight {index} for phase {} is not finite",
                phase.as_str()
            ),
            Self::MissingPhaseProfile { phase } => {
                write!(f, "no weight profile configured for phase {}", phase.as_str())
            }
            Self::DuplicatePhaseProfile { phase } => write!(
                f,
                "more than one weight profile configured for phase {}",
                phase.as_str()
            ),
            Self::InvalidStdDev { got } => {
                write!(f, "stochastic standard deviation {got} is invalid")
            }
            Self::InvalidThresholds => {
                write!(f, "decision thresholds must be strictly descending within (0, 1)")
            }
            Self::InvalidConfidence => write!(f, "decision confidences must lie in [0, 1]"),
            Self::InvalidAdaptiveRange => {
                write!(f, "adaptive parameter ranges must be well-formed within (0, 1]")
            }
            Self::InvalidDefaults => write!(
                f,
                "alpha/beta defaults must lie inside their configured adaptive ranges"
            ),
            Self::InvalidLatencyBudget => write!(f, "latency budget must be non-zero"),
            Self::InvalidLockWaitBudget => write!(f, "lock wait budget must be non-zero"),
        }
    }
}

impl std::error::Error for ProgressionConfigError {}
