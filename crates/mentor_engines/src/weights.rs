#![forbid(unsafe_code)]

use mentor_kernel_contracts::progression::{LearnerPhase, SignalKind, PHASE_COUNT, SIGNAL_COUNT};

use crate::error::ProgressionConfigError;

/// Allowed deviation of a profile's weight sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.05;

/// Phase-specific signal weighting, externally configured and immutable once
/// the table is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightProfile {
    pub phase: LearnerPhase,
    pub weights: [f64; SIGNAL_COUNT],
}

impl WeightProfile {
    pub fn v1(
        phase: LearnerPhase,
        weights: [f64; SIGNAL_COUNT],
    ) -> Result<Self, ProgressionConfigError> {
        let profile = Self { phase, weights };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ProgressionConfigError> {
        for (index, weight) in self.weights.iter().enumerate() {
            if !weight.is_finite() {
                return Err(ProgressionConfigError::WeightNotFinite {
                    phase: self.phase,
                    index,
                });
            }
            if *weight < 0.0 {
                return Err(ProgressionConfigError::NegativeWeight {
                    phase: self.phase,
                    index,
                });
            }
        }
        let sum: f64 = self.weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ProgressionConfigError::WeightSumOutOfTolerance {
                phase: self.phase,
                sum,
            });
        }
        Ok(())
    }

    pub fn weight(&self, kind: SignalKind) -> f64 {
        self.weights[kind.index()]
    }
}

/// Exact-lookup table holding one validated profile per phase.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightProfileTable {
    profiles: [WeightProfile; PHASE_COUNT],
}

impl WeightProfileTable {
    /// Builds the table from an unordered profile list. Exactly one profile
    /// per phase is required; any shape or sum violation is fatal.
    pub fn v1(profiles: Vec<WeightProfile>) -> Result<Self, ProgressionConfigError> {
        let mut slots: [Option<WeightProfile>; PHASE_COUNT] = [None; PHASE_COUNT];
        for profile in profiles {
            profile.validate()?;
            let slot = &mut slots[profile.phase.index()];
            if slot.is_some() {
                return Err(ProgressionConfigError::DuplicatePhaseProfile {
                    phase: profile.phase,
                });
            }
            *slot = Some(profile);
        }
        let mut table = [WeightProfile {
            phase: LearnerPhase::Onboarding,
            weights: [0.0; SIGNAL_COUNT],
        }; PHASE_COUNT];
        for phase in LearnerPhase::ORDERED {
            match slots[phase.index()] {
                Some(profile) => table[phase.index()] = profile,
                None => return Err(ProgressionConfigError::MissingPhaseProfile { phase }),
            }
        }
        Ok(Self { profiles: table })
    }

    /// Canonical five-profile table, each phase emphasizing a different
    /// signal: motivation while onboarding, engagement during introduction,
    /// performance in practice, a performance/curriculum balance in
    /// application, curriculum completion at mastery.
    pub fn mvp_v1() -> Self {
        let profiles = vec![
            WeightProfile {
                phase: LearnerPhase::Onboarding,
                weights: [0.40, 0.22, 0.28, 0.10],
            },
            WeightProfile {
                phase: LearnerPhase::Introduction,
                weights: [0.28, 0.22, 0.35, 0.15],
            },
            WeightProfile {
                phase: LearnerPhase::Practice,
                weights: [0.22, 0.38, 0.25, 0.15],
            },
            WeightProfile {
                phase: LearnerPhase::Application,
                weights: [0.18, 0.30, 0.22, 0.30],
            },
            WeightProfile {
                phase: LearnerPhase::Mastery,
                weights: [0.22, 0.23, 0.15, 0.40],
            },
        ];
        Self::v1(profiles).expect("mvp_v1 weight table must construct")
    }

    pub fn validate(&self) -> Result<(), ProgressionConfigError> {
        for profile in &self.profiles {
            profile.validate()?;
        }
        Ok(())
    }

    pub fn resolve(&self, phase: LearnerPhase) -> &WeightProfile {
        &self.profiles[phase.index()]
    }
}
