#![forbid(unsafe_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::ProgressionConfigError;

pub const DEFAULT_STD_DEV: f64 = 0.1;

/// Injectable randomness seam for the stochastic exploration term. Engines
/// never touch ambient randomness; callers decide entropy, seed, or replay.
pub trait NoiseSource: Send {
    fn draw(&mut self) -> f64;
}

/// Zero-mean Gaussian draws scaled by the configured deviation. The raw draw
/// is intentionally unbounded; only the exploration factor applied in the
/// update equation bounds its contribution.
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: StdRng,
    std_dev: f64,
}

impl GaussianNoise {
    pub fn from_entropy(std_dev: f64) -> Result<Self, ProgressionConfigError> {
        validate_std_dev(std_dev)?;
        Ok(Self {
            rng: StdRng::from_entropy(),
            std_dev,
        })
    }

    /// Deterministic source for replay and verification.
    pub fn seeded(seed: u64, std_dev: f64) -> Result<Self, ProgressionConfigError> {
        validate_std_dev(std_dev)?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            std_dev,
        })
    }
}

impl NoiseSource for GaussianNoise {
    fn draw(&mut self) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * self.std_dev
    }
}

/// Constant source; returns the same perturbation on every draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn draw(&mut self) -> f64 {
        self.0
    }
}

fn validate_std_dev(std_dev: f64) -> Result<(), ProgressionConfigError> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(ProgressionConfigError::InvalidStdDev { got: std_dev });
    }
    Ok(())
}
