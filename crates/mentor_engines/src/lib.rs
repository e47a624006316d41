#![forbid(unsafe_code)]

pub mod error;
pub mod interpret;
pub mod noise;
pub mod normalize;
pub mod weights;

pub use error::ProgressionConfigError;
