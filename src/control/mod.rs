//! Controllers the cascade arbitrates between.

pub mod model;
pub mod pid;
pub mod predictor;
