// File: src/core/mod.rs

pub mod engine;
pub mod evaluator;
pub mod progress;
pub mod ranking;
pub mod rounds;
pub mod scheduler;
pub mod stats;
pub mod types;
