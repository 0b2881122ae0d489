// File: src/lib.rs

pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod lexicon;
pub mod persistence;
pub mod store;

pub use crate::config::GameConfig;
pub use crate::core::engine::GameEngine;
pub use crate::error::{GameError, GameResult};
