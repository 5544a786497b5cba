//! Utilities - shared constants

pub mod constants;

pub use constants::*;
