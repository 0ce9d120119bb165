//! Domain layer types and invariants.

pub mod display;
pub mod entities;
pub mod membership;
pub mod types;
