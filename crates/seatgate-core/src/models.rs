//! Domain models for Seatgate.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod invitation;
pub mod key;
pub mod organization;
pub mod subscriber;
