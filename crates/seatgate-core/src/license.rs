//! License quota table.
//!
//! The `LicenseTier → SeatLimit` mapping lives here and nowhere else;
//! business logic asks `SeatLimit::admits` and never branches on the
//! tier name. Adding a tier extends the exhaustive match and nothing
//! downstream.

use serde::{Deserialize, Serialize};

use crate::models::organization::LicenseTier;

/// Maximum countable subscribers for a license tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatLimit {
    Limited(u32),
    Unbounded,
}

impl SeatLimit {
    /// Whether one more subscriber may be admitted given the current
    /// count.
    pub fn admits(self, current: usize) -> bool {
        match self {
            SeatLimit::Limited(max) => current < max as usize,
            SeatLimit::Unbounded => true,
        }
    }

    /// Remaining capacity, if bounded.
    pub fn remaining(self, current: usize) -> Option<u32> {
        match self {
            SeatLimit::Limited(max) => Some((max as usize).saturating_sub(current) as u32),
            SeatLimit::Unbounded => None,
        }
    }
}

impl std::fmt::Display for SeatLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatLimit::Limited(max) => write!(f, "{max}"),
            SeatLimit::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl LicenseTier {
    /// Subscriber cap for this tier.
    pub const fn seat_limit(self) -> SeatLimit {
        match self {
            LicenseTier::Professional => SeatLimit::Limited(3),
            LicenseTier::Organization => SeatLimit::Unbounded,
        }
    }
}
