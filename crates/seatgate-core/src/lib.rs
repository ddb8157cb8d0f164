//! Seatgate Core — domain models, license quota table, subscription
//! directory projection, and repository trait definitions.
//!
//! This crate holds everything the admission and audit service crates
//! share: the subscriber/invitation/organization models, the
//! `LicenseTier → SeatLimit` quota table, the merged directory view,
//! the read-only organization snapshot, and the async repository
//! traits implemented by `seatgate-db`.

pub mod directory;
pub mod error;
pub mod license;
pub mod models;
pub mod repository;
pub mod snapshot;

pub use directory::{Directory, DirectoryEntry};
pub use error::{SeatgateError, SeatgateResult};
pub use license::SeatLimit;
pub use snapshot::OrganizationSnapshot;
