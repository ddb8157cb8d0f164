//! Seatgate Admission — license-quota admission control and the
//! mutation gateway that applies admission-approved changes.

pub mod gateway;
pub mod service;

pub use gateway::{EditOutcome, InviteOutcome, MutationGateway};
pub use service::{AdmissionController, AdmissionDecision, ChangeSetDecision, new_admissions};
