//! Domain model for the survey platform.
//!
//! # Responsibility
//! - Define canonical records for users, surveys, specifications and answers.
//! - Own the stable storage codes for every enumerated field.
//!
//! # Invariants
//! - Every record is identified by a stable v4 `Uuid`.
//! - Options and specifications belong to exactly one survey.

pub mod answer;
pub mod specification;
pub mod survey;
pub mod user;
