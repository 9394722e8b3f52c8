//! Reconciliation of edited survey children against stored state.
//!
//! # Responsibility
//! - Decide whether a survey's stored option set must be replaced.
//!
//! # Invariants
//! - Decisions are pure; storage mutation belongs to the repository layer.

pub mod options;

pub use options::{reconcile_options, reconcile_survey_options, OptionDecision, ReconcileError};
