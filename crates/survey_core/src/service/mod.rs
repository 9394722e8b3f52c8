//! Core use-case services.
//!
//! # Responsibility
//! - Validate requests and enforce ownership and lifecycle preconditions.
//! - Orchestrate repository calls and the summary/reconcile engines.
//!
//! # Invariants
//! - Field errors are collected before a request is rejected.
//! - Precondition failures abort before any write or aggregation happens.
//! - Services depend on repository traits only; storage is injected.

pub mod answer_service;
pub mod error;
pub mod summary_service;
pub mod survey_service;
pub mod user_service;

pub use error::{FieldError, FieldErrors, ServiceError, ServiceResult};
