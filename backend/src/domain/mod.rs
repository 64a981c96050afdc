//! # Domain Module
//!
//! Business logic for student registration and the admin dashboard. Nothing
//! here knows about HTTP; storage is reached only through the traits in
//! `crate::storage::traits`.
//!
//! ## Module Organization
//!
//! - **validation**: per-step field rules and the messages shown to the user
//! - **form_state_machine**: the three-step form and its terminal submitted state
//! - **record_assembler**: maps a finished draft to a record, uploads the image, inserts
//! - **registration_service**: one state machine per applicant session
//! - **list_query**: grade classification, search, filters and paging
//! - **admin_service**: admin login sessions and their dashboard state
//!
//! ## Business Rules
//!
//! - Applicants must be at least 18 years old on the day they advance past step 1
//! - A profile image, when given, must be a `.png`
//! - Mother's mobile and occupation are the only required parent fields
//! - A submission uploads the image first and inserts the record only after the
//!   upload succeeded; nothing is retried automatically
//! - Grade labels are derived from age at query time and never stored

pub mod admin_service;
pub mod commands;
pub mod form_state_machine;
pub mod list_query;
pub mod models;
pub mod record_assembler;
pub mod registration_service;
pub mod validation;

pub use admin_service::{AdminError, AdminService};
pub use form_state_machine::{FormEffect, FormError, FormState, FormStateMachine, Transition};
pub use list_query::{AdminQueryView, CategoryFilter, ListCriteria, QueryPage};
pub use record_assembler::{RecordAssembler, SubmissionError};
pub use registration_service::{RegistrationError, RegistrationService, SessionView, StepOutcome};
pub use validation::{FormStep, ValidationViolation};
