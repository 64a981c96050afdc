//! # IO Module
//!
//! The boundary between HTTP clients and the domain layer. Handlers parse
//! requests into domain commands, call the services held in `AppState`, and
//! map results and domain errors back to JSON responses and status codes.

pub mod rest;
