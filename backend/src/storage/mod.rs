//! # Storage Module
//!
//! Persistence for the registration backend.
//!
//! The domain layer talks to storage only through the traits in [`traits`], so
//! the concrete backends can be swapped (a hosted database, object storage)
//! without touching the form or dashboard logic.
//!
//! ## Components
//!
//! - **connection.rs** - SQLite pool and schema setup
//! - **repositories/** - the `students` table behind [`StudentStorage`]
//! - **blob/** - profile image files behind [`BlobStorage`]
//!
//! ## Record Layout
//!
//! - Dates of birth are stored as `YYYY-MM-DD`
//! - Creation timestamps are RFC 3339 in UTC, so text ordering is time ordering
//! - Optional fields left blank on the form are stored as NULL

pub mod blob;
pub mod connection;
pub mod repositories;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use blob::LocalBlobStore;
pub use connection::DbConnection;
pub use repositories::StudentRepository;
pub use traits::{BlobStorage, StudentStorage};
