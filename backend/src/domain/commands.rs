//! Domain-level command types.
//!
//! Services take these instead of the public DTOs from the `shared` crate; the
//! REST layer parses and maps the request bodies into them.

pub mod admin {
    use crate::domain::list_query::{BloodGroupFilter, GradeFilter};

    /// Credentials submitted on the admin login page
    #[derive(Debug, Clone, PartialEq)]
    pub struct AdminLoginCommand {
        pub username: String,
        pub password: String,
    }

    /// Changes to the dashboard search and filters. `None` keeps the current
    /// value; any `Some` moves the dashboard back to page 1.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct UpdateDashboardQueryCommand {
        pub search: Option<String>,
        pub grade: Option<GradeFilter>,
        pub blood_group: Option<BloodGroupFilter>,
    }
}
