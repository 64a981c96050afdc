pub mod admin_session;
pub mod draft;
pub mod student;

pub use admin_session::AdminSession;
pub use draft::{DraftRecord, DraftUpdate, ProfileImage};
pub use student::Student;
