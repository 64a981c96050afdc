pub mod dashboard_mapper;
pub mod registration_mapper;
pub mod student_mapper;

pub use dashboard_mapper::DashboardMapper;
pub use registration_mapper::RegistrationMapper;
pub use student_mapper::StudentMapper;
