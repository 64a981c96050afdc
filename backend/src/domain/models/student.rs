use chrono::{DateTime, NaiveDate, Utc};
use shared::{BloodGroup, Gender};
use uuid::Uuid;

/// A submitted registration as held by the record store
#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub mobile: String,
    pub profile_image_url: Option<String>,
    pub blood_group: BloodGroup,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub mother_name: Option<String>,
    pub mother_mobile: String,
    pub mother_occupation: String,
    pub father_name: Option<String>,
    pub father_mobile: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// "first last", the string the admin search matches against
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
