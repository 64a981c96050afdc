use chrono::NaiveDate;
use shared::{BloodGroup, Gender};

/// An uploaded profile picture held in memory until submission
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ProfileImage {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }

    /// Extension after the last dot, as written by the user
    pub fn extension(&self) -> Option<&str> {
        let (_, ext) = self.filename.rsplit_once('.')?;
        (!ext.is_empty()).then_some(ext)
    }
}

/// The in-progress registration. Text fields hold exactly what the user
/// typed; an empty string means "not provided".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftRecord {
    // Step 1 - demographics
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub mobile: String,
    pub profile_image: Option<ProfileImage>,

    // Step 2 - medical
    pub blood_group: Option<BloodGroup>,
    pub allergies: String,
    pub medications: String,

    // Step 3 - parents
    pub mother_name: String,
    pub mother_mobile: String,
    pub mother_occupation: String,
    pub father_name: String,
    pub father_mobile: String,
}

/// A partial set of draft fields. `None` leaves a field untouched.
///
/// For the optional typed fields the inner `Option` is the new value, so
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Option<Gender>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub profile_image: Option<Option<ProfileImage>>,
    pub blood_group: Option<Option<BloodGroup>>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub mother_name: Option<String>,
    pub mother_mobile: Option<String>,
    pub mother_occupation: Option<String>,
    pub father_name: Option<String>,
    pub father_mobile: Option<String>,
}

impl DraftRecord {
    /// Merge the provided fields into this draft
    pub fn apply(&mut self, update: DraftUpdate) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut self.first_name, update.first_name);
        set(&mut self.last_name, update.last_name);
        set(&mut self.gender, update.gender);
        set(&mut self.date_of_birth, update.date_of_birth);
        set(&mut self.email, update.email);
        set(&mut self.mobile, update.mobile);
        set(&mut self.profile_image, update.profile_image);
        set(&mut self.blood_group, update.blood_group);
        set(&mut self.allergies, update.allergies);
        set(&mut self.medications, update.medications);
        set(&mut self.mother_name, update.mother_name);
        set(&mut self.mother_mobile, update.mother_mobile);
        set(&mut self.mother_occupation, update.mother_occupation);
        set(&mut self.father_name, update.father_name);
        set(&mut self.father_mobile, update.father_mobile);
    }
}
