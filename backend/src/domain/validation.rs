//! Field validation for the three registration steps.
//!
//! Each step has one predicate that inspects the draft and reports at most
//! one violation, checked in a fixed order. The violation names a category
//! (not a specific field), which is what the user is shown.

use chrono::NaiveDate;

use crate::domain::models::DraftRecord;

/// Minimum age, in whole years, to register
pub const MINIMUM_AGE: u32 = 18;

/// The steps of the registration form, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormStep {
    Demographics,
    Medical,
    ParentInfo,
}

impl FormStep {
    pub const COUNT: u8 = 3;

    /// 1-based position of the step
    pub fn number(&self) -> u8 {
        match self {
            FormStep::Demographics => 1,
            FormStep::Medical => 2,
            FormStep::ParentInfo => 3,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(FormStep::Demographics),
            2 => Some(FormStep::Medical),
            3 => Some(FormStep::ParentInfo),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?)
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormStep::Demographics => "Student Demographics",
            FormStep::Medical => "Medical Information",
            FormStep::ParentInfo => "Parent Information",
        }
    }
}

/// Why a step cannot be left
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationViolation {
    #[error("Please fill in all required fields.")]
    MissingRequiredFields,
    #[error("Please select your blood group.")]
    BloodGroupRequired,
    #[error("Please select your date of birth.")]
    InvalidDateOfBirth,
    #[error("You must be at least 18 years old to register.")]
    Underage,
    #[error("Profile image must be a .png file.")]
    ProfileImageNotPng,
    #[error("Please fill in all required fields (Mother's Mobile and Occupation).")]
    MotherContactRequired,
}

/// Whole years elapsed between `date_of_birth` and `today`.
/// Returns `None` when the birth date lies in the future.
pub fn age_in_years(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    today.years_since(date_of_birth)
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Demographics: names, gender, contact details, birth date, age and image type
pub fn validate_demographics(draft: &DraftRecord, today: NaiveDate) -> Result<(), ValidationViolation> {
    let required = [
        draft.first_name.as_str(),
        draft.last_name.as_str(),
        draft.email.as_str(),
        draft.mobile.as_str(),
    ];
    if required.iter().any(|v| is_blank(v)) || draft.gender.is_none() {
        return Err(ValidationViolation::MissingRequiredFields);
    }

    let date_of_birth = draft
        .date_of_birth
        .ok_or(ValidationViolation::InvalidDateOfBirth)?;
    let age = age_in_years(date_of_birth, today).ok_or(ValidationViolation::InvalidDateOfBirth)?;
    if age < MINIMUM_AGE {
        return Err(ValidationViolation::Underage);
    }

    if let Some(image) = &draft.profile_image {
        if !image.filename.to_lowercase().ends_with(".png") {
            return Err(ValidationViolation::ProfileImageNotPng);
        }
    }

    Ok(())
}

/// Medical: only the blood group is required
pub fn validate_medical(draft: &DraftRecord) -> Result<(), ValidationViolation> {
    match draft.blood_group {
        Some(_) => Ok(()),
        None => Err(ValidationViolation::BloodGroupRequired),
    }
}

/// Parent info: the mother's mobile and occupation are required
pub fn validate_parent_info(draft: &DraftRecord) -> Result<(), ValidationViolation> {
    if is_blank(&draft.mother_mobile) || is_blank(&draft.mother_occupation) {
        return Err(ValidationViolation::MotherContactRequired);
    }
    Ok(())
}

/// Run the validator belonging to `step`
pub fn validate_step(
    step: FormStep,
    draft: &DraftRecord,
    today: NaiveDate,
) -> Result<(), ValidationViolation> {
    match step {
        FormStep::Demographics => validate_demographics(draft, today),
        FormStep::Medical => validate_medical(draft),
        FormStep::ParentInfo => validate_parent_info(draft),
    }
}

/// Run every step's validator in order, stopping at the first violation
pub fn validate_all(draft: &DraftRecord, today: NaiveDate) -> Result<(), ValidationViolation> {
    validate_demographics(draft, today)?;
    validate_medical(draft)?;
    validate_parent_info(draft)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::models::ProfileImage;
    use shared::{BloodGroup, Gender};

    pub(crate) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// A draft that passes every step relative to [`today`]
    pub(crate) fn complete_draft() -> DraftRecord {
        DraftRecord {
            first_name: "Anna".to_string(),
            last_name: "Lee".to_string(),
            gender: Some(Gender::Female),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 3, 2),
            email: "anna.lee@example.com".to_string(),
            mobile: "555-0101".to_string(),
            profile_image: None,
            blood_group: Some(BloodGroup::APositive),
            allergies: String::new(),
            medications: "Ibuprofen".to_string(),
            mother_name: String::new(),
            mother_mobile: "555-0199".to_string(),
            mother_occupation: "Engineer".to_string(),
            father_name: "Tom Lee".to_string(),
            father_mobile: String::new(),
        }
    }

    #[test]
    fn test_complete_draft_passes_all_steps() {
        assert_eq!(validate_all(&complete_draft(), today()), Ok(()));
    }

    #[test]
    fn test_each_missing_demographic_field_fails() {
        let clears: [fn(&mut DraftRecord); 5] = [
            |d| d.first_name.clear(),
            |d| d.last_name.clear(),
            |d| d.gender = None,
            |d| d.email.clear(),
            |d| d.mobile = "   ".to_string(),
        ];

        for clear in clears {
            let mut draft = complete_draft();
            clear(&mut draft);
            assert_eq!(
                validate_demographics(&draft, today()),
                Err(ValidationViolation::MissingRequiredFields)
            );
        }
    }

    #[test]
    fn test_missing_fields_reported_before_date() {
        let mut draft = complete_draft();
        draft.first_name.clear();
        draft.date_of_birth = None;
        assert_eq!(
            validate_demographics(&draft, today()),
            Err(ValidationViolation::MissingRequiredFields)
        );
    }

    #[test]
    fn test_unset_or_future_date_of_birth() {
        let mut draft = complete_draft();
        draft.date_of_birth = None;
        assert_eq!(
            validate_demographics(&draft, today()),
            Err(ValidationViolation::InvalidDateOfBirth)
        );

        draft.date_of_birth = today().succ_opt();
        assert_eq!(
            validate_demographics(&draft, today()),
            Err(ValidationViolation::InvalidDateOfBirth)
        );
    }

    #[test]
    fn test_age_boundary() {
        let mut draft = complete_draft();

        // 17 years and 364 days old
        draft.date_of_birth = NaiveDate::from_ymd_opt(2006, 6, 16);
        assert_eq!(
            validate_demographics(&draft, today()),
            Err(ValidationViolation::Underage)
        );

        // exactly 18 today
        draft.date_of_birth = NaiveDate::from_ymd_opt(2006, 6, 15);
        assert_eq!(validate_demographics(&draft, today()), Ok(()));
    }

    #[test]
    fn test_age_in_years() {
        let dob = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
        assert_eq!(age_in_years(dob, NaiveDate::from_ymd_opt(2018, 2, 28).unwrap()), Some(17));
        assert_eq!(age_in_years(dob, NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()), Some(18));
        assert_eq!(age_in_years(dob, NaiveDate::from_ymd_opt(1999, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_profile_image_must_be_png() {
        let mut draft = complete_draft();

        draft.profile_image = Some(ProfileImage::new("photo.PNG", vec![0x89]));
        assert_eq!(validate_demographics(&draft, today()), Ok(()));

        draft.profile_image = Some(ProfileImage::new("photo.jpg", vec![0xff]));
        assert_eq!(
            validate_demographics(&draft, today()),
            Err(ValidationViolation::ProfileImageNotPng)
        );

        draft.profile_image = None;
        assert_eq!(validate_demographics(&draft, today()), Ok(()));
    }

    #[test]
    fn test_medical_requires_blood_group_only() {
        let mut draft = complete_draft();
        draft.allergies.clear();
        draft.medications.clear();
        assert_eq!(validate_medical(&draft), Ok(()));

        draft.blood_group = None;
        assert_eq!(
            validate_medical(&draft),
            Err(ValidationViolation::BloodGroupRequired)
        );
        assert_eq!(
            ValidationViolation::BloodGroupRequired.to_string(),
            "Please select your blood group."
        );
    }

    #[test]
    fn test_parent_info_requires_mother_contact() {
        let mut draft = complete_draft();
        draft.mother_name.clear();
        draft.father_name.clear();
        draft.father_mobile.clear();
        assert_eq!(validate_parent_info(&draft), Ok(()));

        draft.mother_occupation.clear();
        assert_eq!(
            validate_parent_info(&draft),
            Err(ValidationViolation::MotherContactRequired)
        );

        let mut draft = complete_draft();
        draft.mother_mobile.clear();
        assert_eq!(
            validate_parent_info(&draft),
            Err(ValidationViolation::MotherContactRequired)
        );
    }

    #[test]
    fn test_step_navigation_helpers() {
        assert_eq!(FormStep::Demographics.next(), Some(FormStep::Medical));
        assert_eq!(FormStep::ParentInfo.next(), None);
        assert_eq!(FormStep::Demographics.previous(), None);
        assert_eq!(FormStep::ParentInfo.previous(), Some(FormStep::Medical));
        assert_eq!(FormStep::from_number(0), None);
    }
}
