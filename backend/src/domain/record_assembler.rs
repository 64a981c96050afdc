//! Turns a finished draft into a stored student record.
//!
//! Submission is strictly sequential: the profile image (if any) is uploaded
//! first, and the record is only inserted once the upload has produced a
//! URL. Nothing is retried; a failure leaves the draft untouched for the
//! caller to resubmit.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::domain::models::{DraftRecord, ProfileImage, Student};
use crate::domain::validation::ValidationViolation;
use crate::storage::traits::{BlobStorage, StudentStorage};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Registration is incomplete: {0}")]
    Incomplete(ValidationViolation),
    #[error("Failed to upload profile image: {0}")]
    UploadFailed(String),
    #[error("There was an error submitting your registration: {0}")]
    SaveFailed(String),
}

/// Optional free text is stored as NULL when nothing was entered
fn optional_text(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn required_text(value: &str) -> Result<String, ValidationViolation> {
    if value.trim().is_empty() {
        Err(ValidationViolation::MissingRequiredFields)
    } else {
        Ok(value.to_string())
    }
}

/// Name under which a profile image is uploaded: submission time in
/// milliseconds, a short random suffix, and the original extension
pub fn upload_name(image: &ProfileImage, now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let stem = format!("{}-{}", now.timestamp_millis(), &suffix[..8]);
    match image.extension() {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Map a draft to the persisted shape.
///
/// Fails if any required field is missing, so an incomplete draft can never
/// be written even if the caller skipped the step validators.
pub fn map_draft(
    draft: &DraftRecord,
    id: String,
    profile_image_url: Option<String>,
    created_at: DateTime<Utc>,
) -> Result<Student, ValidationViolation> {
    let mother_mobile = required_text(&draft.mother_mobile)
        .map_err(|_| ValidationViolation::MotherContactRequired)?;
    let mother_occupation = required_text(&draft.mother_occupation)
        .map_err(|_| ValidationViolation::MotherContactRequired)?;

    Ok(Student {
        id,
        first_name: required_text(&draft.first_name)?,
        last_name: required_text(&draft.last_name)?,
        gender: draft
            .gender
            .ok_or(ValidationViolation::MissingRequiredFields)?,
        date_of_birth: draft
            .date_of_birth
            .ok_or(ValidationViolation::InvalidDateOfBirth)?,
        email: required_text(&draft.email)?,
        mobile: required_text(&draft.mobile)?,
        profile_image_url,
        blood_group: draft
            .blood_group
            .ok_or(ValidationViolation::BloodGroupRequired)?,
        allergies: optional_text(&draft.allergies),
        medications: optional_text(&draft.medications),
        mother_name: optional_text(&draft.mother_name),
        mother_mobile,
        mother_occupation,
        father_name: optional_text(&draft.father_name),
        father_mobile: optional_text(&draft.father_mobile),
        created_at,
    })
}

/// Uploads the profile image and inserts the student record
#[derive(Clone)]
pub struct RecordAssembler {
    students: Arc<dyn StudentStorage>,
    blobs: Arc<dyn BlobStorage>,
}

impl RecordAssembler {
    pub fn new(students: Arc<dyn StudentStorage>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self { students, blobs }
    }

    /// Submit a draft. The draft is only read, never modified.
    pub async fn submit(
        &self,
        draft: &DraftRecord,
        now: DateTime<Utc>,
    ) -> Result<Student, SubmissionError> {
        let mut student = map_draft(draft, Student::generate_id(), None, now)
            .map_err(SubmissionError::Incomplete)?;

        if let Some(image) = &draft.profile_image {
            let name = upload_name(image, now);
            info!("Uploading profile image {} ({} bytes) as {}", image.filename, image.bytes.len(), name);

            let url = self
                .blobs
                .upload(&name, &image.bytes, image.content_type.as_deref())
                .await
                .map_err(|e| {
                    error!("Profile image upload failed: {:#}", e);
                    SubmissionError::UploadFailed(format!("{:#}", e))
                })?;
            student.profile_image_url = Some(url);
        }

        self.students.store_student(&student).await.map_err(|e| {
            error!("Failed to save student {}: {:#}", student.id, e);
            SubmissionError::SaveFailed(format!("{:#}", e))
        })?;

        info!("Stored registration {} for {}", student.id, student.full_name());
        Ok(student)
    }
}
