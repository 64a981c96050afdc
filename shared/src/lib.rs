use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gender options offered on the demographics step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// Blood groups offered on the medical step.
///
/// Negative groups are written with the Unicode minus sign ("A−"); the ASCII
/// hyphen is accepted as an alias when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A−", alias = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B−", alias = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB−", alias = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O−", alias = "O-")]
    ONegative,
}

/// Grade level derived from an applicant's age. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GradeLabel {
    #[serde(rename = "Grade 12")]
    Grade12,
    Undergraduate,
    Graduate,
    Postgraduate,
}

/// Error returned when a string does not name a known enum value
#[derive(Debug, Clone, PartialEq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

impl Gender {
    pub const ALL: [Gender; 4] = [
        Gender::Male,
        Gender::Female,
        Gender::Other,
        Gender::PreferNotToSay,
    ];

    /// Value used on the wire and in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::PreferNotToSay => "prefer-not-to-say",
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "gender",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BloodGroup {
    pub const ALL: [BloodGroup; 8] = [
        BloodGroup::APositive,
        BloodGroup::ANegative,
        BloodGroup::BPositive,
        BloodGroup::BNegative,
        BloodGroup::AbPositive,
        BloodGroup::AbNegative,
        BloodGroup::OPositive,
        BloodGroup::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodGroup::APositive => "A+",
            BloodGroup::ANegative => "A−",
            BloodGroup::BPositive => "B+",
            BloodGroup::BNegative => "B−",
            BloodGroup::AbPositive => "AB+",
            BloodGroup::AbNegative => "AB−",
            BloodGroup::OPositive => "O+",
            BloodGroup::ONegative => "O−",
        }
    }
}

impl FromStr for BloodGroup {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "−");
        BloodGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| ParseEnumError {
                kind: "blood group",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GradeLabel {
    pub const ALL: [GradeLabel; 4] = [
        GradeLabel::Grade12,
        GradeLabel::Undergraduate,
        GradeLabel::Graduate,
        GradeLabel::Postgraduate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLabel::Grade12 => "Grade 12",
            GradeLabel::Undergraduate => "Undergraduate",
            GradeLabel::Graduate => "Graduate",
            GradeLabel::Postgraduate => "Postgraduate",
        }
    }
}

impl FromStr for GradeLabel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeLabel::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseEnumError {
                kind: "grade label",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored registration as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: String, // ISO 8601 date format (YYYY-MM-DD)
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
    pub created_at: String, // RFC 3339 timestamp
}

/// Position of a registration form session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    Step1,
    Step2,
    Step3,
    Submitted,
}

/// The in-progress registration as shown to the form.
/// Image bytes never leave the server; only the filename is echoed back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftView {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<String>,
    pub email: String,
    pub mobile: String,
    pub profile_image_name: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub allergies: String,
    pub medications: String,
    pub mother_name: String,
    pub mother_mobile: String,
    pub mother_occupation: String,
    pub father_name: String,
    pub father_mobile: String,
}

/// Deserialize a field where absent means "unchanged" and `null` means
/// "clear": absent stays `None` via `#[serde(default)]`, `null` becomes
/// `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update of draft fields. Absent fields are left untouched.
///
/// `gender`, `date_of_birth` and `blood_group` are cleared with `null`;
/// `date_of_birth` takes `YYYY-MM-DD` and is also cleared by an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateDraftRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub gender: Option<Option<Gender>>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Option<String>>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    #[serde(deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<Option<BloodGroup>>,
    pub allergies: Option<String>,
    pub medications: Option<String>,
    pub mother_name: Option<String>,
    pub mother_mobile: Option<String>,
    pub mother_occupation: Option<String>,
    pub father_name: Option<String>,
    pub father_mobile: Option<String>,
}

/// Query string for uploading a profile image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileImageQuery {
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// A toast-style message for the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub variant: NotificationVariant,
    pub title: String,
    pub description: String,
}

/// Something the UI layer should do after a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEffect {
    ShowNotification { notification: Notification },
    Navigate { to: FormPhase },
    SubmissionStarted,
}

/// Full state of a registration session after an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSnapshot {
    pub session_id: String,
    pub phase: FormPhase,
    /// 1-based step number, `None` once submitted
    pub step: Option<u8>,
    pub total_steps: u8,
    pub progress_percent: u8,
    pub step_title: String,
    pub draft: DraftView,
    pub effects: Vec<FormEffect>,
    pub record: Option<StudentRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_at: String, // RFC 3339 timestamp
    pub success_message: String,
}

/// Changes to the dashboard search and filters.
/// Filters use "all" to mean no filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardQueryRequest {
    pub search: Option<String>,
    pub grade: Option<String>,
    pub blood_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPageRequest {
    pub page: u32,
}

/// One row of the admin student table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRow {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub gender: Gender,
    pub grade_label: GradeLabel,
    pub blood_group: BloodGroup,
    pub mother_mobile: String,
    pub submitted_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_students: usize,
    pub filtered_results: usize,
    pub grade_levels: usize,
    pub blood_groups: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFilters {
    pub search: String,
    pub grade: String,
    pub blood_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub grade_labels: Vec<GradeLabel>,
    pub blood_groups: Vec<BloodGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page: u32,
    pub total_pages: u32,
    pub page_size: u32,
    pub total_records: usize,
    pub showing_from: usize,
    pub showing_to: usize,
    pub caption: String,
    pub page_numbers: Vec<u32>,
    pub has_previous: bool,
    pub has_next: bool,
}

/// Everything the admin dashboard renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub filters: DashboardFilters,
    pub filter_options: FilterOptions,
    pub students: Vec<StudentRow>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDetailResponse {
    pub student: StudentRecord,
    pub grade_label: GradeLabel,
}

/// Log line forwarded from a UI client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub component: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trips_through_str() {
        for gender in Gender::ALL {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("unknown".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_serializes_kebab_case() {
        let json = serde_json::to_string(&Gender::PreferNotToSay).unwrap();
        assert_eq!(json, "\"prefer-not-to-say\"");
    }

    #[test]
    fn test_blood_group_accepts_ascii_hyphen() {
        assert_eq!("A-".parse::<BloodGroup>().unwrap(), BloodGroup::ANegative);
        assert_eq!("AB−".parse::<BloodGroup>().unwrap(), BloodGroup::AbNegative);
        assert_eq!(" O+ ".parse::<BloodGroup>().unwrap(), BloodGroup::OPositive);
        assert!("C+".parse::<BloodGroup>().is_err());

        let parsed: BloodGroup = serde_json::from_str("\"B-\"").unwrap();
        assert_eq!(parsed, BloodGroup::BNegative);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"B−\"");
    }

    #[test]
    fn test_grade_label_display() {
        assert_eq!(GradeLabel::Grade12.to_string(), "Grade 12");
        assert_eq!("grade 12".parse::<GradeLabel>().unwrap(), GradeLabel::Grade12);
        assert_eq!(
            serde_json::to_string(&GradeLabel::Grade12).unwrap(),
            "\"Grade 12\""
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = "x".parse::<GradeLabel>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown grade label: 'x'");
    }

    #[test]
    fn test_form_effect_is_tagged() {
        let effect = FormEffect::Navigate { to: FormPhase::Step2 };
        let json = serde_json::to_value(&effect).unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["to"], "step2");
    }

    #[test]
    fn test_update_request_defaults_missing_fields() {
        let request: UpdateDraftRequest =
            serde_json::from_str(r#"{"first_name":"Anna"}"#).unwrap();
        assert_eq!(request.first_name.as_deref(), Some("Anna"));
        assert!(request.gender.is_none());
        assert!(request.date_of_birth.is_none());
    }

    #[test]
    fn test_update_request_null_clears() {
        let request: UpdateDraftRequest = serde_json::from_str(
            r#"{"gender":null,"blood_group":null,"date_of_birth":null,"mobile":null}"#,
        )
        .unwrap();
        assert_eq!(request.gender, Some(None));
        assert_eq!(request.blood_group, Some(None));
        assert_eq!(request.date_of_birth, Some(None));
        // Plain text fields treat null as absent
        assert_eq!(request.mobile, None);

        let request: UpdateDraftRequest =
            serde_json::from_str(r#"{"gender":"male","blood_group":"O-"}"#).unwrap();
        assert_eq!(request.gender, Some(Some(Gender::Male)));
        assert_eq!(request.blood_group, Some(Some(BloodGroup::ONegative)));
    }
}
