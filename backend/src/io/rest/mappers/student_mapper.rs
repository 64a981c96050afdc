use chrono::{NaiveDate, SecondsFormat};
use shared::{StudentDetailResponse, StudentRecord, StudentRow};

use crate::domain::list_query::classify;
use crate::domain::models::Student;

/// Mapper from stored students to the shared record and row DTOs
pub struct StudentMapper;

impl StudentMapper {
    pub fn to_dto(domain: Student) -> StudentRecord {
        StudentRecord {
            id: domain.id,
            first_name: domain.first_name,
            last_name: domain.last_name,
            gender: domain.gender,
            date_of_birth: domain.date_of_birth.format("%Y-%m-%d").to_string(),
            email: domain.email,
            mobile: domain.mobile,
            profile_image_url: domain.profile_image_url,
            blood_group: domain.blood_group,
            allergies: domain.allergies,
            medications: domain.medications,
            mother_name: domain.mother_name,
            mother_mobile: domain.mother_mobile,
            mother_occupation: domain.mother_occupation,
            father_name: domain.father_name,
            father_mobile: domain.father_mobile,
            created_at: domain.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// One line of the dashboard table
    pub fn to_row(domain: &Student, today: NaiveDate) -> StudentRow {
        StudentRow {
            id: domain.id.clone(),
            full_name: domain.full_name(),
            email: domain.email.clone(),
            mobile: domain.mobile.clone(),
            gender: domain.gender,
            grade_label: classify(domain, today),
            blood_group: domain.blood_group,
            mother_mobile: domain.mother_mobile.clone(),
            submitted_at: domain.created_at.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn to_detail_dto(domain: Student, today: NaiveDate) -> StudentDetailResponse {
        let grade_label = classify(&domain, today);
        StudentDetailResponse {
            student: Self::to_dto(domain),
            grade_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::list_query::tests::{student, today};
    use shared::{BloodGroup, GradeLabel};

    #[test]
    fn test_to_dto_formats_dates() {
        let s = student("Anna", "Lee", "anna@example.com", 21, BloodGroup::AbNegative);

        let dto = StudentMapper::to_dto(s);

        assert_eq!(dto.date_of_birth, "2003-01-10");
        assert_eq!(dto.created_at, "2024-06-01T08:00:00Z");
        assert_eq!(dto.blood_group, BloodGroup::AbNegative);
    }

    #[test]
    fn test_row_carries_derived_grade() {
        let s = student("Anna", "Lee", "anna@example.com", 24, BloodGroup::APositive);

        let row = StudentMapper::to_row(&s, today());

        assert_eq!(row.full_name, "Anna Lee");
        assert_eq!(row.grade_label, GradeLabel::Graduate);
        assert_eq!(row.submitted_at, "2024-06-01");

        let detail = StudentMapper::to_detail_dto(s, today());
        assert_eq!(detail.grade_label, GradeLabel::Graduate);
        assert_eq!(detail.student.first_name, "Anna");
    }
}
