//! Admin list queries over an already fetched set of students.
//!
//! All records are loaded once; search, filters and pagination run in memory
//! and never reorder the input (which arrives newest first).

use chrono::NaiveDate;
use shared::{BloodGroup, GradeLabel};
use std::str::FromStr;

use crate::domain::models::Student;
use crate::domain::validation::age_in_years;

pub const PAGE_SIZE: usize = 10;
/// How many page buttons the dashboard shows at once
pub const PAGE_WINDOW: u32 = 5;

/// Derive a grade label from the applicant's age today
pub fn classify_age(date_of_birth: Option<NaiveDate>, today: NaiveDate) -> GradeLabel {
    match date_of_birth.and_then(|dob| age_in_years(dob, today)) {
        Some(18..=19) => GradeLabel::Grade12,
        Some(20..=22) => GradeLabel::Undergraduate,
        Some(23..=25) => GradeLabel::Graduate,
        _ => GradeLabel::Postgraduate,
    }
}

pub fn classify(student: &Student, today: NaiveDate) -> GradeLabel {
    classify_age(Some(student.date_of_birth), today)
}

/// A categorical filter where "all" disables filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter<T> {
    All,
    Only(T),
}

impl<T> Default for CategoryFilter<T> {
    fn default() -> Self {
        CategoryFilter::All
    }
}

impl<T: PartialEq> CategoryFilter<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(expected) => expected == value,
        }
    }
}

impl<T: FromStr> CategoryFilter<T> {
    /// Parse a filter value; "all" (or an empty string) means no filtering
    pub fn parse(raw: &str) -> Result<Self, T::Err> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            raw.parse().map(CategoryFilter::Only)
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for CategoryFilter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Only(value) => value.fmt(f),
        }
    }
}

pub type GradeFilter = CategoryFilter<GradeLabel>;
pub type BloodGroupFilter = CategoryFilter<BloodGroup>;

/// Search text and filters applied to the list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCriteria {
    pub search: String,
    pub grade: GradeFilter,
    pub blood_group: BloodGroupFilter,
}

fn matches_search(student: &Student, needle: &str) -> bool {
    needle.is_empty()
        || student.full_name().to_lowercase().contains(needle)
        || student.email.to_lowercase().contains(needle)
}

/// Keep the students that match every criterion, in input order
pub fn filter<'a>(
    students: &'a [Student],
    criteria: &ListCriteria,
    today: NaiveDate,
) -> Vec<&'a Student> {
    let needle = criteria.search.to_lowercase();
    students
        .iter()
        .filter(|s| matches_search(s, &needle))
        .filter(|s| criteria.grade.matches(&classify(s, today)))
        .filter(|s| criteria.blood_group.matches(&s.blood_group))
        .collect()
}

/// ceil(count / page_size), but never less than 1
pub fn total_pages(count: usize, page_size: usize) -> u32 {
    let size = page_size.max(1);
    (count.div_ceil(size)).max(1) as u32
}

/// The slice of `items` on the 1-based `page`, plus the total page count.
///
/// The page is not clamped: a page past the end yields an empty slice.
pub fn paginate<T>(items: &[T], page: u32, page_size: usize) -> (&[T], u32) {
    let pages = total_pages(items.len(), page_size);
    let start = (page.max(1) as usize - 1).saturating_mul(page_size);
    if start >= items.len() {
        return (&[], pages);
    }
    let end = (start + page_size).min(items.len());
    (&items[start..end], pages)
}

/// Page numbers for the pager buttons: at most five, kept around `page`
pub fn page_window(page: u32, total_pages: u32) -> Vec<u32> {
    let shown = total_pages.min(PAGE_WINDOW);
    let first = if total_pages <= PAGE_WINDOW || page <= 3 {
        1
    } else if page >= total_pages.saturating_sub(2) {
        total_pages - PAGE_WINDOW + 1
    } else {
        page - 2
    };
    (first..first + shown).collect()
}

/// Distinct values in first-seen order
fn distinct<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

/// One computed page of the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub criteria: ListCriteria,
    pub students: Vec<Student>,
    pub page: u32,
    pub total_pages: u32,
    pub total_records: usize,
    pub filtered_records: usize,
    pub showing_from: usize,
    pub showing_to: usize,
    pub page_numbers: Vec<u32>,
    pub grade_options: Vec<GradeLabel>,
    pub blood_group_options: Vec<BloodGroup>,
}

impl QueryPage {
    pub fn caption(&self) -> String {
        format!(
            "Showing {}-{} of {} records",
            self.showing_from, self.showing_to, self.filtered_records
        )
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Dashboard query state over a fetched record set.
///
/// Any change to the search text or a filter moves back to page 1.
#[derive(Debug, Clone)]
pub struct AdminQueryView {
    students: Vec<Student>,
    criteria: ListCriteria,
    page: u32,
}

impl AdminQueryView {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            students,
            criteria: ListCriteria::default(),
            page: 1,
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn criteria(&self) -> &ListCriteria {
        &self.criteria
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Replace the record set (a reload); filters are kept, page resets
    pub fn replace_students(&mut self, students: Vec<Student>) {
        self.students = students;
        self.page = 1;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.criteria.search = search.into();
        self.page = 1;
    }

    pub fn set_grade_filter(&mut self, grade: GradeFilter) {
        self.criteria.grade = grade;
        self.page = 1;
    }

    pub fn set_blood_group_filter(&mut self, blood_group: BloodGroupFilter) {
        self.criteria.blood_group = blood_group;
        self.page = 1;
    }

    /// Move to another page; zero is treated as page 1
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn query(&self, today: NaiveDate) -> QueryPage {
        let matching = filter(&self.students, &self.criteria, today);
        let (slice, total_pages) = paginate(&matching, self.page, PAGE_SIZE);

        let filtered_records = matching.len();
        let showing_from = (self.page as usize - 1) * PAGE_SIZE + 1;
        let showing_to = (self.page as usize * PAGE_SIZE).min(filtered_records);

        QueryPage {
            criteria: self.criteria.clone(),
            students: slice.iter().map(|s| (*s).clone()).collect(),
            page: self.page,
            total_pages,
            total_records: self.students.len(),
            filtered_records,
            showing_from,
            showing_to,
            page_numbers: page_window(self.page, total_pages),
            grade_options: distinct(self.students.iter().map(|s| classify(s, today))),
            blood_group_options: distinct(self.students.iter().map(|s| s.blood_group)),
        }
    }
}
