use anyhow::{Context, Result};
use chrono::NaiveDate;
use shared::{
    DashboardFilters, DashboardQueryRequest, DashboardStats, DashboardView, FilterOptions, PageInfo,
};

use crate::domain::commands::admin::UpdateDashboardQueryCommand;
use crate::domain::list_query::{BloodGroupFilter, GradeFilter, QueryPage, PAGE_SIZE};
use crate::io::rest::mappers::StudentMapper;

/// Mapper between the admin dashboard query state and its DTOs
pub struct DashboardMapper;

impl DashboardMapper {
    pub fn to_dto(page: QueryPage, today: NaiveDate) -> DashboardView {
        let caption = page.caption();
        let has_previous = page.has_previous();
        let has_next = page.has_next();

        DashboardView {
            stats: DashboardStats {
                total_students: page.total_records,
                filtered_results: page.filtered_records,
                grade_levels: page.grade_options.len(),
                blood_groups: page.blood_group_options.len(),
            },
            filters: DashboardFilters {
                search: page.criteria.search.clone(),
                grade: page.criteria.grade.to_string(),
                blood_group: page.criteria.blood_group.to_string(),
            },
            filter_options: FilterOptions {
                grade_labels: page.grade_options,
                blood_groups: page.blood_group_options,
            },
            students: page
                .students
                .iter()
                .map(|s| StudentMapper::to_row(s, today))
                .collect(),
            pagination: PageInfo {
                page: page.page,
                total_pages: page.total_pages,
                page_size: PAGE_SIZE as u32,
                total_records: page.filtered_records,
                showing_from: page.showing_from,
                showing_to: page.showing_to,
                caption,
                page_numbers: page.page_numbers,
                has_previous,
                has_next,
            },
        }
    }

    /// Parse filter values; "all" turns a filter off
    pub fn to_query_command(request: DashboardQueryRequest) -> Result<UpdateDashboardQueryCommand> {
        let grade = request
            .grade
            .map(|raw| GradeFilter::parse(&raw))
            .transpose()
            .context("Invalid grade filter")?;
        let blood_group = request
            .blood_group
            .map(|raw| BloodGroupFilter::parse(&raw))
            .transpose()
            .context("Invalid blood group filter")?;

        Ok(UpdateDashboardQueryCommand {
            search: request.search,
            grade,
            blood_group,
        })
    }
}
