//! Public job search. Filters are appended with `QueryBuilder` so every user
//! value is a bind parameter; the count and page queries share one filter
//! builder and therefore always agree.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::paginate;
use crate::models::job::{ExperienceLevel, JobListingRow, JobType, WorkMode};

pub const MAX_PER_PAGE: i64 = 50;

/// Query string accepted by `GET /api/jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobSearchParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub work_mode: Option<WorkMode>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<i32>,
    pub organization_id: Option<Uuid>,
    /// Comma-separated skill names.
    pub skills: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Normalized filters; blank text filters are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilters {
    pub q: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<JobType>,
    pub work_mode: Option<WorkMode>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_min: Option<i32>,
    pub organization_id: Option<Uuid>,
    pub skills: Vec<String>,
}

impl From<&JobSearchParams> for JobFilters {
    fn from(params: &JobSearchParams) -> Self {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let skills = params
            .skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        JobFilters {
            q: text(&params.q),
            location: text(&params.location),
            job_type: params.job_type,
            work_mode: params.work_mode,
            experience_level: params.experience_level,
            salary_min: params.salary_min,
            organization_id: params.organization_id,
            skills,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobSearchResponse {
    pub jobs: Vec<JobListingRow>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Wraps `value` for `ILIKE`, escaping the pattern metacharacters.
pub fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends `AND ...` clauses for every requested filter. Expects the posting
/// table to be aliased `j` and a `WHERE` clause to be open.
pub fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &JobFilters) {
    if let Some(q) = &filters.q {
        let pattern = like_pattern(q);
        qb.push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = &filters.location {
        qb.push(" AND j.location ILIKE ")
            .push_bind(like_pattern(location));
    }
    if let Some(job_type) = filters.job_type {
        qb.push(" AND j.job_type = ").push_bind(job_type.as_str());
    }
    if let Some(work_mode) = filters.work_mode {
        qb.push(" AND j.work_mode = ").push_bind(work_mode.as_str());
    }
    if let Some(level) = filters.experience_level {
        qb.push(" AND j.experience_level = ").push_bind(level.as_str());
    }
    if let Some(salary_min) = filters.salary_min {
        qb.push(" AND (j.salary_max IS NULL OR j.salary_max >= ")
            .push_bind(salary_min)
            .push(")");
    }
    if let Some(org_id) = filters.organization_id {
        qb.push(" AND j.organization_id = ").push_bind(org_id);
    }
    if !filters.skills.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM unnest(j.skills) AS s WHERE lower(s) = ANY(")
            .push_bind(filters.skills.clone())
            .push("))");
    }
}

pub fn count_query(filters: &JobFilters) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM job_postings j WHERE j.status = 'open'");
    push_filters(&mut qb, filters);
    qb
}

pub fn page_query(filters: &JobFilters, limit: i64, offset: i64) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT j.*, o.name AS organization_name, o.logo_url AS organization_logo_url
        FROM job_postings j
        JOIN organizations o ON o.id = j.organization_id
        WHERE j.status = 'open'"#,
    );
    push_filters(&mut qb, filters);
    qb.push(" ORDER BY j.created_at DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    qb
}

pub async fn search_jobs(
    pool: &PgPool,
    params: &JobSearchParams,
) -> Result<JobSearchResponse, sqlx::Error> {
    let filters = JobFilters::from(params);
    let (page, per_page, offset) = paginate(params.page, params.per_page, MAX_PER_PAGE);

    let mut count = count_query(&filters);
    let mut listing = page_query(&filters, per_page, offset);
    let (total, jobs) = tokio::try_join!(
        count.build_query_scalar::<i64>().fetch_one(pool),
        listing.build_query_as::<JobListingRow>().fetch_all(pool),
    )?;

    Ok(JobSearchResponse {
        jobs,
        page,
        per_page,
        total,
    })
}
