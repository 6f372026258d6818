use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostingRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub posted_by: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub job_type: String,
    pub work_mode: String,
    pub experience_level: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: String,
    pub status: String,
    pub application_deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A posting joined with its organization, as returned by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListingRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobPostingRow,
    pub organization_name: String,
    pub organization_logo_url: Option<String>,
}

/// A posting with the owner's view of its application count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmployerJobRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: JobPostingRow,
    pub organization_name: String,
    pub application_count: i64,
}

/// Ownership projection used by authorization checks.
#[derive(Debug, Clone, FromRow)]
pub struct JobOwnerRow {
    pub id: Uuid,
    pub status: String,
    pub owner_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Temporary,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full_time",
            JobType::PartTime => "part_time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
            JobType::Temporary => "temporary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkMode {
    Onsite,
    Remote,
    Hybrid,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Onsite => "onsite",
            WorkMode::Remote => "remote",
            WorkMode::Hybrid => "hybrid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Mid => "mid",
            ExperienceLevel::Senior => "senior",
            ExperienceLevel::Lead => "lead",
            ExperienceLevel::Executive => "executive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    #[default]
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names_match_as_str() {
        for t in [
            JobType::FullTime,
            JobType::PartTime,
            JobType::Contract,
            JobType::Internship,
            JobType::Temporary,
        ] {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
        for m in [WorkMode::Onsite, WorkMode::Remote, WorkMode::Hybrid] {
            assert_eq!(serde_json::to_value(m).unwrap(), m.as_str());
        }
        assert_eq!(
            serde_json::to_value(ExperienceLevel::Executive).unwrap(),
            "executive"
        );
    }

    #[test]
    fn test_job_status_defaults_to_open() {
        assert_eq!(JobStatus::default(), JobStatus::Open);
        let parsed: JobStatus = serde_json::from_str(r#""closed""#).unwrap();
        assert_eq!(parsed, JobStatus::Closed);
    }

    #[test]
    fn test_listing_row_serializes_flat() {
        let now = Utc::now();
        let row = JobListingRow {
            job: JobPostingRow {
                id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                posted_by: Uuid::new_v4(),
                title: "Rust Engineer".to_string(),
                description: "Build services".to_string(),
                requirements: vec![],
                skills: vec!["rust".to_string()],
                location: None,
                job_type: "full_time".to_string(),
                work_mode: "remote".to_string(),
                experience_level: "senior".to_string(),
                salary_min: None,
                salary_max: None,
                salary_currency: "USD".to_string(),
                status: "open".to_string(),
                application_deadline: None,
                created_at: now,
                updated_at: now,
            },
            organization_name: "Acme".to_string(),
            organization_logo_url: None,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["title"], "Rust Engineer");
        assert_eq!(value["organization_name"], "Acme");
        assert!(value.get("job").is_none());
    }
}
