use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{ExperienceLevel, JobStatus, JobType, WorkMode};
use crate::validation::{
    non_negative, normalize_list, optional, required, MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN,
};

/// Editable fields of a posting. Shared by create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct JobInput {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub job_type: JobType,
    pub work_mode: WorkMode,
    pub experience_level: ExperienceLevel,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub status: JobStatus,
    pub application_deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub organization_id: Uuid,
    #[serde(flatten)]
    pub job: JobInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusRequest {
    pub status: JobStatus,
}

impl JobInput {
    pub fn validate(self) -> Result<Self, AppError> {
        non_negative("salary_min", self.salary_min)?;
        non_negative("salary_max", self.salary_max)?;
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(AppError::Validation(
                    "salary_min must not exceed salary_max".to_string(),
                ));
            }
        }

        let salary_currency = match self.salary_currency.as_deref().map(str::trim) {
            None | Some("") => "USD".to_string(),
            Some(c) if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) => {
                c.to_ascii_uppercase()
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "salary_currency must be a 3-letter ISO code".to_string(),
                ))
            }
        };

        Ok(Self {
            title: required("title", &self.title, MAX_SHORT_TEXT_LEN)?,
            description: required("description", &self.description, MAX_TEXT_LEN)?,
            requirements: normalize_list(&self.requirements),
            skills: normalize_list(&self.skills),
            location: optional("location", self.location.as_deref(), MAX_SHORT_TEXT_LEN)?,
            salary_currency: Some(salary_currency),
            ..self
        })
    }

    /// Deadlines are only checked when a posting is created.
    pub fn check_deadline(&self, today: NaiveDate) -> Result<(), AppError> {
        match self.application_deadline {
            Some(deadline) if deadline < today => Err(AppError::Validation(
                "application_deadline must not be in the past".to_string(),
            )),
            _ => Ok(()),
        }
    }

    pub fn currency(&self) -> &str {
        self.salary_currency.as_deref().unwrap_or("USD")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(extra: serde_json::Value) -> JobInput {
        let mut base = json!({
            "title": " Backend Engineer ",
            "description": "Build the API",
            "job_type": "full_time",
            "work_mode": "remote",
            "experience_level": "mid",
            "skills": ["Rust", "rust", " SQL "]
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_validate_normalizes_and_defaults() {
        let job = input(json!({})).validate().unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.skills, vec!["Rust", "SQL"]);
        assert_eq!(job.currency(), "USD");
        assert_eq!(job.status, JobStatus::Open);
    }

    #[test]
    fn test_salary_range_must_be_ordered() {
        let err = input(json!({ "salary_min": 90000, "salary_max": 50000 })).validate();
        assert!(matches!(err, Err(AppError::Validation(m)) if m.contains("salary_min")));
        assert!(input(json!({ "salary_min": 50000, "salary_max": 50000 }))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_currency_code() {
        let job = input(json!({ "salary_currency": "tnd" })).validate().unwrap();
        assert_eq!(job.currency(), "TND");
        assert!(input(json!({ "salary_currency": "dinar" })).validate().is_err());
    }

    #[test]
    fn test_blank_description_rejected() {
        assert!(input(json!({ "description": "  " })).validate().is_err());
    }

    #[test]
    fn test_unknown_enum_value_fails_to_deserialize() {
        let result: Result<JobInput, _> = serde_json::from_value(json!({
            "title": "x", "description": "y",
            "job_type": "gig", "work_mode": "remote", "experience_level": "mid"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_deadline_in_past_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let past = input(json!({ "application_deadline": "2025-05-31" }));
        assert!(past.check_deadline(today).is_err());
        let same_day = input(json!({ "application_deadline": "2025-06-01" }));
        assert!(same_day.check_deadline(today).is_ok());
    }

    #[test]
    fn test_create_request_flattens_job_fields() {
        let req: CreateJobRequest = serde_json::from_value(json!({
            "organization_id": "00000000-0000-0000-0000-000000000000",
            "title": "x", "description": "y",
            "job_type": "contract", "work_mode": "onsite", "experience_level": "lead"
        }))
        .unwrap();
        assert_eq!(req.organization_id, Uuid::nil());
        assert_eq!(req.job.job_type, JobType::Contract);
    }
}
