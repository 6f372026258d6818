//! Request bodies for profile sections. `validate` returns a normalized copy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::{JobType, WorkMode};
use crate::models::profile::{LanguageProficiency, SkillLevel};
use crate::validation::{
    date_range, non_negative, normalize_list, optional, optional_url, required, MAX_SHORT_TEXT_LEN,
    MAX_TEXT_LEN,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileInput {
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileInput {
    pub fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            full_name: optional("full_name", self.full_name.as_deref(), MAX_SHORT_TEXT_LEN)?,
            headline: optional("headline", self.headline.as_deref(), MAX_SHORT_TEXT_LEN)?,
            bio: optional("bio", self.bio.as_deref(), MAX_TEXT_LEN)?,
            location: optional("location", self.location.as_deref(), MAX_SHORT_TEXT_LEN)?,
            phone: validate_phone(self.phone.as_deref())?,
            avatar_url: optional_url("avatar_url", self.avatar_url.as_deref())?,
        })
    }
}

fn validate_phone(phone: Option<&str>) -> Result<Option<String>, AppError> {
    let phone = optional("phone", phone, 32)?;
    if let Some(p) = &phone {
        let digits = p.chars().filter(|c| c.is_ascii_digit()).count();
        let allowed = p
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
        if !allowed || digits < 6 {
            return Err(AppError::Validation(
                "phone must be a valid phone number".to_string(),
            ));
        }
    }
    Ok(phone)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceInput {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    pub description: Option<String>,
}

impl ExperienceInput {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.is_current && self.end_date.is_some() {
            return Err(AppError::Validation(
                "experience: a current position cannot have an end date".to_string(),
            ));
        }
        date_range("experience", Some(self.start_date), self.end_date)?;
        Ok(Self {
            company: required("company", &self.company, MAX_SHORT_TEXT_LEN)?,
            title: required("title", &self.title, MAX_SHORT_TEXT_LEN)?,
            location: optional("location", self.location.as_deref(), MAX_SHORT_TEXT_LEN)?,
            description: optional("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationInput {
    pub institution: String,
    pub degree: String,
    pub field_of_study: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub grade: Option<String>,
    pub description: Option<String>,
}

impl EducationInput {
    pub fn validate(self) -> Result<Self, AppError> {
        date_range("education", self.start_date, self.end_date)?;
        Ok(Self {
            institution: required("institution", &self.institution, MAX_SHORT_TEXT_LEN)?,
            degree: required("degree", &self.degree, MAX_SHORT_TEXT_LEN)?,
            field_of_study: optional(
                "field_of_study",
                self.field_of_study.as_deref(),
                MAX_SHORT_TEXT_LEN,
            )?,
            grade: optional("grade", self.grade.as_deref(), 32)?,
            description: optional("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInput {
    pub name: String,
    pub level: SkillLevel,
    pub years_experience: Option<i32>,
}

impl SkillInput {
    pub fn validate(self) -> Result<Self, AppError> {
        non_negative("years_experience", self.years_experience)?;
        if self.years_experience.is_some_and(|y| y > 60) {
            return Err(AppError::Validation(
                "years_experience must be at most 60".to_string(),
            ));
        }
        Ok(Self {
            name: required("name", &self.name, 64)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ProjectInput {
    pub fn validate(self) -> Result<Self, AppError> {
        date_range("project", self.start_date, self.end_date)?;
        Ok(Self {
            name: required("name", &self.name, MAX_SHORT_TEXT_LEN)?,
            description: optional("description", self.description.as_deref(), MAX_TEXT_LEN)?,
            url: optional_url("url", self.url.as_deref())?,
            technologies: normalize_list(&self.technologies),
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationInput {
    pub name: String,
    pub issuer: String,
    pub issue_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
}

impl CertificationInput {
    pub fn validate(self) -> Result<Self, AppError> {
        date_range("certification", self.issue_date, self.expiry_date)?;
        Ok(Self {
            name: required("name", &self.name, MAX_SHORT_TEXT_LEN)?,
            issuer: required("issuer", &self.issuer, MAX_SHORT_TEXT_LEN)?,
            credential_id: optional(
                "credential_id",
                self.credential_id.as_deref(),
                MAX_SHORT_TEXT_LEN,
            )?,
            credential_url: optional_url("credential_url", self.credential_url.as_deref())?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageInput {
    pub name: String,
    pub proficiency: LanguageProficiency,
}

impl LanguageInput {
    pub fn validate(self) -> Result<Self, AppError> {
        Ok(Self {
            name: required("name", &self.name, 64)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesInput {
    #[serde(default)]
    pub desired_titles: Vec<String>,
    #[serde(default)]
    pub desired_locations: Vec<String>,
    #[serde(default)]
    pub job_types: Vec<JobType>,
    #[serde(default)]
    pub work_modes: Vec<WorkMode>,
    pub salary_expectation: Option<i32>,
    #[serde(default)]
    pub willing_to_relocate: bool,
}

impl PreferencesInput {
    pub fn validate(self) -> Result<Self, AppError> {
        non_negative("salary_expectation", self.salary_expectation)?;
        Ok(Self {
            desired_titles: normalize_list(&self.desired_titles),
            desired_locations: normalize_list(&self.desired_locations),
            job_types: dedup_in_order(&self.job_types),
            work_modes: dedup_in_order(&self.work_modes),
            salary_expectation: self.salary_expectation,
            willing_to_relocate: self.willing_to_relocate,
        })
    }

    pub fn job_type_strings(&self) -> Vec<String> {
        self.job_types.iter().map(|t| t.as_str().to_string()).collect()
    }

    pub fn work_mode_strings(&self) -> Vec<String> {
        self.work_modes.iter().map(|m| m.as_str().to_string()).collect()
    }
}

fn dedup_in_order<T: Copy + PartialEq>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(*v);
        }
    }
    out
}

/// Rejects duplicate names within one submitted list (case-insensitive).
pub fn ensure_unique_names<'a>(
    section: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name.trim().to_lowercase()) {
            return Err(AppError::Validation(format!(
                "{section}: duplicate entry '{}'",
                name.trim()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn experience() -> ExperienceInput {
        ExperienceInput {
            company: " Acme ".to_string(),
            title: "Engineer".to_string(),
            location: Some(" ".to_string()),
            start_date: date(2020, 1, 1),
            end_date: Some(date(2022, 6, 1)),
            is_current: false,
            description: None,
        }
    }

    #[test]
    fn test_experience_normalizes_fields() {
        let e = experience().validate().unwrap();
        assert_eq!(e.company, "Acme");
        assert_eq!(e.location, None);
    }

    #[test]
    fn test_current_experience_cannot_have_end_date() {
        let e = ExperienceInput {
            is_current: true,
            ..experience()
        };
        assert!(matches!(e.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_experience_end_before_start_rejected() {
        let e = ExperienceInput {
            end_date: Some(date(2019, 1, 1)),
            ..experience()
        };
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_skill_years_bounds() {
        let skill = |years| SkillInput {
            name: "Rust".to_string(),
            level: SkillLevel::Advanced,
            years_experience: years,
        };
        assert!(skill(Some(5)).validate().is_ok());
        assert!(skill(Some(-1)).validate().is_err());
        assert!(skill(Some(61)).validate().is_err());
    }

    #[test]
    fn test_skill_level_rejects_unknown_value() {
        let result: Result<SkillInput, _> =
            serde_json::from_str(r#"{"name": "Rust", "level": "wizard"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_project_technologies_normalized() {
        let p = ProjectInput {
            name: "CLI".to_string(),
            description: None,
            url: Some("https://github.com/acme/cli".to_string()),
            technologies: vec!["Rust".into(), "rust".into(), " Tokio ".into()],
            start_date: None,
            end_date: None,
        }
        .validate()
        .unwrap();
        assert_eq!(p.technologies, vec!["Rust", "Tokio"]);
    }

    #[test]
    fn test_profile_phone_validation() {
        let input = |phone: &str| ProfileInput {
            phone: Some(phone.to_string()),
            ..Default::default()
        };
        assert!(input("+1 (555) 123-4567").validate().is_ok());
        assert!(input("call me").validate().is_err());
        assert!(input("123").validate().is_err());
    }

    #[test]
    fn test_preferences_strings() {
        let prefs = PreferencesInput {
            job_types: vec![JobType::FullTime, JobType::FullTime, JobType::Contract],
            work_modes: vec![WorkMode::Remote],
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(prefs.job_type_strings(), vec!["full_time", "contract"]);
        assert_eq!(prefs.work_mode_strings(), vec!["remote"]);
    }

    #[test]
    fn test_ensure_unique_names() {
        assert!(ensure_unique_names("skills", ["Rust", "Go"].into_iter()).is_ok());
        assert!(ensure_unique_names("skills", ["Rust", " rust"].into_iter()).is_err());
    }
}
