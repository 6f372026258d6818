//! Job matching: a pluggable, trait-based matcher that ranks open postings
//! for a candidate.
//!
//! Default: `KeywordJobMatcher` (pure Rust, deterministic, no network).
//! `AppState` holds an `Arc<dyn JobMatcher>` chosen at startup.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobListingRow;
use crate::profiles::repo::ProfileBundle;

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs (shared across matcher backends)
// ────────────────────────────────────────────────────────────────────────────

/// The parts of a candidate profile that matching looks at, lowercased.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchProfile {
    pub skills: Vec<String>,
    pub desired_titles: Vec<String>,
    pub desired_locations: Vec<String>,
    pub work_modes: Vec<String>,
}

impl From<&ProfileBundle> for MatchProfile {
    fn from(bundle: &ProfileBundle) -> Self {
        let lower = |values: &[String]| -> Vec<String> {
            values.iter().map(|v| v.trim().to_lowercase()).collect()
        };
        let skill_names: Vec<String> = bundle.skills.iter().map(|s| s.name.clone()).collect();
        match &bundle.preferences {
            Some(prefs) => MatchProfile {
                skills: lower(&skill_names),
                desired_titles: lower(&prefs.desired_titles),
                desired_locations: lower(&prefs.desired_locations),
                work_modes: lower(&prefs.work_modes),
            },
            None => MatchProfile {
                skills: lower(&skill_names),
                ..Default::default()
            },
        }
    }
}

/// How one job skill relates to the candidate's skills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillFit {
    Strong,
    Partial,
    Gap,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    #[serde(flatten)]
    pub job: JobListingRow,
    pub score: u32,
    pub strong_matches: Vec<String>,
    pub partial_matches: Vec<String>,
    pub gaps: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap matching backends without touching handlers.
#[async_trait]
pub trait JobMatcher: Send + Sync {
    /// Returns at most `limit` matches, best first.
    async fn rank(
        &self,
        profile: &MatchProfile,
        jobs: Vec<JobListingRow>,
        limit: usize,
    ) -> Result<Vec<JobMatch>, AppError>;

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordJobMatcher
// ────────────────────────────────────────────────────────────────────────────

const SKILL_WEIGHT: f64 = 0.5;
const TITLE_WEIGHT: f64 = 0.2;
const LOCATION_WEIGHT: f64 = 0.15;
const WORK_MODE_WEIGHT: f64 = 0.15;
/// Score used for a dimension the candidate left unspecified.
const NEUTRAL: f64 = 0.5;

/// Keyword matcher.
///
/// 1. Each job skill: exact match with a candidate skill → 1.0 (strong),
///    one contains the other → 0.6 (partial), otherwise gap.
/// 2. Title, location and work mode compare against preferences; an empty
///    preference scores neutral.
/// 3. score = weighted sum × 100. Ties keep the input order (newest first).
pub struct KeywordJobMatcher;

#[async_trait]
impl JobMatcher for KeywordJobMatcher {
    async fn rank(
        &self,
        profile: &MatchProfile,
        jobs: Vec<JobListingRow>,
        limit: usize,
    ) -> Result<Vec<JobMatch>, AppError> {
        let mut matches: Vec<JobMatch> = jobs
            .into_iter()
            .map(|job| score_job(profile, job))
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(limit);
        Ok(matches)
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

pub fn classify_skill(candidate_skills: &[String], job_skill: &str) -> SkillFit {
    let wanted = job_skill.trim().to_lowercase();
    if candidate_skills.iter().any(|s| *s == wanted) {
        SkillFit::Strong
    } else if candidate_skills
        .iter()
        .any(|s| !s.is_empty() && (s.contains(&wanted) || wanted.contains(s.as_str())))
    {
        SkillFit::Partial
    } else {
        SkillFit::Gap
    }
}

fn title_score(desired_titles: &[String], job_title: &str) -> f64 {
    if desired_titles.is_empty() {
        return NEUTRAL;
    }
    let title = job_title.to_lowercase();
    if desired_titles.iter().any(|t| title.contains(t.as_str())) {
        return 1.0;
    }
    let words: Vec<&str> = title.split_whitespace().filter(|w| w.len() > 2).collect();
    let overlaps = desired_titles
        .iter()
        .any(|t| t.split_whitespace().any(|w| words.contains(&w)));
    if overlaps {
        NEUTRAL
    } else {
        0.0
    }
}

fn location_score(desired_locations: &[String], job: &JobListingRow) -> f64 {
    if job.job.work_mode == "remote" {
        return 1.0;
    }
    if desired_locations.is_empty() {
        return NEUTRAL;
    }
    match job.job.location.as_deref().map(str::to_lowercase) {
        Some(location) if desired_locations.iter().any(|l| location.contains(l.as_str())) => 1.0,
        _ => 0.0,
    }
}

fn work_mode_score(work_modes: &[String], job_mode: &str) -> f64 {
    if work_modes.is_empty() {
        NEUTRAL
    } else if work_modes.iter().any(|m| m == job_mode) {
        1.0
    } else {
        0.0
    }
}

pub fn score_job(profile: &MatchProfile, job: JobListingRow) -> JobMatch {
    let mut strong_matches = Vec::new();
    let mut partial_matches = Vec::new();
    let mut gaps = Vec::new();
    let mut strength_sum = 0.0;

    for skill in &job.job.skills {
        match classify_skill(&profile.skills, skill) {
            SkillFit::Strong => {
                strength_sum += 1.0;
                strong_matches.push(skill.clone());
            }
            SkillFit::Partial => {
                strength_sum += 0.6;
                partial_matches.push(skill.clone());
            }
            SkillFit::Gap => gaps.push(skill.clone()),
        }
    }
    let skill_score = if job.job.skills.is_empty() {
        NEUTRAL
    } else {
        strength_sum / job.job.skills.len() as f64
    };

    let total = SKILL_WEIGHT * skill_score
        + TITLE_WEIGHT * title_score(&profile.desired_titles, &job.job.title)
        + LOCATION_WEIGHT * location_score(&profile.desired_locations, &job)
        + WORK_MODE_WEIGHT * work_mode_score(&profile.work_modes, &job.job.work_mode);

    JobMatch {
        score: (total * 100.0).round().clamp(0.0, 100.0) as u32,
        job,
        strong_matches,
        partial_matches,
        gaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobPostingRow;
    use chrono::Utc;
    use uuid::Uuid;

    fn job(title: &str, skills: &[&str], work_mode: &str, location: Option<&str>) -> JobListingRow {
        let now = Utc::now();
        JobListingRow {
            job: JobPostingRow {
                id: Uuid::new_v4(),
                organization_id: Uuid::new_v4(),
                posted_by: Uuid::new_v4(),
                title: title.to_string(),
                description: String::new(),
                requirements: vec![],
                skills: skills.iter().map(|s| s.to_string()).collect(),
                location: location.map(String::from),
                job_type: "full_time".to_string(),
                work_mode: work_mode.to_string(),
                experience_level: "mid".to_string(),
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
        }
    }

    fn profile() -> MatchProfile {
        MatchProfile {
            skills: vec!["rust".to_string(), "postgresql".to_string()],
            desired_titles: vec!["backend engineer".to_string()],
            desired_locations: vec!["tunis".to_string()],
            work_modes: vec!["hybrid".to_string()],
        }
    }

    #[test]
    fn test_classify_skill() {
        let skills = profile().skills;
        assert_eq!(classify_skill(&skills, "Rust"), SkillFit::Strong);
        assert_eq!(classify_skill(&skills, "SQL"), SkillFit::Partial);
        assert_eq!(classify_skill(&skills, "Kubernetes"), SkillFit::Gap);
    }

    #[test]
    fn test_perfect_match_scores_100() {
        let m = score_job(
            &profile(),
            job("Senior Backend Engineer", &["Rust", "PostgreSQL"], "hybrid", Some("Tunis, TN")),
        );
        assert_eq!(m.score, 100);
        assert_eq!(m.strong_matches, vec!["Rust", "PostgreSQL"]);
        assert!(m.gaps.is_empty());
    }

    #[test]
    fn test_mismatch_scores_low_and_lists_gaps() {
        let m = score_job(
            &profile(),
            job("Designer", &["Figma", "Sketch"], "onsite", Some("Paris")),
        );
        assert_eq!(m.score, 0);
        assert_eq!(m.gaps, vec!["Figma", "Sketch"]);
    }

    #[test]
    fn test_empty_preferences_are_neutral() {
        let m = score_job(&MatchProfile::default(), job("Anything", &[], "onsite", None));
        assert_eq!(m.score, 50);
    }

    #[test]
    fn test_remote_jobs_satisfy_location() {
        let m = score_job(&profile(), job("Backend Engineer", &["Rust"], "remote", None));
        // skills 1.0, title 1.0, location 1.0, work mode 0.0
        assert_eq!(m.score, 85);
    }

    #[tokio::test]
    async fn test_rank_orders_and_truncates() {
        let jobs = vec![
            job("Designer", &["Figma"], "onsite", None),
            job("Backend Engineer", &["Rust"], "hybrid", Some("Tunis")),
            job("Data Engineer", &["Python"], "hybrid", Some("Tunis")),
        ];
        let ranked = KeywordJobMatcher.rank(&profile(), jobs, 2).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].job.job.title, "Backend Engineer");
        assert!(ranked[0].score >= ranked[1].score);
        assert_eq!(KeywordJobMatcher.backend(), "keyword");
    }
}
