use serde::{Deserialize, Serialize};

use crate::profiles::repo::ProfileBundle;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Strong,
    Moderate,
    Weak,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: String,
    pub score: f64,
    pub entry_count: usize,
    pub status: SectionStatus,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub overall_score: f64,
    pub sections: Vec<SectionHealth>,
    pub missing_sections: Vec<String>,
}

const SECTION_WEIGHTS: &[(&str, f64)] = &[
    ("basics", 0.20),
    ("experience", 0.25),
    ("education", 0.15),
    ("skills", 0.15),
    ("projects", 0.10),
    ("certifications", 0.05),
    ("languages", 0.05),
    ("preferences", 0.05),
];

/// Entries needed for a list section to score fully on count.
fn target_count(section: &str) -> usize {
    match section {
        "experience" => 2,
        "skills" => 5,
        "projects" => 2,
        _ => 1,
    }
}

pub fn compute_completeness_report(bundle: &ProfileBundle) -> CompletenessReport {
    let mut sections = Vec::new();
    let mut weighted_score_sum = 0.0;
    let mut missing_sections = Vec::new();

    for (section_key, weight) in SECTION_WEIGHTS {
        let (entry_count, score, mut recommendations) = score_section(section_key, bundle);

        let status = if entry_count == 0 {
            missing_sections.push(section_key.to_string());
            SectionStatus::Missing
        } else {
            match score {
                s if s >= 0.8 => SectionStatus::Strong,
                s if s >= 0.5 => SectionStatus::Moderate,
                s if s >= 0.2 => SectionStatus::Weak,
                _ => SectionStatus::Missing,
            }
        };

        if entry_count == 0 && recommendations.is_empty() {
            recommendations.push(format!("Add your {} to strengthen your profile", section_key));
        }

        weighted_score_sum += score * weight;
        sections.push(SectionHealth {
            section: section_key.to_string(),
            score,
            entry_count,
            status,
            recommendations,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let overall_score = if total_weight > 0.0 {
        (weighted_score_sum / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };

    CompletenessReport {
        overall_score,
        sections,
        missing_sections,
    }
}

/// Returns `(entry_count, score, recommendations)` for one section.
fn score_section(section: &str, bundle: &ProfileBundle) -> (usize, f64, Vec<String>) {
    let mut recommendations = Vec::new();
    match section {
        "basics" => {
            let p = &bundle.profile;
            let fields = [
                p.full_name.is_some(),
                p.headline.is_some(),
                p.bio.is_some(),
                p.location.is_some(),
                p.phone.is_some(),
                p.resume_key.is_some(),
            ];
            let filled = fields.iter().filter(|f| **f).count();
            if p.headline.is_none() {
                recommendations.push("Add a headline that summarizes your role".to_string());
            }
            if p.resume_key.is_none() {
                recommendations.push("Upload a resume so employers can review it".to_string());
            }
            (filled, filled as f64 / fields.len() as f64, recommendations)
        }
        "experience" => {
            let count = bundle.experiences.len();
            let described = bundle
                .experiences
                .iter()
                .filter(|e| e.description.as_deref().is_some_and(|d| d.len() >= 50))
                .count();
            if count > 0 && described < count {
                recommendations.push(format!(
                    "{} experience entries lack a detailed description",
                    count - described
                ));
            }
            if count < target_count(section) {
                recommendations
                    .push("Add more experience entries to build a complete picture".to_string());
            }
            (count, list_score(section, count, described), recommendations)
        }
        "projects" => {
            let count = bundle.projects.len();
            let described = bundle
                .projects
                .iter()
                .filter(|p| p.description.is_some() && !p.technologies.is_empty())
                .count();
            if count > 0 && described < count {
                recommendations.push(
                    "Describe each project and list the technologies you used".to_string(),
                );
            }
            (count, list_score(section, count, described), recommendations)
        }
        "education" => {
            let count = bundle.education.len();
            (count, list_score(section, count, count), recommendations)
        }
        "skills" => {
            let count = bundle.skills.len();
            if count > 0 && count < target_count(section) {
                recommendations.push(format!(
                    "List at least {} skills to improve job matching",
                    target_count(section)
                ));
            }
            (count, list_score(section, count, count), recommendations)
        }
        "certifications" => {
            let count = bundle.certifications.len();
            (count, list_score(section, count, count), recommendations)
        }
        "languages" => {
            let count = bundle.languages.len();
            (count, list_score(section, count, count), recommendations)
        }
        "preferences" => match &bundle.preferences {
            Some(prefs) => {
                let fields = [
                    !prefs.desired_titles.is_empty(),
                    !prefs.desired_locations.is_empty(),
                    !prefs.job_types.is_empty(),
                    !prefs.work_modes.is_empty(),
                ];
                let filled = fields.iter().filter(|f| **f).count();
                if filled < fields.len() {
                    recommendations
                        .push("Complete your job preferences for better recommendations".to_string());
                }
                (1, filled as f64 / fields.len() as f64, recommendations)
            }
            None => {
                recommendations.push("Set your job preferences".to_string());
                (0, 0.0, recommendations)
            }
        },
        _ => (0, 0.0, recommendations),
    }
}

/// 70% for reaching the target count, 30% for entries with detail.
fn list_score(section: &str, count: usize, detailed: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let coverage = (count as f64 / target_count(section) as f64).min(1.0);
    let detail = detailed as f64 / count as f64;
    (0.7 * coverage + 0.3 * detail).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{ExperienceRow, ProfileRow, SkillRow};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn empty_bundle() -> ProfileBundle {
        let now = Utc::now();
        ProfileBundle {
            profile: ProfileRow {
                id: Uuid::new_v4(),
                email: None,
                full_name: None,
                role: "candidate".to_string(),
                headline: None,
                bio: None,
                location: None,
                phone: None,
                avatar_url: None,
                resume_key: None,
                resume_text: None,
                onboarding_completed: false,
                created_at: now,
                updated_at: now,
            },
            experiences: vec![],
            education: vec![],
            skills: vec![],
            projects: vec![],
            certifications: vec![],
            languages: vec![],
            preferences: None,
        }
    }

    fn experience(description: Option<&str>) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            company: "Acme".to_string(),
            title: "Engineer".to_string(),
            location: None,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: None,
            is_current: true,
            description: description.map(String::from),
            created_at: Utc::now(),
        }
    }

    fn skill(name: &str) -> SkillRow {
        SkillRow {
            id: Uuid::new_v4(),
            profile_id: Uuid::new_v4(),
            name: name.to_string(),
            level: "advanced".to_string(),
            years_experience: Some(3),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_profile_scores_zero_and_lists_all_sections_missing() {
        let report = compute_completeness_report(&empty_bundle());
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.missing_sections.len(), SECTION_WEIGHTS.len());
        assert!(report
            .sections
            .iter()
            .all(|s| s.status == SectionStatus::Missing));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_undescribed_experience_gets_recommendation() {
        let mut bundle = empty_bundle();
        bundle.experiences = vec![experience(None), experience(Some(&"x".repeat(60)))];
        let report = compute_completeness_report(&bundle);
        let exp = report
            .sections
            .iter()
            .find(|s| s.section == "experience")
            .unwrap();
        // coverage 1.0, detail 0.5 → 0.7 + 0.15
        assert!((exp.score - 0.85).abs() < 1e-9, "score was {}", exp.score);
        assert_eq!(exp.status, SectionStatus::Strong);
        assert!(exp.recommendations[0].contains("1 experience entries"));
    }

    #[test]
    fn test_few_skills_is_partial() {
        let mut bundle = empty_bundle();
        bundle.skills = vec![skill("Rust"), skill("SQL")];
        let report = compute_completeness_report(&bundle);
        let skills = report
            .sections
            .iter()
            .find(|s| s.section == "skills")
            .unwrap();
        // 0.7 * 2/5 + 0.3 = 0.58
        assert!((skills.score - 0.58).abs() < 1e-9);
        assert_eq!(skills.status, SectionStatus::Moderate);
        assert!(!report.missing_sections.contains(&"skills".to_string()));
    }

    #[test]
    fn test_overall_score_increases_with_content() {
        let before = compute_completeness_report(&empty_bundle()).overall_score;
        let mut bundle = empty_bundle();
        bundle.profile.full_name = Some("Ada".to_string());
        bundle.profile.headline = Some("Engineer".to_string());
        bundle.skills = vec![skill("Rust")];
        let after = compute_completeness_report(&bundle).overall_score;
        assert!(after > before);
        assert!(after <= 1.0);
    }
}
