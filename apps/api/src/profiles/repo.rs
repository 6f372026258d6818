//! SQL for profiles and their sections.
//!
//! Writers are generic over `PgExecutor` so the onboarding transaction and
//! the single-section handlers share the same statements.

use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::models::profile::{
    CertificationRow, EducationRow, ExperienceRow, JobPreferencesRow, LanguageRow, ProfileRow,
    ProjectRow, SkillRow,
};
use crate::profiles::inputs::{
    CertificationInput, EducationInput, ExperienceInput, LanguageInput, PreferencesInput,
    ProfileInput, ProjectInput, SkillInput,
};

/// A profile with every section, as shown on the profile page.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileBundle {
    pub profile: ProfileRow,
    pub experiences: Vec<ExperienceRow>,
    pub education: Vec<EducationRow>,
    pub skills: Vec<SkillRow>,
    pub projects: Vec<ProjectRow>,
    pub certifications: Vec<CertificationRow>,
    pub languages: Vec<LanguageRow>,
    pub preferences: Option<JobPreferencesRow>,
}

/// Tables whose rows belong to one profile via `profile_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTable {
    Experiences,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
}

impl SectionTable {
    pub fn table(&self) -> &'static str {
        match self {
            SectionTable::Experiences => "experiences",
            SectionTable::Education => "education",
            SectionTable::Skills => "skills",
            SectionTable::Projects => "projects",
            SectionTable::Certifications => "certifications",
            SectionTable::Languages => "languages",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SectionTable::Experiences => "Experience",
            SectionTable::Education => "Education entry",
            SectionTable::Skills => "Skill",
            SectionTable::Projects => "Project",
            SectionTable::Certifications => "Certification",
            SectionTable::Languages => "Language",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Profile row
// ────────────────────────────────────────────────────────────────────────────

/// Creates the caller's profile row on first use. No-op when it exists.
pub async fn ensure_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    user: &AuthUser,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, role)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(user.role.as_str())
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
        .bind(profile_id)
        .fetch_optional(executor)
        .await
}

/// Inserts or overwrites the caller's basic fields. Repeating the call with
/// the same input leaves the row unchanged apart from `updated_at`.
pub async fn upsert_profile<'e, E: PgExecutor<'e>>(
    executor: E,
    user: &AuthUser,
    input: &ProfileInput,
) -> Result<ProfileRow, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>(
        r#"
        INSERT INTO profiles (id, email, role, full_name, headline, bio, location, phone, avatar_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            headline = EXCLUDED.headline,
            bio = EXCLUDED.bio,
            location = EXCLUDED.location,
            phone = EXCLUDED.phone,
            avatar_url = EXCLUDED.avatar_url,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(&input.full_name)
    .bind(&input.headline)
    .bind(&input.bio)
    .bind(&input.location)
    .bind(&input.phone)
    .bind(&input.avatar_url)
    .fetch_one(executor)
    .await
}

/// Loads the profile and all sections with concurrent reads.
pub async fn load_bundle(pool: &PgPool, profile_id: Uuid) -> Result<Option<ProfileBundle>, sqlx::Error> {
    let (profile, experiences, education, skills, projects, certifications, languages, preferences) = tokio::try_join!(
        fetch_profile(pool, profile_id),
        list_experiences(pool, profile_id),
        list_education(pool, profile_id),
        list_skills(pool, profile_id),
        list_projects(pool, profile_id),
        list_certifications(pool, profile_id),
        list_languages(pool, profile_id),
        fetch_preferences(pool, profile_id),
    )?;

    Ok(profile.map(|profile| ProfileBundle {
        profile,
        experiences,
        education,
        skills,
        projects,
        certifications,
        languages,
        preferences,
    }))
}

/// Deletes a section row only if it belongs to `profile_id`. Returns whether a row was removed.
pub async fn delete_section_row<'e, E: PgExecutor<'e>>(
    executor: E,
    section: SectionTable,
    id: Uuid,
    profile_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE id = $1 AND profile_id = $2",
        section.table()
    );
    let result = sqlx::query(&sql)
        .bind(id)
        .bind(profile_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes every row of `section` for the profile (onboarding replace semantics).
pub async fn clear_section<'e, E: PgExecutor<'e>>(
    executor: E,
    section: SectionTable,
    profile_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE profile_id = $1", section.table());
    Ok(sqlx::query(&sql)
        .bind(profile_id)
        .execute(executor)
        .await?
        .rows_affected())
}

// ────────────────────────────────────────────────────────────────────────────
// Experiences
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_experiences<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<ExperienceRow>, sqlx::Error> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        SELECT * FROM experiences
        WHERE profile_id = $1
        ORDER BY is_current DESC, start_date DESC
        "#,
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_experience<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &ExperienceInput,
) -> Result<ExperienceRow, sqlx::Error> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        INSERT INTO experiences
            (id, profile_id, company, title, location, start_date, end_date, is_current, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.company)
    .bind(&input.title)
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_current)
    .bind(&input.description)
    .fetch_one(executor)
    .await
}

pub async fn update_experience<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    profile_id: Uuid,
    input: &ExperienceInput,
) -> Result<Option<ExperienceRow>, sqlx::Error> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        UPDATE experiences SET
            company = $3, title = $4, location = $5, start_date = $6,
            end_date = $7, is_current = $8, description = $9
        WHERE id = $1 AND profile_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(&input.company)
    .bind(&input.title)
    .bind(&input.location)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.is_current)
    .bind(&input.description)
    .fetch_optional(executor)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_education<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<EducationRow>, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM education WHERE profile_id = $1 ORDER BY end_date DESC NULLS FIRST, start_date DESC",
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_education<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &EducationInput,
) -> Result<EducationRow, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO education
            (id, profile_id, institution, degree, field_of_study, start_date, end_date, grade, description)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.institution)
    .bind(&input.degree)
    .bind(&input.field_of_study)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.grade)
    .bind(&input.description)
    .fetch_one(executor)
    .await
}

pub async fn update_education<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    profile_id: Uuid,
    input: &EducationInput,
) -> Result<Option<EducationRow>, sqlx::Error> {
    sqlx::query_as::<_, EducationRow>(
        r#"
        UPDATE education SET
            institution = $3, degree = $4, field_of_study = $5, start_date = $6,
            end_date = $7, grade = $8, description = $9
        WHERE id = $1 AND profile_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(&input.institution)
    .bind(&input.degree)
    .bind(&input.field_of_study)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(&input.grade)
    .bind(&input.description)
    .fetch_optional(executor)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Skills and languages (upsert by case-insensitive name)
// ────────────────────────────────────────────────────────────────────────────

/// Conflicts on the `(profile_id, lower(name))` unique index, so "rust" updates
/// an existing "Rust" and the latest spelling wins.
const UPSERT_SKILL: &str = r#"
    INSERT INTO skills (id, profile_id, name, level, years_experience)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (profile_id, lower(name)) DO UPDATE SET
        name = EXCLUDED.name,
        level = EXCLUDED.level,
        years_experience = EXCLUDED.years_experience
    RETURNING *
"#;

const UPSERT_LANGUAGE: &str = r#"
    INSERT INTO languages (id, profile_id, name, proficiency)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (profile_id, lower(name)) DO UPDATE SET
        name = EXCLUDED.name,
        proficiency = EXCLUDED.proficiency
    RETURNING *
"#;

pub async fn list_skills<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<SkillRow>, sqlx::Error> {
    sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE profile_id = $1 ORDER BY lower(name)")
        .bind(profile_id)
        .fetch_all(executor)
        .await
}

pub async fn upsert_skill<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &SkillInput,
) -> Result<SkillRow, sqlx::Error> {
    sqlx::query_as::<_, SkillRow>(UPSERT_SKILL)
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.name)
    .bind(input.level.as_str())
    .bind(input.years_experience)
    .fetch_one(executor)
    .await
}

pub async fn list_languages<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<LanguageRow>, sqlx::Error> {
    sqlx::query_as::<_, LanguageRow>("SELECT * FROM languages WHERE profile_id = $1 ORDER BY lower(name)")
        .bind(profile_id)
        .fetch_all(executor)
        .await
}

pub async fn upsert_language<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &LanguageInput,
) -> Result<LanguageRow, sqlx::Error> {
    sqlx::query_as::<_, LanguageRow>(UPSERT_LANGUAGE)
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.name)
    .bind(input.proficiency.as_str())
    .fetch_one(executor)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Projects
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_projects<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        "SELECT * FROM projects WHERE profile_id = $1 ORDER BY start_date DESC NULLS LAST, created_at DESC",
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_project<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &ProjectInput,
) -> Result<ProjectRow, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r#"
        INSERT INTO projects
            (id, profile_id, name, description, url, technologies, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.url)
    .bind(&input.technologies)
    .bind(input.start_date)
    .bind(input.end_date)
    .fetch_one(executor)
    .await
}

pub async fn update_project<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    profile_id: Uuid,
    input: &ProjectInput,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r#"
        UPDATE projects SET
            name = $3, description = $4, url = $5, technologies = $6,
            start_date = $7, end_date = $8
        WHERE id = $1 AND profile_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.url)
    .bind(&input.technologies)
    .bind(input.start_date)
    .bind(input.end_date)
    .fetch_optional(executor)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Certifications
// ────────────────────────────────────────────────────────────────────────────

pub async fn list_certifications<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Vec<CertificationRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        "SELECT * FROM certifications WHERE profile_id = $1 ORDER BY issue_date DESC NULLS LAST",
    )
    .bind(profile_id)
    .fetch_all(executor)
    .await
}

pub async fn insert_certification<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &CertificationInput,
) -> Result<CertificationRow, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        INSERT INTO certifications
            (id, profile_id, name, issuer, issue_date, expiry_date, credential_id, credential_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(profile_id)
    .bind(&input.name)
    .bind(&input.issuer)
    .bind(input.issue_date)
    .bind(input.expiry_date)
    .bind(&input.credential_id)
    .bind(&input.credential_url)
    .fetch_one(executor)
    .await
}

pub async fn update_certification<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    profile_id: Uuid,
    input: &CertificationInput,
) -> Result<Option<CertificationRow>, sqlx::Error> {
    sqlx::query_as::<_, CertificationRow>(
        r#"
        UPDATE certifications SET
            name = $3, issuer = $4, issue_date = $5, expiry_date = $6,
            credential_id = $7, credential_url = $8
        WHERE id = $1 AND profile_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(profile_id)
    .bind(&input.name)
    .bind(&input.issuer)
    .bind(input.issue_date)
    .bind(input.expiry_date)
    .bind(&input.credential_id)
    .bind(&input.credential_url)
    .fetch_optional(executor)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Preferences
// ────────────────────────────────────────────────────────────────────────────

pub async fn fetch_preferences<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
) -> Result<Option<JobPreferencesRow>, sqlx::Error> {
    sqlx::query_as::<_, JobPreferencesRow>("SELECT * FROM job_preferences WHERE profile_id = $1")
        .bind(profile_id)
        .fetch_optional(executor)
        .await
}

pub async fn upsert_preferences<'e, E: PgExecutor<'e>>(
    executor: E,
    profile_id: Uuid,
    input: &PreferencesInput,
) -> Result<JobPreferencesRow, sqlx::Error> {
    sqlx::query_as::<_, JobPreferencesRow>(
        r#"
        INSERT INTO job_preferences
            (profile_id, desired_titles, desired_locations, job_types, work_modes,
             salary_expectation, willing_to_relocate)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (profile_id) DO UPDATE SET
            desired_titles = EXCLUDED.desired_titles,
            desired_locations = EXCLUDED.desired_locations,
            job_types = EXCLUDED.job_types,
            work_modes = EXCLUDED.work_modes,
            salary_expectation = EXCLUDED.salary_expectation,
            willing_to_relocate = EXCLUDED.willing_to_relocate,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(profile_id)
    .bind(&input.desired_titles)
    .bind(&input.desired_locations)
    .bind(input.job_type_strings())
    .bind(input.work_mode_strings())
    .bind(input.salary_expectation)
    .bind(input.willing_to_relocate)
    .fetch_one(executor)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_tables_are_fixed_identifiers() {
        let all = [
            SectionTable::Experiences,
            SectionTable::Education,
            SectionTable::Skills,
            SectionTable::Projects,
            SectionTable::Certifications,
            SectionTable::Languages,
        ];
        for section in all {
            assert!(section
                .table()
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_name_upserts_match_case_insensitive_indexes() {
        let migration = include_str!("../../migrations/20250301000000_case_insensitive_names.sql");
        assert!(migration.contains("ON skills (profile_id, lower(name))"));
        assert!(migration.contains("ON languages (profile_id, lower(name))"));
        for sql in [UPSERT_SKILL, UPSERT_LANGUAGE] {
            assert!(sql.contains("ON CONFLICT (profile_id, lower(name))"));
            assert!(sql.contains("name = EXCLUDED.name"));
        }
    }
}
