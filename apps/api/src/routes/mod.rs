pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::analysis::{candidates, feedback};
use crate::applications;
use crate::dashboard;
use crate::interviews::handlers as interviews;
use crate::jobs::{handlers as jobs, saved};
use crate::matching::handlers as matching;
use crate::onboarding;
use crate::organizations;
use crate::profiles::{handlers as profiles, sections};
use crate::resumes::{generated, upload};
use crate::state::AppState;

/// Multipart framing on top of the largest accepted resume.
const UPLOAD_BODY_LIMIT: usize = upload::MAX_RESUME_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile
        .route(
            "/api/profile",
            get(profiles::handle_get_profile).put(profiles::handle_update_profile),
        )
        .route(
            "/api/profile/completeness",
            get(profiles::handle_get_completeness),
        )
        .route("/api/profiles/:id", get(profiles::handle_view_profile))
        .route(
            "/api/profile/experiences",
            get(sections::handle_list_experiences).post(sections::handle_create_experience),
        )
        .route(
            "/api/profile/experiences/:id",
            put(sections::handle_update_experience).delete(sections::handle_delete_experience),
        )
        .route(
            "/api/profile/education",
            get(sections::handle_list_education).post(sections::handle_create_education),
        )
        .route(
            "/api/profile/education/:id",
            put(sections::handle_update_education).delete(sections::handle_delete_education),
        )
        .route(
            "/api/profile/projects",
            get(sections::handle_list_projects).post(sections::handle_create_project),
        )
        .route(
            "/api/profile/projects/:id",
            put(sections::handle_update_project).delete(sections::handle_delete_project),
        )
        .route(
            "/api/profile/certifications",
            get(sections::handle_list_certifications).post(sections::handle_create_certification),
        )
        .route(
            "/api/profile/certifications/:id",
            put(sections::handle_update_certification)
                .delete(sections::handle_delete_certification),
        )
        .route(
            "/api/profile/skills",
            get(sections::handle_list_skills).post(sections::handle_upsert_skill),
        )
        .route(
            "/api/profile/skills/:id",
            delete(sections::handle_delete_skill),
        )
        .route(
            "/api/profile/languages",
            get(sections::handle_list_languages).post(sections::handle_upsert_language),
        )
        .route(
            "/api/profile/languages/:id",
            delete(sections::handle_delete_language),
        )
        .route(
            "/api/profile/preferences",
            get(sections::handle_get_preferences).put(sections::handle_put_preferences),
        )
        // Onboarding
        .route("/api/onboarding", post(onboarding::handle_submit_onboarding))
        .route(
            "/api/onboarding/status",
            get(onboarding::handle_onboarding_status),
        )
        // Organizations
        .route(
            "/api/organizations",
            get(organizations::handle_list_my_organizations)
                .post(organizations::handle_create_organization),
        )
        .route(
            "/api/organizations/:id",
            get(organizations::handle_get_organization)
                .put(organizations::handle_update_organization)
                .delete(organizations::handle_delete_organization),
        )
        .route(
            "/api/organizations/:id/jobs",
            get(organizations::handle_list_organization_jobs),
        )
        // Jobs
        .route(
            "/api/jobs",
            get(jobs::handle_search_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/jobs/recommended",
            get(matching::handle_recommended_jobs),
        )
        .route(
            "/api/jobs/advanced-match",
            post(matching::handle_advanced_match),
        )
        .route(
            "/api/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        .route("/api/jobs/:id/status", patch(jobs::handle_update_job_status))
        .route(
            "/api/jobs/:id/applications",
            get(applications::handle_list_job_applications).post(applications::handle_apply),
        )
        .route(
            "/api/jobs/:id/candidate-analysis",
            post(candidates::handle_candidate_analysis),
        )
        .route("/api/employer/jobs", get(jobs::handle_list_employer_jobs))
        .route("/api/saved-jobs", get(saved::handle_list_saved_jobs))
        .route(
            "/api/saved-jobs/:job_id",
            put(saved::handle_save_job).delete(saved::handle_unsave_job),
        )
        // Applications
        .route(
            "/api/applications",
            get(applications::handle_list_my_applications),
        )
        .route(
            "/api/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::handle_update_application_status),
        )
        .route(
            "/api/applications/:id/withdraw",
            post(applications::handle_withdraw_application),
        )
        // Interviews
        .route(
            "/api/interviews",
            get(interviews::handle_list_interviews).post(interviews::handle_create_interview),
        )
        .route("/api/interviews/:id", get(interviews::handle_get_interview))
        .route(
            "/api/interviews/:id/submit",
            post(interviews::handle_submit_interview),
        )
        // AI
        .route(
            "/api/ai/profile-feedback",
            post(feedback::handle_profile_feedback),
        )
        // Resumes
        .route("/api/resumes", get(generated::handle_list_resumes))
        .route(
            "/api/resumes/upload",
            post(upload::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/resumes/current", get(upload::handle_current_resume))
        .route(
            "/api/resumes/summarize",
            post(upload::handle_summarize_resume),
        )
        .route(
            "/api/resumes/generate",
            post(generated::handle_generate_resume),
        )
        .route(
            "/api/resumes/:id/compile",
            post(generated::handle_compile_resume),
        )
        // Dashboards
        .route(
            "/api/dashboard/candidate",
            get(dashboard::handle_candidate_dashboard),
        )
        .route(
            "/api/dashboard/employer",
            get(dashboard::handle_employer_dashboard),
        )
        .with_state(state)
}
