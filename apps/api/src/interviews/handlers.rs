use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::{not_found, AppError};
use crate::extract::ApiJson;
use crate::interviews::evaluation::{
    evaluation_from_reply, parse_questions, validate_answers, AnswerInput, InterviewQuestion,
    DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT,
};
use crate::interviews::prompts::{
    EVALUATION_PROMPT_TEMPLATE, EVALUATION_ROLE, QUESTION_PROMPT_TEMPLATE, QUESTION_ROLE,
};
use crate::jobs::repo::fetch_job;
use crate::llm_client::prompts::{json_system, FAIRNESS_INSTRUCTION};
use crate::models::interview::InterviewRow;
use crate::models::job::JobStatus;
use crate::profiles::repo::ensure_profile;
use crate::state::AppState;
use crate::validation::{optional, MAX_SHORT_TEXT_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateInterviewRequest {
    pub job_id: Option<Uuid>,
    pub role_title: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub question_count: Option<u8>,
}

impl CreateInterviewRequest {
    /// Returns the trimmed role title (if any) and the question count.
    pub fn validate(&self) -> Result<(Option<String>, u8), AppError> {
        let role_title = optional("role_title", self.role_title.as_deref(), MAX_SHORT_TEXT_LEN)?;
        if self.job_id.is_none() && role_title.is_none() {
            return Err(AppError::Validation(
                "Either job_id or role_title is required".to_string(),
            ));
        }
        let count = self.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
        if !(1..=MAX_QUESTION_COUNT).contains(&count) {
            return Err(AppError::Validation(format!(
                "question_count must be between 1 and {MAX_QUESTION_COUNT}"
            )));
        }
        Ok((role_title, count))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitAnswersRequest {
    pub answers: Vec<AnswerInput>,
}

async fn fetch_own_interview(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> Result<InterviewRow, AppError> {
    let interview = sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| not_found("Interview", id))?;
    user.require_owner(interview.candidate_id, "interview")?;
    Ok(interview)
}

/// POST /api/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewRow>), AppError> {
    user.require_candidate()?;
    let (role_title, count) = req.validate()?;

    let (role_title, job_context) = match req.job_id {
        Some(job_id) => {
            let job = fetch_job(&state.db, job_id)
                .await?
                .ok_or_else(|| not_found("Job", job_id))?;
            if job.status != JobStatus::Open.as_str() {
                return Err(AppError::Validation(
                    "Mock interviews can only target open jobs".to_string(),
                ));
            }
            let context = format!(
                "JOB DESCRIPTION:\n{}\n\nREQUIRED SKILLS: {}",
                job.description,
                job.skills.join(", ")
            );
            (role_title.unwrap_or(job.title), context)
        }
        None => (
            role_title.unwrap_or_default(),
            "No job description is available; base the questions on the role title.".to_string(),
        ),
    };

    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{difficulty}", req.difficulty.as_str())
        .replace("{role_title}", &role_title)
        .replace("{job_context}", &job_context);
    let text = state
        .llm
        .call_text(&prompt, &json_system(QUESTION_ROLE))
        .await?;
    let questions = parse_questions(&text, count)?;

    ensure_profile(&state.db, &user).await?;
    let interview = sqlx::query_as::<_, InterviewRow>(
        r#"
        INSERT INTO interviews (id, candidate_id, job_id, role_title, difficulty, questions, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'in_progress')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(req.job_id)
    .bind(&role_title)
    .bind(req.difficulty.as_str())
    .bind(serde_json::to_value(&questions).map_err(anyhow::Error::from)?)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Interview {} created for {} with {} questions",
        interview.id,
        user.id,
        questions.len()
    );
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/interviews
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    let rows = sqlx::query_as::<_, InterviewRow>(
        "SELECT * FROM interviews WHERE candidate_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(rows))
}

/// GET /api/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    Ok(Json(fetch_own_interview(&state, &user, id).await?))
}

/// POST /api/interviews/:id/submit
pub async fn handle_submit_interview(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<SubmitAnswersRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    let interview = fetch_own_interview(&state, &user, id).await?;
    if interview.status == "completed" {
        return Err(AppError::Validation(
            "This interview has already been submitted".to_string(),
        ));
    }

    let questions: Vec<InterviewQuestion> = serde_json::from_value(interview.questions.clone())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("interview {id} has bad questions: {e}")))?;
    let answers = validate_answers(&questions, req.answers)?;

    let qa: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            let answer = answers
                .iter()
                .find(|a| a.question_id == q.id)
                .map(|a| a.answer.as_str());
            json!({
                "question_id": q.id,
                "question": q.question,
                "expected_points": q.expected_points,
                "answer": answer,
            })
        })
        .collect();
    let prompt = EVALUATION_PROMPT_TEMPLATE
        .replace("{role_title}", &interview.role_title)
        .replace("{difficulty}", &interview.difficulty)
        .replace("{fairness}", FAIRNESS_INSTRUCTION)
        .replace(
            "{qa_json}",
            &serde_json::to_string_pretty(&qa).map_err(anyhow::Error::from)?,
        );

    let evaluation = evaluation_from_reply(
        state
            .llm
            .call_text(&prompt, &json_system(EVALUATION_ROLE))
            .await,
    )?;

    let updated = sqlx::query_as::<_, InterviewRow>(
        r#"
        UPDATE interviews SET
            answers = $2, evaluation = $3, overall_score = $4,
            status = 'completed', completed_at = NOW()
        WHERE id = $1 AND status = 'in_progress'
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(serde_json::to_value(&answers).map_err(anyhow::Error::from)?)
    .bind(serde_json::to_value(&evaluation).map_err(anyhow::Error::from)?)
    .bind(evaluation.score())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        AppError::Validation("This interview has already been submitted".to_string())
    })?;

    info!(
        "Interview {} completed with score {}{}",
        id,
        evaluation.score(),
        if evaluation.placeholder { " (placeholder)" } else { "" }
    );
    Ok(Json(updated))
}
