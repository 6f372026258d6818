//! Question and evaluation payloads exchanged with the model, plus the
//! checks applied to candidate answers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::{parse_json_lenient, LlmError};
use crate::validation::{required, MAX_TEXT_LEN};

pub const DEFAULT_QUESTION_COUNT: u8 = 5;
pub const MAX_QUESTION_COUNT: u8 = 10;
pub const PLACEHOLDER_SCORE: i32 = 50;

/// A stored interview question. Ids are assigned by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewQuestion {
    pub id: String,
    pub question: String,
    pub category: String,
    pub expected_points: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    question: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    expected_points: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeneratedQuestions {
    Wrapped { questions: Vec<GeneratedQuestion> },
    Bare(Vec<GeneratedQuestion>),
}

/// Parses model output into at most `count` questions with ids `q1..qN`.
pub fn parse_questions(text: &str, count: u8) -> Result<Vec<InterviewQuestion>, LlmError> {
    let generated = match parse_json_lenient::<GeneratedQuestions>(text)? {
        GeneratedQuestions::Wrapped { questions } | GeneratedQuestions::Bare(questions) => {
            questions
        }
    };

    let questions: Vec<InterviewQuestion> = generated
        .into_iter()
        .filter(|q| !q.question.trim().is_empty())
        .take(count as usize)
        .enumerate()
        .map(|(i, q)| InterviewQuestion {
            id: format!("q{}", i + 1),
            question: q.question.trim().to_string(),
            category: q
                .category
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "general".to_string()),
            expected_points: q.expected_points,
        })
        .collect();

    if questions.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    Ok(questions)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerInput {
    pub question_id: String,
    pub answer: String,
}

/// Rejects unknown question ids, repeated answers and blank answers.
/// Returns the trimmed answers.
pub fn validate_answers(
    questions: &[InterviewQuestion],
    answers: Vec<AnswerInput>,
) -> Result<Vec<AnswerInput>, AppError> {
    if answers.is_empty() {
        return Err(AppError::Validation("answers must not be empty".to_string()));
    }
    let known: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    let mut seen = HashSet::new();
    answers
        .into_iter()
        .map(|a| {
            if !known.contains(a.question_id.as_str()) {
                return Err(AppError::Validation(format!(
                    "unknown question_id '{}'",
                    a.question_id
                )));
            }
            if !seen.insert(a.question_id.clone()) {
                return Err(AppError::Validation(format!(
                    "question '{}' was answered more than once",
                    a.question_id
                )));
            }
            Ok(AnswerInput {
                answer: required("answer", &a.answer, MAX_TEXT_LEN)?,
                question_id: a.question_id,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionFeedback {
    pub question_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewEvaluation {
    pub overall_score: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub question_feedback: Vec<QuestionFeedback>,
    /// Set when the model output could not be used.
    #[serde(default)]
    pub placeholder: bool,
}

impl InterviewEvaluation {
    pub fn placeholder() -> Self {
        Self {
            overall_score: PLACEHOLDER_SCORE as f64,
            summary: "We could not produce a detailed evaluation for this interview. \
                Your answers were saved."
                .to_string(),
            strengths: vec!["You completed the mock interview".to_string()],
            improvements: vec![
                "Structure answers with situation, task, action and result".to_string(),
                "Support claims with concrete examples and measurable outcomes".to_string(),
            ],
            question_feedback: vec![],
            placeholder: true,
        }
    }

    /// Overall score as stored in `interviews.overall_score`.
    pub fn score(&self) -> i32 {
        self.overall_score.round().clamp(0.0, 100.0) as i32
    }
}

/// Parses the model's evaluation; unusable output yields the placeholder.
pub fn parse_evaluation(text: &str) -> InterviewEvaluation {
    match parse_json_lenient::<InterviewEvaluation>(text) {
        Ok(mut evaluation) if evaluation.overall_score.is_finite() => {
            evaluation.overall_score = evaluation.overall_score.clamp(0.0, 100.0);
            for feedback in &mut evaluation.question_feedback {
                feedback.score = feedback.score.clamp(0.0, 100.0);
            }
            evaluation.placeholder = false;
            evaluation
        }
        Ok(_) => {
            warn!("Interview evaluation had a non-finite score, using placeholder");
            InterviewEvaluation::placeholder()
        }
        Err(e) => {
            warn!("Interview evaluation could not be parsed ({e}), using placeholder");
            InterviewEvaluation::placeholder()
        }
    }
}

/// Folds the model call into an evaluation. A reply with no text is scored
/// with the placeholder; transport and API failures still propagate.
pub fn evaluation_from_reply(
    reply: Result<String, LlmError>,
) -> Result<InterviewEvaluation, LlmError> {
    match reply {
        Ok(text) => Ok(parse_evaluation(&text)),
        Err(LlmError::EmptyContent) => {
            warn!("Interview evaluation came back empty, using placeholder");
            Ok(InterviewEvaluation::placeholder())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions() -> Vec<InterviewQuestion> {
        parse_questions(
            r#"{"questions":[
                {"question":"Tell me about yourself","category":"Behavioral"},
                {"question":"Explain ownership in Rust","expected_points":["moves","borrows"]}
            ]}"#,
            5,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_questions_assigns_ids_and_defaults() {
        let qs = questions();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].id, "q1");
        assert_eq!(qs[0].category, "behavioral");
        assert_eq!(qs[1].id, "q2");
        assert_eq!(qs[1].category, "general");
        assert_eq!(qs[1].expected_points, vec!["moves", "borrows"]);
    }

    #[test]
    fn test_parse_questions_accepts_fenced_bare_array_and_truncates() {
        let text = "Here you go:\n```json\n[{\"question\":\"A\"},{\"question\":\"B\"},{\"question\":\"C\"}]\n```";
        let qs = parse_questions(text, 2).unwrap();
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[1].question, "B");
    }

    #[test]
    fn test_parse_questions_rejects_empty() {
        assert!(parse_questions(r#"{"questions":[]}"#, 5).is_err());
        assert!(parse_questions("no json here", 5).is_err());
    }

    #[test]
    fn test_validate_answers() {
        let qs = questions();
        let ok = validate_answers(
            &qs,
            vec![AnswerInput {
                question_id: "q2".to_string(),
                answer: "  Values have one owner ".to_string(),
            }],
        )
        .unwrap();
        assert_eq!(ok[0].answer, "Values have one owner");

        let unknown = validate_answers(
            &qs,
            vec![AnswerInput {
                question_id: "q9".to_string(),
                answer: "x".to_string(),
            }],
        );
        assert!(matches!(unknown, Err(AppError::Validation(m)) if m.contains("q9")));

        let twice = validate_answers(
            &qs,
            vec![
                AnswerInput {
                    question_id: "q1".to_string(),
                    answer: "a".to_string(),
                },
                AnswerInput {
                    question_id: "q1".to_string(),
                    answer: "b".to_string(),
                },
            ],
        );
        assert!(matches!(twice, Err(AppError::Validation(m)) if m.contains("more than once")));

        assert!(validate_answers(&qs, vec![]).is_err());
    }

    #[test]
    fn test_parse_evaluation_clamps_scores() {
        let eval = parse_evaluation(
            r#"{"overall_score": 130, "summary": "Great", "strengths": ["clear"],
                "question_feedback": [{"question_id": "q1", "score": -5, "feedback": "thin"}]}"#,
        );
        assert!(!eval.placeholder);
        assert_eq!(eval.score(), 100);
        assert_eq!(eval.question_feedback[0].score, 0.0);
        assert!(eval.improvements.is_empty());
    }

    #[test]
    fn test_unparseable_evaluation_falls_back_to_placeholder() {
        let eval = parse_evaluation("I'm sorry, I can't grade this.");
        assert!(eval.placeholder);
        assert_eq!(eval.score(), PLACEHOLDER_SCORE);
        assert!(!eval.strengths.is_empty());
        assert!(!eval.improvements.is_empty());
    }

    #[test]
    fn test_empty_model_reply_scores_placeholder() {
        let eval = evaluation_from_reply(Err(LlmError::EmptyContent)).unwrap();
        assert!(eval.placeholder);
        assert_eq!(eval.score(), PLACEHOLDER_SCORE);

        let eval = evaluation_from_reply(Ok(r#"{"overall_score": 81}"#.to_string())).unwrap();
        assert!(!eval.placeholder);
        assert_eq!(eval.score(), 81);
    }

    #[test]
    fn test_rate_limited_evaluation_is_an_error() {
        let result = evaluation_from_reply(Err(LlmError::RateLimited { retries: 3 }));
        assert!(matches!(result, Err(LlmError::RateLimited { retries: 3 })));
    }
}
