//! Workflow-automation webhooks: resume compilation and generation,
//! summarization, advanced matching and job-posted notifications.
//!
//! Every webhook is a plain POST to a configured URL carrying the shared
//! `x-api-key` header.

use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::WebhookConfig;

const API_KEY_HEADER: &str = "x-api-key";
/// Hard limit for the best-effort job notification.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook '{0}' is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook '{name}' returned status {status}: {body}")]
    Status {
        name: &'static str,
        status: u16,
        body: String,
    },

    #[error("webhook '{name}' returned an unexpected payload: {reason}")]
    Payload { name: &'static str, reason: String },
}

#[derive(Debug, Serialize)]
pub struct CompileLatexRequest<'a> {
    pub latex: &'a str,
    pub filename: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedResume {
    pub latex: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// One match returned by the advanced-matching workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedMatch {
    pub job_id: Uuid,
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdvancedMatchResponse {
    #[serde(default)]
    pub matches: Vec<AdvancedMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobPostedEvent {
    pub job_id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub location: Option<String>,
    pub skills: Vec<String>,
}

#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Sends LaTeX source to the compiler workflow and returns the PDF bytes.
    pub async fn compile_latex(&self, latex: &str, filename: &str) -> Result<Bytes, WebhookError> {
        let url = require_url("compile_latex", &self.config.compile_latex_url)?;
        let response = self
            .post(url)
            .json(&CompileLatexRequest { latex, filename })
            .send()
            .await?;
        let response = check_status("compile_latex", response).await?;
        let pdf = response.bytes().await?;
        if !pdf.starts_with(b"%PDF") {
            return Err(WebhookError::Payload {
                name: "compile_latex",
                reason: "response is not a PDF document".to_string(),
            });
        }
        Ok(pdf)
    }

    /// Asks the generation workflow for a LaTeX resume built from `profile`.
    pub async fn generate_resume(
        &self,
        profile: &serde_json::Value,
    ) -> Result<GeneratedResume, WebhookError> {
        self.post_json("generate_resume", &self.config.generate_resume_url, profile)
            .await
    }

    pub async fn summarize(&self, text: &str) -> Result<SummaryResponse, WebhookError> {
        self.post_json(
            "summarize",
            &self.config.summarize_url,
            &SummarizeRequest { text },
        )
        .await
    }

    pub async fn advanced_match(
        &self,
        payload: &serde_json::Value,
    ) -> Result<AdvancedMatchResponse, WebhookError> {
        self.post_json("advanced_match", &self.config.advanced_match_url, payload)
            .await
    }

    /// Notifies the job-posted workflow. Aborts after `NOTIFY_TIMEOUT`.
    /// An unconfigured URL is a silent no-op.
    pub async fn notify_job_posted(&self, event: &JobPostedEvent) -> Result<(), WebhookError> {
        let Some(url) = self.config.job_posted_url.as_deref() else {
            debug!("job_posted webhook not configured, skipping");
            return Ok(());
        };
        let response = self
            .post(url)
            .timeout(NOTIFY_TIMEOUT)
            .json(event)
            .send()
            .await?;
        check_status("job_posted", response).await?;
        info!("job_posted webhook accepted job {}", event.job_id);
        Ok(())
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.config.api_key {
            Some(key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        name: &'static str,
        url: &Option<String>,
        body: &B,
    ) -> Result<T, WebhookError> {
        let url = require_url(name, url)?;
        let response = self.post(url).json(body).send().await?;
        let response = check_status(name, response).await?;
        let text = response.text().await?;
        parse_payload(name, &text)
    }
}

fn require_url<'a>(name: &'static str, url: &'a Option<String>) -> Result<&'a str, WebhookError> {
    url.as_deref().ok_or(WebhookError::NotConfigured(name))
}

async fn check_status(
    name: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, WebhookError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(WebhookError::Status {
        name,
        status: status.as_u16(),
        body: body.chars().take(500).collect(),
    })
}

/// Automation tools often wrap a single result in a one-element array.
fn parse_payload<T: DeserializeOwned>(name: &'static str, text: &str) -> Result<T, WebhookError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| WebhookError::Payload {
            name,
            reason: e.to_string(),
        })?;
    let value = match value {
        serde_json::Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| WebhookError::Payload {
        name,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_plain_object() {
        let summary: SummaryResponse =
            parse_payload("summarize", r#"{"summary": "Senior engineer"}"#).unwrap();
        assert_eq!(summary.summary, "Senior engineer");
    }

    #[test]
    fn test_parse_payload_unwraps_single_element_array() {
        let generated: GeneratedResume =
            parse_payload("generate_resume", r#"[{"latex": "\\documentclass{article}"}]"#)
                .unwrap();
        assert!(generated.latex.starts_with("\\documentclass"));
        assert!(generated.title.is_none());
    }

    #[test]
    fn test_parse_payload_rejects_wrong_shape() {
        let result: Result<SummaryResponse, _> = parse_payload("summarize", r#"{"text": "x"}"#);
        match result {
            Err(WebhookError::Payload { name, .. }) => assert_eq!(name, "summarize"),
            other => panic!("expected payload error, got {other:?}"),
        }
    }

    #[test]
    fn test_advanced_match_defaults_missing_fields() {
        let id = Uuid::new_v4();
        let response: AdvancedMatchResponse = parse_payload(
            "advanced_match",
            &format!(r#"{{"matches": [{{"job_id": "{id}", "score": 0.9}}]}}"#),
        )
        .unwrap();
        assert_eq!(response.matches.len(), 1);
        assert_eq!(response.matches[0].job_id, id);
        assert!(response.matches[0].reasons.is_empty());
    }

    #[test]
    fn test_require_url_reports_unconfigured_webhook() {
        let err = require_url("summarize", &None).unwrap_err();
        assert_eq!(err.to_string(), "webhook 'summarize' is not configured");
    }

    fn job_posted() -> JobPostedEvent {
        JobPostedEvent {
            job_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            location: None,
            skills: vec![],
        }
    }

    #[tokio::test]
    async fn test_notify_without_url_is_noop() {
        let client = WebhookClient::new(WebhookConfig::default());
        assert!(client.notify_job_posted(&job_posted()).await.is_ok());
    }

    #[tokio::test]
    async fn test_notify_gives_up_on_silent_endpoint() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = WebhookClient::new(WebhookConfig {
            job_posted_url: Some(format!("http://{addr}/job-posted")),
            ..WebhookConfig::default()
        });
        let started = std::time::Instant::now();
        let err = client.notify_job_posted(&job_posted()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(&err, WebhookError::Http(e) if e.is_timeout()), "{err}");
        assert!(elapsed >= NOTIFY_TIMEOUT, "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
    }

    #[tokio::test]
    async fn test_notify_sends_api_key() {
        use axum::http::{HeaderMap, StatusCode};

        let app = axum::Router::new().fallback(|headers: HeaderMap| async move {
            match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
                Some("shared-secret") => StatusCode::NO_CONTENT,
                _ => StatusCode::UNAUTHORIZED,
            }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = WebhookClient::new(WebhookConfig {
            api_key: Some("shared-secret".to_string()),
            job_posted_url: Some(format!("http://{addr}/job-posted")),
            ..WebhookConfig::default()
        });
        assert!(client.notify_job_posted(&job_posted()).await.is_ok());

        let keyless = WebhookClient::new(WebhookConfig {
            job_posted_url: Some(format!("http://{addr}/job-posted")),
            ..WebhookConfig::default()
        });
        let err = keyless.notify_job_posted(&job_posted()).await.unwrap_err();
        assert!(matches!(err, WebhookError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_compile_without_url_fails_fast() {
        let client = WebhookClient::new(WebhookConfig::default());
        let err = client.compile_latex("\\begin{document}", "cv").await.unwrap_err();
        assert!(matches!(err, WebhookError::NotConfigured("compile_latex")));
    }
}
