use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    /// HS256 secret shared with the auth platform that signs session tokens.
    pub jwt_secret: String,
    pub session_cookie_name: String,
    pub run_migrations: bool,
    pub analysis_batch_size: usize,
    pub webhooks: WebhookConfig,
    pub port: u16,
    pub rust_log: String,
}

/// Workflow-automation endpoints. Each one is optional; calling an
/// unconfigured webhook is reported as a webhook error.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub api_key: Option<String>,
    pub compile_latex_url: Option<String>,
    pub generate_resume_url: Option<String>,
    pub summarize_url: Option<String>,
    pub advanced_match_url: Option<String>,
    pub job_posted_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            jwt_secret: require_env("JWT_SECRET")?,
            session_cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "sb-access-token".to_string()),
            run_migrations: parse_bool(std::env::var("RUN_MIGRATIONS").ok().as_deref()),
            analysis_batch_size: std::env::var("ANALYSIS_BATCH_SIZE")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<usize>()
                .context("ANALYSIS_BATCH_SIZE must be a positive integer")?
                .max(1),
            webhooks: WebhookConfig {
                api_key: optional_env("WEBHOOK_API_KEY"),
                compile_latex_url: optional_env("WEBHOOK_COMPILE_LATEX_URL"),
                generate_resume_url: optional_env("WEBHOOK_GENERATE_RESUME_URL"),
                summarize_url: optional_env("WEBHOOK_SUMMARIZE_URL"),
                advanced_match_url: optional_env("WEBHOOK_ADVANCED_MATCH_URL"),
                job_posted_url: optional_env("WEBHOOK_JOB_POSTED_URL"),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_truthy_values() {
        for v in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_bool(Some(v)), "{v} should be truthy");
        }
    }

    #[test]
    fn test_parse_bool_falsy_values() {
        assert!(!parse_bool(None));
        assert!(!parse_bool(Some("")));
        assert!(!parse_bool(Some("0")));
        assert!(!parse_bool(Some("false")));
    }
}
