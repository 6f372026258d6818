//! Request validation helpers shared by the feature modules.
//! Each returns `AppError::Validation` so handlers can use `?`.

use chrono::NaiveDate;

use crate::errors::AppError;

pub const MAX_TEXT_LEN: usize = 10_000;
pub const MAX_SHORT_TEXT_LEN: usize = 200;

/// Trims `value` and rejects blank or overlong input.
pub fn required(field: &str, value: &str, max_len: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional field; blank strings become `None`.
pub fn optional(field: &str, value: Option<&str>, max_len: usize) -> Result<Option<String>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => required(field, v, max_len).map(Some),
    }
}

/// Accepts only absolute http(s) URLs.
pub fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>, AppError> {
    let value = optional(field, value, 2048)?;
    if let Some(url) = &value {
        let lower = url.to_ascii_lowercase();
        let rest = lower
            .strip_prefix("https://")
            .or_else(|| lower.strip_prefix("http://"));
        if rest.map(|r| r.is_empty() || r.starts_with('/')).unwrap_or(true) {
            return Err(AppError::Validation(format!(
                "{field} must be an http(s) URL"
            )));
        }
    }
    Ok(value)
}

pub fn date_range(
    field: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(AppError::Validation(format!(
                "{field}: end date must not be before start date"
            )));
        }
    }
    Ok(())
}

pub fn non_negative(field: &str, value: Option<i32>) -> Result<(), AppError> {
    match value {
        Some(v) if v < 0 => Err(AppError::Validation(format!(
            "{field} must not be negative"
        ))),
        _ => Ok(()),
    }
}

/// Trims, drops blanks, de-duplicates case-insensitively while keeping the
/// first spelling.
pub fn normalize_list(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Rust  ", 50).unwrap(), "Rust");
        assert!(matches!(
            required("title", "   ", 50),
            Err(AppError::Validation(m)) if m == "title is required"
        ));
    }

    #[test]
    fn test_required_rejects_overlong() {
        assert!(required("name", &"a".repeat(11), 10).is_err());
        assert!(required("name", &"a".repeat(10), 10).is_ok());
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional("bio", Some("  "), 10).unwrap(), None);
        assert_eq!(optional("bio", None, 10).unwrap(), None);
        assert_eq!(optional("bio", Some(" hi "), 10).unwrap(), Some("hi".into()));
    }

    #[test]
    fn test_optional_url() {
        assert!(optional_url("website", Some("https://acme.io")).is_ok());
        assert!(optional_url("website", Some("http://acme.io/jobs")).is_ok());
        assert!(optional_url("website", Some("ftp://acme.io")).is_err());
        assert!(optional_url("website", Some("https://")).is_err());
        assert!(optional_url("website", Some("javascript:alert(1)")).is_err());
        assert_eq!(optional_url("website", None).unwrap(), None);
    }

    #[test]
    fn test_date_range() {
        let a = NaiveDate::from_ymd_opt(2020, 1, 1);
        let b = NaiveDate::from_ymd_opt(2021, 1, 1);
        assert!(date_range("experience", a, b).is_ok());
        assert!(date_range("experience", a, a).is_ok());
        assert!(date_range("experience", b, a).is_err());
        assert!(date_range("experience", None, a).is_ok());
    }

    #[test]
    fn test_normalize_list_dedups_case_insensitively() {
        let input = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "".to_string(),
            "Go".to_string(),
        ];
        assert_eq!(normalize_list(&input), vec!["Rust", "Go"]);
    }

    #[test]
    fn test_non_negative() {
        assert!(non_negative("salary_min", Some(0)).is_ok());
        assert!(non_negative("salary_min", None).is_ok());
        assert!(non_negative("salary_min", Some(-1)).is_err());
    }
}
