//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check parameter sources are usable before anything is fetched
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::AppConfig;

/// A single settings problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.gateway.state_file.as_os_str().is_empty() {
        errors.push(ValidationError::new("gateway.state_file", "must not be empty"));
    }

    for (idx, file) in config.params.files.iter().enumerate() {
        if file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                format!("params.files[{}]", idx),
                "must not be empty",
            ));
        }
    }

    for (idx, url) in config.params.urls.iter().enumerate() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ValidationError::new(
                format!("params.urls[{}]", idx),
                format!("{:?} is not an http(s) url", url),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.gateway.state_file = PathBuf::new();
        config.params.urls = vec!["ftp://example.org/p.json".into()];
        config.params.files = vec![PathBuf::new()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].field, "gateway.state_file");
        assert!(errors[2].to_string().starts_with("params.urls[0]"));
    }
}
