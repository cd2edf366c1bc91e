//! Error types shared across the crate.
//!
//! Most functions return [`Result`], an alias for `anyhow::Result`, so call
//! sites can attach context with `.context(...)`. [`ClipperError`] carries
//! the failure kinds the HTTP layer has to tell apart: validation problems
//! map to 400, unknown ids to 404, everything else to 500.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClipperError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid settings: {}", .0.join(", "))]
    InvalidSettings(Vec<String>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("naver api error: {0}")]
    Naver(String),

    #[error("notion api error: {0}")]
    Notion(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn error_messages_carry_their_prefix() {
        let err = ClipperError::Validation("keyword must be at least 2 characters".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: keyword must be at least 2 characters"
        );

        let err = ClipperError::NotFound("keyword abc".to_string());
        assert_eq!(err.to_string(), "not found: keyword abc");

        let err = ClipperError::Browser("debug port closed".to_string());
        assert_eq!(err.to_string(), "browser error: debug port closed");
    }

    #[test]
    fn invalid_settings_joins_details() {
        let err = ClipperError::InvalidSettings(vec![
            "Naver client id is missing".to_string(),
            "Notion API key is missing".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid settings: Naver client id is missing, Notion API key is missing"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: ClipperError = io.into();
        assert!(err.to_string().starts_with("io error:"));
    }

    #[test]
    fn anyhow_context_preserves_the_source() {
        let result: Result<()> = Err(ClipperError::Store("truncated json".to_string()))
            .map_err(anyhow::Error::from)
            .context("loading keywords");
        let err = result.unwrap_err();
        assert!(format!("{err:#}").contains("loading keywords"));
        assert!(format!("{err:#}").contains("truncated json"));
        assert!(err.downcast_ref::<ClipperError>().is_some());
    }
}
