//! Error types for the protocol register

use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Template workbook errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template has no sheet named '{0}'")]
    MissingSheet(String),

    #[error("Invalid template format: {0}")]
    InvalidFormat(String),

    #[error("Template XML error: {0}")]
    Xml(String),

    #[error("Template archive error: {0}")]
    Zip(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Excel export error: {0}")]
    Excel(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts() {
        let err: Error = ConfigError::Missing("DB_HOST").into();
        assert!(matches!(err, Error::Config(ConfigError::Missing("DB_HOST"))));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing environment variable: DB_HOST"
        );
    }

    #[test]
    fn test_template_error_message() {
        let err: Error = TemplateError::MissingSheet("protocolo".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Template error: Template has no sheet named 'protocolo'"
        );
    }
}
