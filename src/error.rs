use crate::validation::ValidationIssue;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpennessError {
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("invalid dataset: {0}")]
    DatasetInvalid(String),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("unknown formula version code: {0}")]
    UnknownFormulaVersion(u8),

    #[error("unknown task: {0}")]
    UnknownTask(u64),

    #[error("unknown parameter: {0}")]
    UnknownParameter(u32),

    #[error("score rejected: {}", format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, OpennessError>;
