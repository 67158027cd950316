pub mod json;
pub mod md;

use crate::error::OpennessError;
use crate::types::report::Report;

#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Md,
}

pub fn render(report: &Report, format: OutputFormat, precision: usize) -> Result<String, OpennessError> {
    match format {
        OutputFormat::Json => json::to_json(report).map_err(OpennessError::Json),
        OutputFormat::Md => Ok(md::to_markdown(report, precision)),
    }
}
