use crate::error::OpennessError;
use crate::types::model::TaskStatus;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpennessConfig {
    pub project: Option<ProjectConfig>,
    pub ranking: Option<RankingConfig>,
    pub report: Option<ReportConfig>,
    pub validation: Option<ValidationConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_eligible_statuses")]
    pub eligible_statuses: Vec<String>,
}

fn default_eligible_statuses() -> Vec<String> {
    vec!["approved".to_string()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    pub precision: Option<usize>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationConfig {
    pub require_recommendation: Option<bool>,
}

pub const DEFAULT_PRECISION: usize = 3;
const MAX_PRECISION: usize = 10;

impl OpennessConfig {
    pub fn eligible_statuses(&self) -> Vec<TaskStatus> {
        match &self.ranking {
            Some(ranking) => ranking
                .eligible_statuses
                .iter()
                .filter_map(|status| TaskStatus::parse(status))
                .collect(),
            None => vec![TaskStatus::Approved],
        }
    }

    pub fn precision(&self) -> usize {
        self.report
            .as_ref()
            .and_then(|report| report.precision)
            .unwrap_or(DEFAULT_PRECISION)
    }

    pub fn default_format(&self) -> Option<&str> {
        self.report
            .as_ref()
            .and_then(|report| report.format.as_deref())
    }

    pub fn require_recommendation(&self) -> bool {
        self.validation
            .as_ref()
            .and_then(|validation| validation.require_recommendation)
            .unwrap_or(true)
    }

    /// Report heading: the dataset's cycle name, or the project name when the
    /// dataset leaves it blank.
    pub fn cycle_label(&self, cycle: &str) -> String {
        match &self.project {
            Some(project) if cycle.trim().is_empty() => project.name.clone(),
            _ => cycle.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), OpennessError> {
        if let Some(ranking) = &self.ranking {
            if ranking.eligible_statuses.is_empty() {
                return Err(OpennessError::ConfigParse(
                    "ranking.eligible_statuses cannot be empty".to_string(),
                ));
            }
            let unknown = ranking
                .eligible_statuses
                .iter()
                .filter(|status| TaskStatus::parse(status).is_none())
                .cloned()
                .collect::<Vec<_>>();
            if !unknown.is_empty() {
                return Err(OpennessError::ConfigParse(format!(
                    "ranking.eligible_statuses contains unknown status(es): {}",
                    unknown.join(", ")
                )));
            }
        }

        if self.precision() > MAX_PRECISION {
            return Err(OpennessError::ConfigParse(format!(
                "report.precision must be at most {MAX_PRECISION} (found {})",
                self.precision()
            )));
        }

        if let Some(format) = self.default_format() {
            if !matches!(format, "md" | "json") {
                return Err(OpennessError::ConfigParse(format!(
                    "unsupported report.format: {format}"
                )));
            }
        }

        Ok(())
    }
}
