use crate::formula;
use crate::types::model::{Criterion, CriterionValue, FormulaVersion, Parameter, ScoreValues};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingCriterion { criterion: Criterion },
    CriterionOutOfRange { criterion: Criterion, value: u8 },
    MissingRecommendation,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCriterion { criterion } => {
                write!(f, "criterion '{criterion}' is relevant but not set")
            }
            Self::CriterionOutOfRange { criterion, value } => write!(
                f,
                "criterion '{criterion}' value {value} outside {}..={}",
                criterion.min_value(),
                criterion.max_value()
            ),
            Self::MissingRecommendation => {
                f.write_str("a non-maximum score requires recommendation text")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub version: FormulaVersion,
    pub require_recommendation: bool,
    /// Cycle runs without an interaction phase; recommendations are optional.
    pub no_interaction: bool,
}

/// Save-time cleanup: a score that is not found carries no criterion values,
/// and criteria the parameter does not use are stored as not applicable.
pub fn normalize(values: &mut ScoreValues, parameter: &Parameter) {
    for criterion in Criterion::ALL {
        let cleared = if !parameter.relevance.is_relevant(criterion) {
            Some(CriterionValue::NotApplicable)
        } else if !values.found {
            Some(CriterionValue::Unevaluated)
        } else {
            None
        };
        if let Some(value) = cleared {
            values.criteria.set(criterion, value);
        }
    }
}

/// `previous` is the stored FINAL row normalized like `values`. Values equal to it are
/// grandfathered past the recommendation rule.
pub fn validate_score(
    values: &ScoreValues,
    previous: Option<&ScoreValues>,
    parameter: &Parameter,
    policy: &ValidationPolicy,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if values.found {
        for criterion in policy.version.criteria() {
            if !parameter.relevance.is_relevant(*criterion) {
                continue;
            }
            match values.criteria.get(*criterion) {
                CriterionValue::Value(value) if !criterion.accepts(value) => {
                    issues.push(ValidationIssue::CriterionOutOfRange {
                        criterion: *criterion,
                        value,
                    });
                }
                CriterionValue::Value(_) => {}
                CriterionValue::Unevaluated | CriterionValue::NotApplicable => {
                    issues.push(ValidationIssue::MissingCriterion {
                        criterion: *criterion,
                    });
                }
            }
        }
    }

    let needs_recommendation = policy.require_recommendation
        && !policy.no_interaction
        && !formula::is_max(values, &parameter.relevance, policy.version)
        && values.recommendation.trim().is_empty();
    let grandfathered = previous.is_some_and(|previous| previous == values);
    if needs_recommendation && !grandfathered {
        issues.push(ValidationIssue::MissingRecommendation);
    }

    issues
}
