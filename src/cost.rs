use crate::aggregate::{ParameterSubset, Snapshot, TaskAggregator};
use crate::error::Result;
use crate::types::model::{ParameterCode, Revision, TaskId};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationCost {
    pub parameter: ParameterCode,
    pub relevant: bool,
    pub cost: Option<f64>,
    pub interim_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub task: TaskId,
    pub rows: Vec<RecommendationCost>,
    pub total_cost: Option<f64>,
}

pub struct RecommendationCostEngine<'a, 'm> {
    aggregator: &'a TaskAggregator<'m>,
}

impl<'a, 'm> RecommendationCostEngine<'a, 'm> {
    pub fn new(aggregator: &'a TaskAggregator<'m>) -> Self {
        Self { aggregator }
    }

    /// Outstanding issues of a task, highest cost at interaction start first.
    pub fn costs(&self, task_id: TaskId) -> Result<Vec<RecommendationCost>> {
        let task = self.aggregator.task(task_id)?;
        let base = self.aggregator.weight_base(task, &ParameterSubset::All);

        let mut rows = Vec::new();
        for parameter in &self.aggregator.monitoring().parameters {
            let Some(score) = self.aggregator.score(task.id, parameter.code, Revision::Final) else {
                continue;
            };
            let relevant = !parameter.is_excluded_for(task.organization);
            let has_comments = !score.comments.is_empty();
            let has_recommendation = !score.values.recommendation.trim().is_empty();
            let listed = if relevant {
                has_recommendation || has_comments
            } else {
                has_comments
            };
            if !listed {
                continue;
            }

            let openness = self.aggregator.parameter_openness(task.id, parameter.code);
            let cost_of = |snapshot: Snapshot| {
                if !relevant || base <= 0 {
                    return None;
                }
                openness
                    .get(snapshot)
                    .map(|value| f64::from(parameter.weight) * (100.0 - value) / base as f64)
            };
            rows.push(RecommendationCost {
                parameter: parameter.code,
                relevant,
                cost: cost_of(Snapshot::Current),
                interim_cost: cost_of(Snapshot::Initial),
            });
        }

        // Historical order keeps resolved issues from jumping around mid-session.
        rows.sort_by(|a, b| match (a.interim_cost, b.interim_cost) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(rows)
    }

    /// Deficit of the task's current openness over all parameters.
    pub fn total_cost(&self, task_id: TaskId) -> Result<Option<f64>> {
        let task = self.aggregator.task(task_id)?;
        Ok(self
            .aggregator
            .openness(task, &ParameterSubset::All)
            .map(|openness| 100.0 - openness))
    }

    pub fn report(&self, task_id: TaskId) -> Result<CostReport> {
        Ok(CostReport {
            task: task_id,
            rows: self.costs(task_id)?,
            total_cost: self.total_cost(task_id)?,
        })
    }
}
