use crate::cost::CostReport;
use crate::ranking::Ranking;
use crate::score_table::ScoreTable;
use crate::types::model::{OrganizationId, TaskId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRating {
    pub task: TaskId,
    pub organization: OrganizationId,
    pub openness: Option<f64>,
    pub openness_initial: Option<f64>,
    pub delta: Option<f64>,
    pub completeness: Option<f64>,
}

/// Everything the CLI prints, tagged by kind in JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report {
    Ratings {
        cycle: String,
        subset: String,
        rows: Vec<TaskRating>,
    },
    Ranking {
        cycle: String,
        subset: String,
        ranking: Ranking,
    },
    Costs {
        cycle: String,
        costs: CostReport,
    },
    ScoreTable {
        cycle: String,
        table: ScoreTable,
    },
}
