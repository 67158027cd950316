use crate::aggregate::TaskAggregator;
use crate::error::Result;
use crate::formula;
use crate::types::model::{Criterion, CriterionValue, ParameterCode, Revision, TaskId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionCell {
    pub criterion: Criterion,
    pub current: Option<CriterionValue>,
    pub interim: Option<CriterionValue>,
    pub current_is_max: bool,
    pub interim_is_max: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTableRow {
    pub parameter: ParameterCode,
    pub name: String,
    pub weight: i32,
    pub npa: bool,
    pub relevant: bool,
    pub has_current: bool,
    pub has_interim: bool,
    pub found: Option<bool>,
    pub interim_found: Option<bool>,
    pub cells: Vec<CriterionCell>,
    pub openness: Option<f64>,
    pub openness_initial: Option<f64>,
    pub is_max: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTable {
    pub task: TaskId,
    pub rows: Vec<ScoreTableRow>,
}

/// Cells exist only for criteria the parameter uses and the cycle's formula
/// version scores.
pub fn score_table(aggregator: &TaskAggregator<'_>, task_id: TaskId) -> Result<ScoreTable> {
    let task = aggregator.task(task_id)?;
    let version = aggregator.version();

    let rows = aggregator
        .monitoring()
        .parameters
        .iter()
        .map(|parameter| {
            let current = aggregator.score(task.id, parameter.code, Revision::Final);
            let interim = aggregator.score(task.id, parameter.code, Revision::Interim);
            let cells = version
                .criteria()
                .iter()
                .filter(|criterion| parameter.relevance.is_relevant(**criterion))
                .map(|criterion| {
                    let current = current.map(|score| score.values.criteria.get(*criterion));
                    let interim = interim.map(|score| score.values.criteria.get(*criterion));
                    CriterionCell {
                        criterion: *criterion,
                        current,
                        interim,
                        current_is_max: current.is_some_and(|value| value.is_max_for(*criterion)),
                        interim_is_max: interim.is_some_and(|value| value.is_max_for(*criterion)),
                    }
                })
                .collect();
            let openness = aggregator.parameter_openness(task.id, parameter.code);
            ScoreTableRow {
                parameter: parameter.code,
                name: parameter.name.clone(),
                weight: parameter.weight,
                npa: parameter.npa,
                relevant: !parameter.is_excluded_for(task.organization),
                has_current: current.is_some(),
                has_interim: interim.is_some(),
                found: current.map(|score| score.values.found),
                interim_found: interim.map(|score| score.values.found),
                cells,
                openness: openness.current,
                openness_initial: openness.initial,
                is_max: current.is_some_and(|score| {
                    formula::is_max(&score.values, &parameter.relevance, version)
                }),
            }
        })
        .collect();

    Ok(ScoreTable { task: task_id, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{interim, monitoring, parameter, scored, task};
    use crate::types::model::{FormulaVersion, Relevance, ScoreValues};

    #[test]
    fn table_pairs_current_and_interim_values() {
        let mut cycle = monitoring(vec![parameter(1, 1), parameter(2, 1)], vec![task(1, 1)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            interim(1, 1, ScoreValues::all_max().with(Criterion::Complete, 1)),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        let table = score_table(&aggregator, 1).expect("task should exist");

        let first = &table.rows[0];
        assert!(first.is_max);
        assert_eq!(first.openness, Some(100.0));
        assert_eq!(first.openness_initial, Some(20.0));
        let complete = &first.cells[0];
        assert_eq!(complete.criterion, Criterion::Complete);
        assert_eq!(complete.current, Some(CriterionValue::Value(3)));
        assert_eq!(complete.interim, Some(CriterionValue::Value(1)));
        assert!(complete.current_is_max);
        assert!(!complete.interim_is_max);

        assert!(first.has_current);
        assert!(first.has_interim);

        let unscored = &table.rows[1];
        assert!(!unscored.has_current);
        assert!(!unscored.has_interim);
        assert_eq!(unscored.found, None);
        assert_eq!(unscored.openness, None);
        assert_eq!(unscored.openness_initial, None);
        assert!(!unscored.is_max);
    }

    #[test]
    fn missing_row_is_distinct_from_unevaluated_criterion() {
        let mut cycle = monitoring(vec![parameter(1, 1)], vec![task(1, 1)]);
        cycle.scores = vec![scored(1, 1, ScoreValues::found().with(Criterion::Complete, 3))];
        let aggregator = TaskAggregator::new(&cycle);
        let table = score_table(&aggregator, 1).expect("task should exist");

        let row = &table.rows[0];
        assert!(row.has_current);
        assert!(!row.has_interim);
        let topical = &row.cells[1];
        assert_eq!(topical.criterion, Criterion::Topical);
        assert_eq!(topical.current, Some(CriterionValue::Unevaluated));
        assert_eq!(topical.interim, None);

        let json = serde_json::to_value(row).expect("row should serialize");
        assert_eq!(json["has_interim"], false);
        assert_eq!(json["cells"][1]["current"], serde_json::Value::Null);
    }

    #[test]
    fn cells_follow_relevance_and_formula_version() {
        let mut narrow = parameter(1, 1);
        narrow.relevance = Relevance::none()
            .with(Criterion::Topical, true)
            .with(Criterion::Image, true);
        let mut cycle = monitoring(vec![narrow], vec![task(1, 1)]);
        cycle.scores = vec![scored(1, 1, ScoreValues::all_max())];

        let aggregator = TaskAggregator::new(&cycle);
        let table = score_table(&aggregator, 1).expect("task should exist");
        let criteria = table.rows[0]
            .cells
            .iter()
            .map(|cell| cell.criterion)
            .collect::<Vec<_>>();
        assert_eq!(criteria, vec![Criterion::Topical, Criterion::Image]);

        cycle.formula = FormulaVersion::V1;
        let aggregator = TaskAggregator::new(&cycle);
        let table = score_table(&aggregator, 1).expect("task should exist");
        assert_eq!(table.rows[0].cells.len(), 1);
    }
}
