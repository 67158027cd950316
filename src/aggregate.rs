use crate::error::{OpennessError, Result};
use crate::formula;
use crate::types::model::{
    FormulaVersion, Monitoring, Parameter, ParameterCode, QuestionId, Revision, Score, ScoreKey,
    Task, TaskId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParameterSubset {
    #[default]
    All,
    Npa,
    NonNpa,
    Explicit(BTreeSet<ParameterCode>),
}

impl ParameterSubset {
    pub fn contains(&self, parameter: &Parameter) -> bool {
        match self {
            Self::All => true,
            Self::Npa => parameter.npa,
            Self::NonNpa => !parameter.npa,
            Self::Explicit(codes) => codes.contains(&parameter.code),
        }
    }
}

/// CURRENT reads FINAL rows; INITIAL reads INTERIM rows, falling back to FINAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Snapshot {
    Current,
    Initial,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParameterOpenness {
    pub current: Option<f64>,
    pub initial: Option<f64>,
}

impl ParameterOpenness {
    pub fn get(&self, snapshot: Snapshot) -> Option<f64> {
        match snapshot {
            Snapshot::Current => self.current,
            Snapshot::Initial => self.initial,
        }
    }
}

pub struct TaskAggregator<'m> {
    monitoring: &'m Monitoring,
    tasks: HashMap<TaskId, &'m Task>,
    scores: HashMap<ScoreKey, &'m Score>,
    openness: HashMap<(TaskId, ParameterCode), ParameterOpenness>,
    answers: HashSet<(TaskId, QuestionId)>,
}

impl<'m> TaskAggregator<'m> {
    pub fn new(monitoring: &'m Monitoring) -> Self {
        let version = monitoring.formula;
        let parameters = monitoring
            .parameters
            .iter()
            .map(|parameter| (parameter.code, parameter))
            .collect::<HashMap<_, _>>();
        let scores = monitoring
            .scores
            .iter()
            .map(|score| (score.key(), score))
            .collect::<HashMap<_, _>>();

        let rows = monitoring
            .scores
            .iter()
            .filter_map(|score| {
                parameters
                    .get(&score.parameter)
                    .map(|parameter| (score, *parameter))
            })
            .collect::<Vec<_>>();
        let values = formula::evaluate_bulk(rows.iter().copied(), version);

        let mut openness: HashMap<(TaskId, ParameterCode), ParameterOpenness> = HashMap::new();
        for ((score, _), value) in rows.iter().zip(values) {
            let entry = openness.entry((score.task, score.parameter)).or_default();
            match score.revision {
                Revision::Final => entry.current = Some(value),
                Revision::Interim => entry.initial = Some(value),
            }
        }
        for entry in openness.values_mut() {
            if entry.initial.is_none() {
                entry.initial = entry.current;
            }
        }
        debug!(cycle = %monitoring.name, evaluated = rows.len(), "evaluated cycle scores");

        Self {
            monitoring,
            tasks: monitoring.tasks.iter().map(|task| (task.id, task)).collect(),
            scores,
            openness,
            answers: monitoring
                .answers
                .iter()
                .map(|answer| (answer.task, answer.question))
                .collect(),
        }
    }

    pub fn monitoring(&self) -> &'m Monitoring {
        self.monitoring
    }

    pub fn version(&self) -> FormulaVersion {
        self.monitoring.formula
    }

    pub fn task(&self, id: TaskId) -> Result<&'m Task> {
        self.tasks
            .get(&id)
            .copied()
            .ok_or(OpennessError::UnknownTask(id))
    }

    pub fn score(
        &self,
        task: TaskId,
        parameter: ParameterCode,
        revision: Revision,
    ) -> Option<&'m Score> {
        self.scores
            .get(&ScoreKey::new(task, parameter, revision))
            .copied()
    }

    pub fn parameter_openness(&self, task: TaskId, parameter: ParameterCode) -> ParameterOpenness {
        self.openness
            .get(&(task, parameter))
            .copied()
            .unwrap_or_default()
    }

    pub fn included<'a>(
        &'a self,
        task: &'a Task,
        subset: &'a ParameterSubset,
    ) -> impl Iterator<Item = &'m Parameter> + 'a {
        let monitoring: &'m Monitoring = self.monitoring;
        monitoring.parameters.iter().filter(move |parameter| {
            subset.contains(parameter) && !parameter.is_excluded_for(task.organization)
        })
    }

    /// Denominator of the weighted average. Negative weights only ever
    /// subtract from the numerator.
    pub fn weight_base(&self, task: &Task, subset: &ParameterSubset) -> i64 {
        self.included(task, subset)
            .map(|parameter| i64::from(parameter.weight.max(0)))
            .sum()
    }

    pub fn aggregate(
        &self,
        task: &Task,
        subset: &ParameterSubset,
        snapshot: Snapshot,
    ) -> Option<f64> {
        let mut included = 0usize;
        let mut weighted = 0.0;
        for parameter in self.included(task, subset) {
            included += 1;
            let openness = self
                .parameter_openness(task.id, parameter.code)
                .get(snapshot)
                .unwrap_or(0.0);
            weighted += f64::from(parameter.weight) * openness;
        }
        let base = self.weight_base(task, subset);
        if included == 0 || base <= 0 {
            debug!(task = task.id, included, base, "openness undefined");
            return None;
        }
        Some(weighted / base as f64)
    }

    pub fn openness(&self, task: &Task, subset: &ParameterSubset) -> Option<f64> {
        self.aggregate(task, subset, Snapshot::Current)
    }

    pub fn openness_initial(&self, task: &Task, subset: &ParameterSubset) -> Option<f64> {
        self.aggregate(task, subset, Snapshot::Initial)
    }

    /// Percentage of assessable parameters with a FINAL score plus answered
    /// questionnaire items, over their combined count.
    pub fn completeness(&self, task: &Task) -> Option<f64> {
        let mut total = 0usize;
        let mut done = 0usize;
        for parameter in self.included(task, &ParameterSubset::All) {
            total += 1;
            if self.score(task.id, parameter.code, Revision::Final).is_some() {
                done += 1;
            }
        }
        for question in &self.monitoring.questions {
            total += 1;
            if self.answers.contains(&(task.id, question.id)) {
                done += 1;
            }
        }
        if total == 0 {
            return None;
        }
        Some(100.0 * done as f64 / total as f64)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::model::{
        Answer, Criterion, Phase, Question, Relevance, ScoreValues, TaskStatus,
    };
    use chrono::Utc;

    pub(crate) fn parameter(code: ParameterCode, weight: i32) -> Parameter {
        Parameter {
            code,
            name: format!("parameter {code}"),
            weight,
            relevance: Relevance::all(),
            npa: false,
            excluded: Default::default(),
        }
    }

    pub(crate) fn task(id: TaskId, organization: u64) -> Task {
        Task {
            id,
            organization,
            status: TaskStatus::Approved,
            assignee: None,
        }
    }

    pub(crate) fn monitoring(parameters: Vec<Parameter>, tasks: Vec<Task>) -> Monitoring {
        Monitoring {
            name: "2024".to_string(),
            phase: Phase::Interact,
            formula: FormulaVersion::V8,
            no_interaction: false,
            parameters,
            questions: Vec::new(),
            organizations: Vec::new(),
            tasks,
            scores: Vec::new(),
            answers: Vec::new(),
        }
    }

    pub(crate) fn scored(task: TaskId, parameter: ParameterCode, values: ScoreValues) -> Score {
        Score::new(task, parameter, values, Utc::now())
    }

    pub(crate) fn interim(task: TaskId, parameter: ParameterCode, values: ScoreValues) -> Score {
        Score {
            revision: Revision::Interim,
            ..scored(task, parameter, values)
        }
    }

    #[test]
    fn negative_weight_subtracts_from_weighted_sum() {
        let mut cycle = monitoring(vec![parameter(1, -1), parameter(2, 2)], vec![task(1, 1)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            scored(1, 2, ScoreValues::all_max()),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        let openness = aggregator.openness(&cycle.tasks[0], &ParameterSubset::All);
        assert_eq!(openness, Some(50.0));
    }

    #[test]
    fn equal_weights_average_found_and_not_found() {
        let mut cycle = monitoring(vec![parameter(1, 1), parameter(2, 1)], vec![task(1, 1)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            scored(1, 2, ScoreValues::not_found()),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        assert_eq!(
            aggregator.openness(&cycle.tasks[0], &ParameterSubset::All),
            Some(50.0)
        );
    }

    #[test]
    fn empty_subset_and_zero_weight_are_undefined() {
        let cycle = monitoring(vec![parameter(2, 1), parameter(3, 0)], vec![task(1, 1)]);
        let aggregator = TaskAggregator::new(&cycle);
        assert_eq!(aggregator.openness(&cycle.tasks[0], &ParameterSubset::Npa), None);
        assert_eq!(
            aggregator.openness(
                &cycle.tasks[0],
                &ParameterSubset::Explicit(BTreeSet::from([3]))
            ),
            None
        );
        assert_eq!(
            aggregator.openness(&cycle.tasks[0], &ParameterSubset::Explicit(BTreeSet::new())),
            None
        );
    }

    #[test]
    fn excluded_parameters_are_skipped_per_organization() {
        let mut excluded = parameter(2, 1);
        excluded.excluded.insert(7);
        let mut cycle = monitoring(vec![parameter(1, 1), excluded], vec![task(1, 7), task(2, 8)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            scored(1, 2, ScoreValues::not_found()),
            scored(2, 1, ScoreValues::all_max()),
            scored(2, 2, ScoreValues::not_found()),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        assert_eq!(
            aggregator.openness(&cycle.tasks[0], &ParameterSubset::All),
            Some(100.0)
        );
        assert_eq!(
            aggregator.openness(&cycle.tasks[1], &ParameterSubset::All),
            Some(50.0)
        );
    }

    #[test]
    fn npa_subsets_split_parameters() {
        let mut npa = parameter(1, 1);
        npa.npa = true;
        let mut cycle = monitoring(vec![npa, parameter(2, 1)], vec![task(1, 1)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            scored(1, 2, ScoreValues::all_max().with(Criterion::Complete, 2)),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        let task = &cycle.tasks[0];
        assert_eq!(aggregator.openness(task, &ParameterSubset::Npa), Some(100.0));
        assert_eq!(aggregator.openness(task, &ParameterSubset::NonNpa), Some(50.0));
        assert_eq!(aggregator.openness(task, &ParameterSubset::All), Some(75.0));
    }

    #[test]
    fn initial_prefers_interim_and_falls_back_to_final() {
        let mut cycle = monitoring(vec![parameter(1, 1), parameter(2, 1)], vec![task(1, 1)]);
        cycle.scores = vec![
            scored(1, 1, ScoreValues::all_max()),
            interim(1, 1, ScoreValues::not_found()),
            scored(1, 2, ScoreValues::all_max()),
        ];
        let aggregator = TaskAggregator::new(&cycle);
        let task = &cycle.tasks[0];
        assert_eq!(aggregator.openness(task, &ParameterSubset::All), Some(100.0));
        assert_eq!(
            aggregator.openness_initial(task, &ParameterSubset::All),
            Some(50.0)
        );
        assert_eq!(aggregator.parameter_openness(1, 2).initial, Some(100.0));
        assert_eq!(aggregator.parameter_openness(1, 3), ParameterOpenness::default());
    }

    #[test]
    fn unscored_parameter_counts_as_not_found() {
        let mut cycle = monitoring(vec![parameter(1, 1), parameter(2, 3)], vec![task(1, 1)]);
        cycle.scores = vec![scored(1, 1, ScoreValues::all_max())];
        let aggregator = TaskAggregator::new(&cycle);
        assert_eq!(
            aggregator.openness(&cycle.tasks[0], &ParameterSubset::All),
            Some(25.0)
        );
    }

    #[test]
    fn completeness_counts_scores_and_answers() {
        let mut excluded = parameter(3, 1);
        excluded.excluded.insert(1);
        let mut cycle = monitoring(
            vec![parameter(1, 1), parameter(2, 1), excluded],
            vec![task(1, 1), task(2, 2)],
        );
        cycle.questions = vec![
            Question {
                id: 1,
                text: "site address".to_string(),
            },
            Question {
                id: 2,
                text: "contact".to_string(),
            },
        ];
        cycle.scores = vec![scored(1, 1, ScoreValues::all_max())];
        cycle.answers = vec![Answer {
            task: 1,
            question: 2,
        }];
        let aggregator = TaskAggregator::new(&cycle);
        assert_eq!(aggregator.completeness(&cycle.tasks[0]), Some(50.0));
        assert_eq!(aggregator.completeness(&cycle.tasks[1]), Some(0.0));

        let empty = monitoring(Vec::new(), vec![task(1, 1)]);
        assert_eq!(TaskAggregator::new(&empty).completeness(&empty.tasks[0]), None);
    }

    #[test]
    fn unknown_task_is_an_error() {
        let cycle = monitoring(Vec::new(), Vec::new());
        assert!(matches!(
            TaskAggregator::new(&cycle).task(42),
            Err(OpennessError::UnknownTask(42))
        ));
    }
}
