use crate::aggregate::{ParameterSubset, TaskAggregator};
use crate::types::model::{OrganizationId, Task, TaskId};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTask {
    pub task: TaskId,
    pub organization: OrganizationId,
    pub openness: Option<f64>,
    pub openness_initial: Option<f64>,
    pub delta: Option<f64>,
    /// `None` when openness is undefined.
    pub place: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleStatistics {
    pub ranked: usize,
    pub average_openness: Option<f64>,
    pub average_openness_initial: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking {
    pub rows: Vec<RankedTask>,
    pub statistics: CycleStatistics,
}

pub struct MonitoringRanker<'a, 'm> {
    aggregator: &'a TaskAggregator<'m>,
}

impl<'a, 'm> MonitoringRanker<'a, 'm> {
    pub fn new(aggregator: &'a TaskAggregator<'m>) -> Self {
        Self { aggregator }
    }

    /// Ranks the cycle's tasks for which `eligible` holds.
    pub fn rank<F>(&self, subset: &ParameterSubset, eligible: F) -> Ranking
    where
        F: Fn(&Task) -> bool,
    {
        let mut tasks = self
            .aggregator
            .monitoring()
            .tasks
            .iter()
            .filter(|task| eligible(*task))
            .collect::<Vec<_>>();
        tasks.sort_by_key(|task| task.id);
        self.rank_tasks(&tasks, subset)
    }

    pub fn rank_tasks(&self, tasks: &[&Task], subset: &ParameterSubset) -> Ranking {
        let mut rows = tasks
            .iter()
            .map(|task| {
                let openness = self.aggregator.openness(task, subset);
                let openness_initial = self.aggregator.openness_initial(task, subset);
                RankedTask {
                    task: task.id,
                    organization: task.organization,
                    openness,
                    openness_initial,
                    delta: openness.zip(openness_initial).map(|(now, then)| now - then),
                    place: None,
                }
            })
            .collect::<Vec<_>>();

        // Stable: equal openness keeps input order; undefined sorts last.
        rows.sort_by(|a, b| match (a.openness, b.openness) {
            (Some(a), Some(b)) => b.total_cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        assign_places(&mut rows);

        let statistics = statistics(&rows);
        debug!(
            ranked = statistics.ranked,
            listed = rows.len(),
            "ranked cycle tasks"
        );
        Ranking { rows, statistics }
    }
}

fn assign_places(rows: &mut [RankedTask]) {
    let mut place = 0u32;
    let mut previous: Option<f64> = None;
    for row in rows.iter_mut() {
        let Some(openness) = row.openness else {
            continue;
        };
        if previous != Some(openness) {
            place += 1;
            previous = Some(openness);
        }
        row.place = Some(place);
    }
}

fn statistics(rows: &[RankedTask]) -> CycleStatistics {
    let ranked = rows.iter().filter(|row| row.place.is_some()).collect::<Vec<_>>();
    CycleStatistics {
        ranked: ranked.len(),
        average_openness: mean(ranked.iter().filter_map(|row| row.openness)),
        average_openness_initial: mean(ranked.iter().filter_map(|row| row.openness_initial)),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
