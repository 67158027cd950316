use crate::error::{OpennessError, Result};
use crate::types::model::{
    Parameter, Phase, Revision, Score, ScoreKey, ScoreValues, TaskId,
};
use crate::validation::{self, ValidationPolicy};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub trait ScoreStore {
    fn score(&self, key: &ScoreKey) -> Option<&Score>;

    /// Applies every row in `writes` or none of them.
    fn commit(&mut self, writes: Vec<Score>) -> Result<()>;
}

/// In-memory store keyed by (task, parameter, revision).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: BTreeMap<ScoreKey, Score>,
}

impl MemoryStore {
    pub fn from_scores(scores: impl IntoIterator<Item = Score>) -> Result<Self> {
        let mut rows = BTreeMap::new();
        for score in scores {
            let key = score.key();
            if rows.insert(key, score).is_some() {
                return Err(OpennessError::DatasetInvalid(format!(
                    "duplicate score for task {} parameter {} ({:?})",
                    key.task, key.parameter, key.revision
                )));
            }
        }
        Ok(Self { rows })
    }

    pub fn into_scores(self) -> Vec<Score> {
        self.rows.into_values().collect()
    }
}

impl ScoreStore for MemoryStore {
    fn score(&self, key: &ScoreKey) -> Option<&Score> {
        self.rows.get(key)
    }

    fn commit(&mut self, writes: Vec<Score>) -> Result<()> {
        // Check the whole batch before touching any row.
        for write in &writes {
            let key = write.key();
            if key.revision == Revision::Interim && self.rows.contains_key(&key) {
                return Err(OpennessError::DatasetInvalid(format!(
                    "interim snapshot already exists for task {} parameter {}",
                    key.task, key.parameter
                )));
            }
        }
        for write in writes {
            self.rows.insert(write.key(), write);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritePolicy {
    pub phase: Phase,
    pub validation: ValidationPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub final_row: Score,
    pub interim_row: Option<Score>,
}

pub struct RevisionManager<'s, S: ScoreStore> {
    store: &'s mut S,
}

impl<'s, S: ScoreStore> RevisionManager<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    pub fn on_score_write(
        &mut self,
        task: TaskId,
        parameter: &Parameter,
        values: ScoreValues,
        policy: &WritePolicy,
    ) -> Result<WriteOutcome> {
        self.on_score_write_at(task, parameter, values, policy, Utc::now())
    }

    pub fn on_score_write_at(
        &mut self,
        task: TaskId,
        parameter: &Parameter,
        mut values: ScoreValues,
        policy: &WritePolicy,
        now: DateTime<Utc>,
    ) -> Result<WriteOutcome> {
        validation::normalize(&mut values, parameter);

        let final_key = ScoreKey::new(task, parameter.code, Revision::Final);
        let interim_key = ScoreKey::new(task, parameter.code, Revision::Interim);
        let existing = self.store.score(&final_key).cloned();

        // Stored rows may predate normalization; compare like with like.
        let previous = existing.as_ref().map(|score| {
            let mut previous = score.values.clone();
            validation::normalize(&mut previous, parameter);
            previous
        });
        let issues = validation::validate_score(
            &values,
            previous.as_ref(),
            parameter,
            &policy.validation,
        );
        if !issues.is_empty() {
            warn!(task, parameter = parameter.code, ?issues, "score write rejected");
            return Err(OpennessError::Validation(issues));
        }

        let interim_row = match &existing {
            Some(current)
                if policy.phase.is_interaction_or_later()
                    && self.store.score(&interim_key).is_none() =>
            {
                Some(Score {
                    revision: Revision::Interim,
                    ..current.clone()
                })
            }
            _ => None,
        };

        let final_row = match existing {
            Some(current) => Score {
                values,
                last_modified: now,
                ..current
            },
            None => Score::new(task, parameter.code, values, now),
        };

        let mut writes = Vec::with_capacity(2);
        if let Some(snapshot) = &interim_row {
            writes.push(snapshot.clone());
        }
        writes.push(final_row.clone());
        self.store.commit(writes)?;

        if interim_row.is_some() {
            info!(
                task,
                parameter = parameter.code,
                phase = ?policy.phase,
                "forked interim snapshot before first interaction edit"
            );
        } else {
            debug!(task, parameter = parameter.code, "score updated in place");
        }

        Ok(WriteOutcome {
            final_row,
            interim_row,
        })
    }
}

#[cfg(test)]
impl MemoryStore {
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
