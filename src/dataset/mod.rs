pub mod rollback;

use crate::error::{OpennessError, Result};
use crate::types::model::{Monitoring, Revision, ScoreKey};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub fn load(path: &Path) -> Result<Monitoring> {
    if !path.exists() {
        return Err(OpennessError::DatasetNotFound(path.display().to_string()));
    }
    let raw = fs::read_to_string(path)?;
    let monitoring: Monitoring = serde_json::from_str(&raw)?;
    check_integrity(&monitoring)?;
    debug!(
        path = %path.display(),
        tasks = monitoring.tasks.len(),
        parameters = monitoring.parameters.len(),
        scores = monitoring.scores.len(),
        "loaded dataset"
    );
    Ok(monitoring)
}

/// Directory that holds the dataset's `openness.toml` and `.openness/` state.
pub fn root_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Writes the dataset through a sibling temporary file and a rename, after
/// recording a rollback manifest for the previous contents.
pub fn save(path: &Path, monitoring: &Monitoring) -> Result<Option<PathBuf>> {
    check_integrity(monitoring)?;
    let manifest = if path.exists() {
        Some(rollback::record(&root_of(path), path)?)
    } else {
        None
    };

    let json = serde_json::to_string_pretty(monitoring)?;
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path)?;
    Ok(manifest)
}

pub fn check_integrity(monitoring: &Monitoring) -> Result<()> {
    let mut codes = BTreeSet::new();
    for parameter in &monitoring.parameters {
        if !codes.insert(parameter.code) {
            return Err(invalid(format!(
                "duplicate parameter code {}",
                parameter.code
            )));
        }
    }

    let organizations = monitoring
        .organizations
        .iter()
        .map(|organization| organization.id)
        .collect::<HashSet<_>>();
    let mut task_ids = HashSet::new();
    for task in &monitoring.tasks {
        if !task_ids.insert(task.id) {
            return Err(invalid(format!("duplicate task id {}", task.id)));
        }
        if !organizations.is_empty() && !organizations.contains(&task.organization) {
            return Err(invalid(format!(
                "task {} references unknown organization {}",
                task.id, task.organization
            )));
        }
    }

    let mut keys = HashSet::new();
    for score in &monitoring.scores {
        if !task_ids.contains(&score.task) {
            return Err(invalid(format!("score references unknown task {}", score.task)));
        }
        if !codes.contains(&score.parameter) {
            return Err(invalid(format!(
                "score references unknown parameter {}",
                score.parameter
            )));
        }
        if !keys.insert(score.key()) {
            return Err(invalid(format!(
                "duplicate {:?} score for task {} parameter {}",
                score.revision, score.task, score.parameter
            )));
        }
    }
    for key in &keys {
        if key.revision == Revision::Interim
            && !keys.contains(&ScoreKey::new(key.task, key.parameter, Revision::Final))
        {
            return Err(invalid(format!(
                "interim score without final score for task {} parameter {}",
                key.task, key.parameter
            )));
        }
    }

    let questions = monitoring
        .questions
        .iter()
        .map(|question| question.id)
        .collect::<HashSet<_>>();
    for answer in &monitoring.answers {
        if !task_ids.contains(&answer.task) || !questions.contains(&answer.question) {
            return Err(invalid(format!(
                "answer references unknown task {} or question {}",
                answer.task, answer.question
            )));
        }
    }

    Ok(())
}

fn invalid(message: String) -> OpennessError {
    OpennessError::DatasetInvalid(message)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) const SAMPLE: &str = r#"{
  "name": "regional-2024",
  "phase": "rate",
  "formula": 8,
  "parameters": [
    {"code": 1, "name": "budget", "weight": 2, "npa": true},
    {"code": 2, "name": "contacts", "weight": 1,
     "relevance": {"document": false, "image": false}, "excluded": [20]}
  ],
  "questions": [{"id": 1, "text": "site address"}],
  "organizations": [{"id": 10, "name": "north"}, {"id": 20, "name": "south"}],
  "tasks": [
    {"id": 100, "organization": 10, "status": "approved"},
    {"id": 200, "organization": 20, "status": "ready"}
  ],
  "scores": [
    {"task": 100, "parameter": 1, "found": true, "complete": 3, "topical": 3,
     "accessible": 3, "hypertext": 1, "document": 1, "image": 1,
     "last_modified": "2024-03-01T08:00:00Z"},
    {"task": 100, "parameter": 2, "found": false, "recommendation": "publish contacts",
     "last_modified": "2024-03-01T08:00:00Z"}
  ],
  "answers": [{"task": 100, "question": 1}]
}"#;

    #[test]
    fn load_reads_sample_dataset() {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("cycle.json");
        fs::write(&path, SAMPLE).expect("dataset should write");

        let monitoring = load(&path).expect("dataset should load");
        assert_eq!(monitoring.tasks.len(), 2);
        assert_eq!(monitoring.scores[0].revision, Revision::Final);
        assert!(monitoring.scores[0].values.found);
        assert!(monitoring.parameters[1].is_excluded_for(20));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().expect("temp dir should be created");
        let result = load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(OpennessError::DatasetNotFound(_))));
    }

    #[test]
    fn unknown_formula_code_fails_to_load() {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("cycle.json");
        fs::write(&path, SAMPLE.replace("\"formula\": 8", "\"formula\": 4"))
            .expect("dataset should write");
        let err = load(&path).expect_err("unknown formula should fail");
        assert!(err.to_string().contains("unknown formula version code: 4"));
    }

    #[test]
    fn integrity_rejects_orphan_interim_and_unknown_references() {
        let mut monitoring: Monitoring =
            serde_json::from_str(SAMPLE).expect("sample should parse");
        monitoring.scores[0].revision = Revision::Interim;
        assert!(check_integrity(&monitoring).is_err());

        let mut monitoring: Monitoring =
            serde_json::from_str(SAMPLE).expect("sample should parse");
        monitoring.scores[1].parameter = 99;
        assert!(check_integrity(&monitoring).is_err());

        let mut monitoring: Monitoring =
            serde_json::from_str(SAMPLE).expect("sample should parse");
        monitoring.parameters[1].code = 1;
        assert!(check_integrity(&monitoring).is_err());
    }

    #[test]
    fn save_replaces_file_and_records_rollback() {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("cycle.json");
        fs::write(&path, SAMPLE).expect("dataset should write");

        let mut monitoring = load(&path).expect("dataset should load");
        monitoring.no_interaction = true;
        let manifest = save(&path, &monitoring)
            .expect("save should succeed")
            .expect("rollback manifest should be recorded");

        assert!(manifest.starts_with(dir.path().join(".openness/rollback")));
        assert!(!dir.path().join("cycle.json.tmp").exists());
        let reloaded = load(&path).expect("dataset should reload");
        assert!(reloaded.no_interaction);
    }
}
