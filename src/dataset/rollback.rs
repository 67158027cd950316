use crate::error::Result;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct RollbackManifest {
    timestamp: String,
    openness_version: String,
    dataset: String,
    sha256: String,
    backup: String,
}

/// Copies the current dataset aside and writes a manifest naming it.
pub fn record(root: &Path, dataset: &Path) -> Result<PathBuf> {
    let timestamp = Utc::now();
    let file_stamp = timestamp.format("%Y%m%dT%H%M%S%.fZ").to_string();
    let rollback_dir = root.join(".openness/rollback");
    fs::create_dir_all(&rollback_dir)?;

    let bytes = fs::read(dataset)?;
    let backup_path = rollback_dir.join(format!("{file_stamp}.dataset.json"));
    fs::write(&backup_path, &bytes)?;

    let manifest = RollbackManifest {
        timestamp: timestamp.to_rfc3339(),
        openness_version: env!("CARGO_PKG_VERSION").to_string(),
        dataset: dataset.display().to_string(),
        sha256: sha256_hex(&bytes),
        backup: backup_path.display().to_string(),
    };

    let out_path = rollback_dir.join(format!("{file_stamp}.json"));
    fs::write(&out_path, serde_json::to_string_pretty(&manifest)?)?;
    Ok(out_path)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn manifest_records_digest_of_previous_contents() {
        let dir = TempDir::new().expect("temp dir should be created");
        let dataset = dir.path().join("cycle.json");
        fs::write(&dataset, "{}").expect("dataset should write");

        let manifest_path = record(dir.path(), &dataset).expect("record should succeed");
        let manifest = fs::read_to_string(manifest_path).expect("manifest should read");
        assert!(manifest.contains(&sha256_hex(b"{}")));
        assert!(manifest.contains("dataset.json"));
    }
}
