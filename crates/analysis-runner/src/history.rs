//! Listing of persisted analysis results.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One persisted analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    /// The `dates` value of the stored summary, `null` if absent
    pub dates: serde_json::Value,
    /// Seconds since the Unix epoch
    pub created: f64,
    pub url: String,
}

/// `analysis_*.json` files in `output_dir`, newest first.
///
/// A missing directory yields an empty list; files that cannot be read or
/// parsed are skipped.
pub fn list_history(output_dir: &Path, url_prefix: &str) -> std::io::Result<Vec<HistoryEntry>> {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries.flatten() {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.starts_with("analysis_") || !filename.ends_with(".json") {
            continue;
        }
        match read_entry(&entry.path(), &filename, url_prefix) {
            Some(item) => files.push(item),
            None => debug!(file = %filename, "Skipping unreadable result file"),
        }
    }

    files.sort_by(|a, b| b.created.total_cmp(&a.created));
    Ok(files)
}

fn read_entry(path: &Path, filename: &str, url_prefix: &str) -> Option<HistoryEntry> {
    let content = std::fs::read_to_string(path).ok()?;
    let data: serde_json::Value = serde_json::from_str(&content).ok()?;
    let metadata = std::fs::metadata(path).ok()?;
    let created = metadata
        .created()
        .or_else(|_| metadata.modified())
        .map(epoch_seconds)
        .unwrap_or(0.0);

    Some(HistoryEntry {
        filename: filename.to_string(),
        dates: data.get("dates").cloned().unwrap_or(serde_json::Value::Null),
        created,
        url: format!("{}/{}", url_prefix.trim_end_matches('/'), filename),
    })
}

fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(list_history(&missing, "/api/files").unwrap().is_empty());
    }

    #[test]
    fn test_filters_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("analysis_a.json"),
            r#"{"dates": ["2025-09-01", "2025-10-02"]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("analysis_broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("prediction_b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("weather_map.png"), [0u8; 4]).unwrap();

        let files = list_history(dir.path(), "/api/files/").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "analysis_a.json");
        assert_eq!(files[0].url, "/api/files/analysis_a.json");
        assert_eq!(files[0].dates[0], "2025-09-01");
        assert!(files[0].created > 0.0);
    }
}
