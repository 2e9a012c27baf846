use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{AttendanceRecord, Class, Notice, ScheduleEntry, Student, User};

/// The whole-dataset interchange document. `users`, `classes` and `students`
/// must be present as arrays; the other three collections default to empty,
/// matching documents exported by the predecessor app.
#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub users: Vec<User>,
    pub classes: Vec<Class>,
    pub students: Vec<Student>,
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub attendance: Vec<AttendanceRecord>,
}

impl SnapshotDocument {
    pub fn counts(&self) -> serde_json::Value {
        serde_json::json!({
            "users": self.users.len(),
            "classes": self.classes.len(),
            "students": self.students.len(),
            "notices": self.notices.len(),
            "schedule": self.schedule.len(),
            "attendance": self.attendance.len(),
        })
    }
}

/// Strictly typed decode: any missing mandatory key or malformed entity
/// fails the whole document, so an import either applies fully or not at all.
pub fn parse(text: &str) -> Result<SnapshotDocument, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn file_name(date: NaiveDate) -> String {
    format!("sapi_backup_{}.json", date.format("%Y-%m-%d"))
}

/// Writes the pretty-printed snapshot under `out_dir`, named after the
/// current UTC date, and returns the path written.
pub fn write_snapshot(out_dir: &Path, doc: &SnapshotDocument) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let path = out_dir.join(file_name(chrono::Utc::now().date_naive()));
    let text = serde_json::to_string_pretty(doc).context("failed to serialize snapshot")?;
    std::fs::write(&path, text)
        .with_context(|| format!("failed to write snapshot {}", path.to_string_lossy()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_requires_the_three_mandatory_arrays() {
        let missing_students = json!({ "users": [], "classes": [] }).to_string();
        assert!(parse(&missing_students).is_err());

        let wrong_type = json!({ "users": {}, "classes": [], "students": [] }).to_string();
        assert!(parse(&wrong_type).is_err());

        assert!(parse("not json at all").is_err());
    }

    #[test]
    fn optional_collections_default_to_empty() {
        let doc = parse(
            &json!({
                "users": [{ "id": 1, "name": "Administrador", "login": "admin",
                            "role": "Admin Master", "password": "senha123" }],
                "classes": [],
                "students": []
            })
            .to_string(),
        )
        .expect("parse");
        assert_eq!(doc.users.len(), 1);
        assert!(doc.notices.is_empty());
        assert!(doc.schedule.is_empty());
        assert!(doc.attendance.is_empty());
        assert_eq!(doc.counts()["users"], 1);
    }

    #[test]
    fn malformed_entities_fail_the_whole_document() {
        // a student without its required dob
        let doc = json!({
            "users": [],
            "classes": [],
            "students": [{ "id": 1, "name": "Ana", "classId": 1,
                           "shift": "Manhã", "status": "active", "guardians": [] }]
        })
        .to_string();
        assert!(parse(&doc).is_err());
    }

    #[test]
    fn file_name_embeds_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).expect("date");
        assert_eq!(file_name(date), "sapi_backup_2025-03-10.json");
    }

    #[test]
    fn write_snapshot_produces_a_readable_document() {
        let dir = std::env::temp_dir().join(format!(
            "sapid-snapshot-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let doc = parse(
            &json!({ "users": [], "classes": [], "students": [] }).to_string(),
        )
        .expect("parse");
        let path = write_snapshot(&dir, &doc).expect("write");
        assert!(path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("sapi_backup_") && n.ends_with(".json"))
            .unwrap_or(false));

        let text = std::fs::read_to_string(&path).expect("read back");
        let reparsed = parse(&text).expect("reparse");
        assert!(reparsed.users.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
