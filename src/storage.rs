use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

// Slot documents are opaque JSON strings; the store owns their shape.
pub trait StorageBackend {
    fn load(&self, slot: &str) -> anyhow::Result<Option<String>>;
    fn save(&mut self, slot: &str, doc: &str) -> anyhow::Result<()>;
    // All slots land or none do.
    fn save_many(&mut self, docs: &[(&str, String)]) -> anyhow::Result<()>;
}

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let db_path = workspace.join("sapi.sqlite3");
        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS slots(
                slot TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(SqliteBackend { conn })
    }
}

impl StorageBackend for SqliteBackend {
    fn load(&self, slot: &str) -> anyhow::Result<Option<String>> {
        let doc = self
            .conn
            .query_row("SELECT doc FROM slots WHERE slot = ?", [slot], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(doc)
    }

    fn save(&mut self, slot: &str, doc: &str) -> anyhow::Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO slots(slot, doc, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET doc = excluded.doc, updated_at = excluded.updated_at",
            (slot, doc, now.as_str()),
        )?;
        Ok(())
    }

    fn save_many(&mut self, docs: &[(&str, String)]) -> anyhow::Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        for (slot, doc) in docs {
            tx.execute(
                "INSERT INTO slots(slot, doc, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(slot) DO UPDATE SET doc = excluded.doc, updated_at = excluded.updated_at",
                (*slot, doc.as_str(), now.as_str()),
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
pub struct MemoryBackend {
    slots: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            slots: std::collections::HashMap::new(),
        }
    }
}

#[cfg(test)]
impl StorageBackend for MemoryBackend {
    fn load(&self, slot: &str) -> anyhow::Result<Option<String>> {
        Ok(self.slots.get(slot).cloned())
    }

    fn save(&mut self, slot: &str, doc: &str) -> anyhow::Result<()> {
        self.slots.insert(slot.to_string(), doc.to_string());
        Ok(())
    }

    fn save_many(&mut self, docs: &[(&str, String)]) -> anyhow::Result<()> {
        for (slot, doc) in docs {
            self.slots.insert((*slot).to_string(), doc.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_workspace(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sapid-storage-{}-{}-{:?}",
            tag,
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn sqlite_roundtrip_and_overwrite() {
        let dir = temp_workspace("roundtrip");
        let mut backend = SqliteBackend::open(&dir).expect("open");
        assert!(backend.load("sapi_users").expect("load").is_none());

        backend.save("sapi_users", "[1]").expect("save");
        assert_eq!(backend.load("sapi_users").expect("load").as_deref(), Some("[1]"));

        backend.save("sapi_users", "[1,2]").expect("save");
        assert_eq!(
            backend.load("sapi_users").expect("load").as_deref(),
            Some("[1,2]")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sqlite_save_many_writes_every_slot() {
        let dir = temp_workspace("many");
        let mut backend = SqliteBackend::open(&dir).expect("open");
        backend
            .save_many(&[
                ("sapi_users", "[]".to_string()),
                ("sapi_classes", "[{}]".to_string()),
            ])
            .expect("save_many");
        assert_eq!(backend.load("sapi_users").expect("load").as_deref(), Some("[]"));
        assert_eq!(
            backend.load("sapi_classes").expect("load").as_deref(),
            Some("[{}]")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn sqlite_state_survives_reopen() {
        let dir = temp_workspace("reopen");
        {
            let mut backend = SqliteBackend::open(&dir).expect("open");
            backend.save("sapi_notices", "[7]").expect("save");
        }
        let backend = SqliteBackend::open(&dir).expect("reopen");
        assert_eq!(
            backend.load("sapi_notices").expect("load").as_deref(),
            Some("[7]")
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
