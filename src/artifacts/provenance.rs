//! Provenance database queries.

use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};

use super::ArtifactError;

/// Database file inside the provenance directory.
pub const PROVENANCE_DB: &str = "provenance.sqlite3";

const QUERY: &str = "SELECT description_name, the_value FROM provenance_view WHERE description_name LIKE ?1";

/// Read-only handle on a run's provenance database.
#[derive(Debug)]
pub struct ProvenanceStore {
    path: PathBuf,
    conn: Connection,
}

impl ProvenanceStore {
    /// Open `provenance.sqlite3` inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, ArtifactError> {
        let path = dir.join(PROVENANCE_DB);
        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|source| {
            ArtifactError::Sqlite {
                path: path.clone(),
                source,
            }
        })?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One `"<description>: <value>\n"` line per item whose description matches the `LIKE` pattern.
    pub fn query(&self, pattern: &str) -> Result<String, ArtifactError> {
        let sqlite_err = |source| ArtifactError::Sqlite {
            path: self.path.clone(),
            source,
        };
        let mut stmt = self.conn.prepare(QUERY).map_err(sqlite_err)?;
        let rows = stmt
            .query_map([pattern], |row| {
                let description: String = row.get(0)?;
                let value: Value = row.get(1)?;
                Ok(format!("{description}: {}\n", render(value)))
            })
            .map_err(sqlite_err)?;

        let mut out = String::new();
        for row in rows {
            out.push_str(&row.map_err(sqlite_err)?);
        }
        Ok(out)
    }

    /// Items reported by the buffer extractor.
    pub fn buffer_extractor_run_time(&self) -> Result<String, ArtifactError> {
        self.query("%BufferExtractor")
    }
}

fn render(value: Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format!("{f:?}"),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join(PROVENANCE_DB)).unwrap();
        conn.execute_batch(
            "CREATE TABLE items (description_name TEXT, the_value);
             CREATE VIEW provenance_view AS SELECT description_name, the_value FROM items;
             INSERT INTO items VALUES ('run_time_of_BufferExtractor', 1.5);
             INSERT INTO items VALUES ('run_time_of_DataSpeedUpBufferExtractor', 2);
             INSERT INTO items VALUES ('router_dropped_packets', 0);
             INSERT INTO items VALUES ('note', 'ok');",
        )
        .unwrap();
        dir
    }

    #[test]
    fn like_query_renders_lines() {
        let dir = fixture();
        let store = ProvenanceStore::open(dir.path()).unwrap();
        assert_eq!(
            store.buffer_extractor_run_time().unwrap(),
            "run_time_of_BufferExtractor: 1.5\nrun_time_of_DataSpeedUpBufferExtractor: 2\n"
        );
        assert_eq!(store.query("note").unwrap(), "note: ok\n");
        assert_eq!(store.query("nothing%").unwrap(), "");
    }

    #[test]
    fn missing_database_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProvenanceStore::open(dir.path()),
            Err(ArtifactError::Sqlite { .. })
        ));
    }
}
