//! Write-once persistence for assembled assessment results.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use lorehawk_schema::AssessmentResult;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS assessments (
    id         TEXT PRIMARY KEY,
    subject    TEXT NOT NULL,
    language   TEXT NOT NULL,
    score      INTEGER NOT NULL,
    payload    TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_assessments_subject ON assessments(subject);
";

/// Result store backed by SQLite. Results are written once after assembly
/// and never updated; a second insert with the same id is an error.
pub struct ResultStore {
    conn: Mutex<Connection>,
}

impl ResultStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open result store at {}", path.display()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub async fn insert(&self, result: &AssessmentResult) -> Result<()> {
        let payload = serde_json::to_string(result)?;
        let conn = self.conn.lock().expect("result store lock poisoned");
        let outcome = conn.execute(
            "INSERT INTO assessments (id, subject, language, score, payload, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                result.id.to_string(),
                result.subject,
                result.language.as_str(),
                result.score,
                payload,
                result.created_at.to_rfc3339(),
            ],
        );
        match outcome {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(anyhow!("assessment {} already persisted", result.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn fetch(&self, id: Uuid) -> Result<Option<AssessmentResult>> {
        let conn = self.conn.lock().expect("result store lock poisoned");
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM assessments WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Most recent results for a subject, newest first.
    pub async fn recent_for_subject(
        &self,
        subject: &str,
        limit: usize,
    ) -> Result<Vec<AssessmentResult>> {
        let conn = self.conn.lock().expect("result store lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT payload FROM assessments WHERE subject = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![subject, limit as i64], |row| {
            row.get::<_, String>(0)
        })?;
        let mut results = Vec::new();
        for payload in rows {
            results.push(serde_json::from_str(&payload?)?);
        }
        Ok(results)
    }
}
