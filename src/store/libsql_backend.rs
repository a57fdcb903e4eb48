//! libSQL backend — async `Store` trait implementation.
//!
//! Supports local file and in-memory databases. Drafts are stored as a JSON
//! document per participant; sessions and builds as flat columns.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::convo::model::{BuildRecord, DraftPatch, ProfileDraft, UserSession};
use crate::convo::step::ConversationStep;
use crate::error::StoreError;
use crate::store::traits::Store;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sessions (
        participant_id TEXT PRIMARY KEY,
        step TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS drafts (
        participant_id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS builds (
        build_id TEXT PRIMARY KEY,
        participant_id TEXT NOT NULL,
        status TEXT NOT NULL,
        html_url TEXT NOT NULL,
        pdf_url TEXT NOT NULL,
        created_at TEXT NOT NULL,
        completed_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS message_log (
        message_id TEXT PRIMARY KEY,
        participant_id TEXT NOT NULL,
        body TEXT NOT NULL,
        received_at TEXT NOT NULL
    )",
];

/// libSQL store backend.
///
/// Holds a single connection reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StoreError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Unavailable(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        for stmt in SCHEMA {
            self.conn
                .execute(stmt, ())
                .await
                .map_err(|e| StoreError::Query(format!("Schema init failed: {e}")))?;
        }
        Ok(())
    }
}

/// Parse an RFC 3339 datetime string (our canonical write format).
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl Store for LibSqlStore {
    async fn get_session(&self, participant: &str) -> Result<Option<UserSession>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT step, created_at, updated_at FROM sessions WHERE participant_id = ?1",
                params![participant],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        let step_str: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
        let created_str: String = row.get(1).map_err(|e| StoreError::Query(e.to_string()))?;
        let updated_str: String = row.get(2).map_err(|e| StoreError::Query(e.to_string()))?;

        let step: ConversationStep = step_str
            .parse()
            .map_err(|e: String| StoreError::Serialization(e))?;

        Ok(Some(UserSession {
            step,
            created_at: parse_datetime(&created_str),
            updated_at: parse_datetime(&updated_str),
        }))
    }

    async fn put_session(
        &self,
        participant: &str,
        session: &UserSession,
    ) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO sessions (participant_id, step, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(participant_id) DO UPDATE SET
                     step = excluded.step,
                     updated_at = excluded.updated_at",
                params![
                    participant,
                    session.step.to_string(),
                    session.created_at.to_rfc3339(),
                    session.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn delete_session(&self, participant: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM sessions WHERE participant_id = ?1",
                params![participant],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn get_draft(&self, participant: &str) -> Result<Option<ProfileDraft>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT data FROM drafts WHERE participant_id = ?1",
                params![participant],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
        else {
            return Ok(None);
        };

        let data: String = row.get(0).map_err(|e| StoreError::Query(e.to_string()))?;
        let draft: ProfileDraft =
            serde_json::from_str(&data).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(draft))
    }

    async fn upsert_draft(
        &self,
        participant: &str,
        patch: &DraftPatch,
    ) -> Result<(), StoreError> {
        // Read-modify-write; the router serializes per participant.
        let mut draft = self.get_draft(participant).await?.unwrap_or_default();
        patch.apply_to(&mut draft);

        let data = serde_json::to_string(&draft)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let updated_at = draft
            .updated_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339();

        self.conn
            .execute(
                "INSERT INTO drafts (participant_id, data, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(participant_id) DO UPDATE SET
                     data = excluded.data,
                     updated_at = excluded.updated_at",
                params![participant, data, updated_at],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn delete_draft(&self, participant: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "DELETE FROM drafts WHERE participant_id = ?1",
                params![participant],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn insert_build(&self, record: &BuildRecord) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO builds
                     (build_id, participant_id, status, html_url, pdf_url, created_at, completed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.build_id.as_str(),
                    record.participant_id.as_str(),
                    record.status.to_string(),
                    record.html_url.as_str(),
                    record.pdf_url.as_str(),
                    record.created_at.to_rfc3339(),
                    record.completed_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    async fn record_message(
        &self,
        participant: &str,
        message_id: &str,
        body: &str,
    ) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO message_log
                     (message_id, participant_id, body, received_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![message_id, participant, body, Utc::now().to_rfc3339()],
            )
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(changed == 1)
    }
}
