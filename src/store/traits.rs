//! Backend-agnostic `Store` trait — the router's only view of persistence.

use async_trait::async_trait;

use crate::convo::model::{BuildRecord, DraftPatch, ProfileDraft, UserSession};
use crate::error::StoreError;

/// Keyed document store for per-participant conversation data.
///
/// Sessions and drafts live in separate namespaces with independent
/// lifecycles: a session reset may leave the draft intact. The router
/// serializes access per participant, so implementations do not need
/// atomic read-modify-write across calls.
#[async_trait]
pub trait Store: Send + Sync {
    // ── Sessions ────────────────────────────────────────────────────

    /// Load a participant's dialogue state. `None` means "not yet started".
    async fn get_session(&self, participant: &str) -> Result<Option<UserSession>, StoreError>;

    /// Write a participant's dialogue state (insert or full replace).
    async fn put_session(
        &self,
        participant: &str,
        session: &UserSession,
    ) -> Result<(), StoreError>;

    /// Delete a participant's dialogue state. Deleting a missing session
    /// is not an error.
    async fn delete_session(&self, participant: &str) -> Result<(), StoreError>;

    // ── Drafts ──────────────────────────────────────────────────────

    /// Load a participant's profile draft.
    async fn get_draft(&self, participant: &str) -> Result<Option<ProfileDraft>, StoreError>;

    /// Merge a patch into the stored draft, creating it if absent.
    /// Always refreshes the draft's `updated_at`.
    async fn upsert_draft(&self, participant: &str, patch: &DraftPatch)
        -> Result<(), StoreError>;

    /// Delete a participant's profile draft.
    async fn delete_draft(&self, participant: &str) -> Result<(), StoreError>;

    // ── Builds ──────────────────────────────────────────────────────

    /// Insert a write-once build record.
    async fn insert_build(&self, record: &BuildRecord) -> Result<(), StoreError>;

    // ── Message log ─────────────────────────────────────────────────

    /// Record an inbound message by its transport id. Returns `false` if
    /// the id was already recorded (duplicate webhook delivery).
    async fn record_message(
        &self,
        participant: &str,
        message_id: &str,
        body: &str,
    ) -> Result<bool, StoreError>;
}
