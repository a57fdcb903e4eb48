//! Session and profile data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::ConversationStep;

/// An inbound message, normalized from the transport envelope.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Opaque sender address, e.g. a WhatsApp phone id.
    pub sender: String,
    pub text: String,
    /// Transport message id, used to deduplicate webhook retries.
    pub message_id: Option<String>,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            message_id: None,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }
}

/// Persisted dialogue state — exactly one per participant.
///
/// Absence means the participant has not started yet; a reset deletes the
/// row and the next message re-creates it from scratch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub step: ConversationStep,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSession {
    /// A fresh session at the initial collection step.
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            step: ConversationStep::CollectName,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `step`, refreshing `updated_at`.
    pub fn advance_to(&mut self, step: ConversationStep) {
        self.step = step;
        self.updated_at = Utc::now();
    }
}

/// A single portfolio project entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<i64>,
}

impl Project {
    /// A manually-entered project (no source metadata).
    pub fn manual(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: None,
            language: None,
            stars: None,
        }
    }
}

/// The accumulating profile draft, persisted independently of the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A partial draft update. Fields set here overwrite the stored draft
/// field-by-field; unset fields are left alone. `replace_projects` swaps the
/// whole project list (GitHub import); `append_project` adds one entry
/// (manual entry).
#[derive(Debug, Clone, Default)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub github_username: Option<String>,
    pub replace_projects: Option<Vec<Project>>,
    pub append_project: Option<Project>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.skills.is_none()
            && self.bio.is_none()
            && self.github_username.is_none()
            && self.replace_projects.is_none()
            && self.append_project.is_none()
    }

    /// Merge this patch into `draft`, refreshing its `updated_at`.
    pub fn apply_to(&self, draft: &mut ProfileDraft) {
        if let Some(ref name) = self.name {
            draft.name = Some(name.clone());
        }
        if let Some(ref role) = self.role {
            draft.role = Some(role.clone());
        }
        if let Some(ref skills) = self.skills {
            draft.skills = skills.clone();
        }
        if let Some(ref bio) = self.bio {
            draft.bio = Some(bio.clone());
        }
        if let Some(ref username) = self.github_username {
            draft.github_username = Some(username.clone());
        }
        if let Some(ref projects) = self.replace_projects {
            draft.projects = projects.clone();
        }
        if let Some(ref project) = self.append_project {
            draft.projects.push(project.clone());
        }
        draft.updated_at = Some(Utc::now());
    }
}

/// Build status recorded alongside published artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Completed,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Write-once record of a successful portfolio build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build_id: String,
    pub participant_id: String,
    pub status: BuildStatus,
    pub html_url: String,
    pub pdf_url: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl BuildRecord {
    /// A completed build record with a fresh id.
    pub fn completed(participant_id: &str, html_url: &str, pdf_url: &str) -> Self {
        let now = Utc::now();
        Self {
            build_id: format!("build_{}", uuid::Uuid::new_v4()),
            participant_id: participant_id.to_string(),
            status: BuildStatus::Completed,
            html_url: html_url.to_string(),
            pdf_url: pdf_url.to_string(),
            created_at: now,
            completed_at: now,
        }
    }
}
