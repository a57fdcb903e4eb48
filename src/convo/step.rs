//! Conversation state machine — tracks which step the participant is on.

use serde::{Deserialize, Serialize};

/// The steps of the onboarding conversation.
///
/// Progresses linearly through the collection steps:
/// CollectName → CollectRole → CollectSkills → CollectBio → CollectProjects.
/// `CollectProjects` branches into `AwaitGithubUsername` or `AddingProject`
/// (both return to it), or into `Building` → `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStep {
    CollectName,
    CollectRole,
    CollectSkills,
    CollectBio,
    CollectProjects,
    AwaitGithubUsername,
    AddingProject,
    Building,
    Completed,
}

impl ConversationStep {
    /// The next step in the linear collection sequence, if any.
    ///
    /// Branch steps (`AwaitGithubUsername`, `AddingProject`) and the build
    /// steps are routed by the transition function, not by this sequence.
    pub fn next_collection(&self) -> Option<ConversationStep> {
        use ConversationStep::*;
        match self {
            CollectName => Some(CollectRole),
            CollectRole => Some(CollectSkills),
            CollectSkills => Some(CollectBio),
            CollectBio => Some(CollectProjects),
            _ => None,
        }
    }

    /// Whether this step only accepts the terminal-state commands
    /// (`reset` / `profile`).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Building | Self::Completed)
    }
}

impl Default for ConversationStep {
    fn default() -> Self {
        Self::CollectName
    }
}

impl std::fmt::Display for ConversationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CollectName => "collect_name",
            Self::CollectRole => "collect_role",
            Self::CollectSkills => "collect_skills",
            Self::CollectBio => "collect_bio",
            Self::CollectProjects => "collect_projects",
            Self::AwaitGithubUsername => "await_github_username",
            Self::AddingProject => "adding_project",
            Self::Building => "building",
            Self::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ConversationStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "collect_name" => Ok(Self::CollectName),
            "collect_role" => Ok(Self::CollectRole),
            "collect_skills" => Ok(Self::CollectSkills),
            "collect_bio" => Ok(Self::CollectBio),
            "collect_projects" => Ok(Self::CollectProjects),
            "await_github_username" => Ok(Self::AwaitGithubUsername),
            "adding_project" => Ok(Self::AddingProject),
            "building" => Ok(Self::Building),
            "completed" => Ok(Self::Completed),
            other => Err(format!("Unknown conversation step: {other}")),
        }
    }
}
