//! Conversation router — maps (persisted state, inbound text) to the next
//! state, draft updates, and outbound replies.
//!
//! The decision logic lives in the pure [`plan`] function; the
//! [`ConversationRouter`] wraps it with persistence, per-participant
//! serialization, dedup, and the two blocking collaborator calls (project
//! fetch and portfolio build).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use crate::builder::PortfolioBuilder;
use crate::config::ConvoPolicy;
use crate::error::{Error, SendError};
use crate::github::ProjectSource;
use crate::messenger::{Messenger, SendOutcome};
use crate::store::Store;

use super::model::{BuildRecord, DraftPatch, IncomingMessage, ProfileDraft, Project, UserSession};
use super::replies;
use super::step::ConversationStep;

/// A collaborator invocation requested by a transition. Executed only after
/// the transition's state write has been persisted, so a crash mid-call
/// leaves inspectable state rather than silently re-entering the branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FetchProjects { username: String },
    RunBuild,
}

/// Result of the pure transition function.
#[derive(Debug, Default)]
pub struct Transition {
    /// Step to advance the session to, if any.
    pub next_step: Option<ConversationStep>,
    /// Draft fields to persist.
    pub patch: DraftPatch,
    /// Ordered outbound replies.
    pub replies: Vec<String>,
    /// Collaborator call to run after persisting.
    pub action: Option<Action>,
    /// Replace the session with a fresh one at the initial step
    /// (global restart phrase).
    pub restart: bool,
    /// Delete the session (`reset` command).
    pub clear_session: bool,
}

impl Transition {
    fn reply(text: String) -> Self {
        Self {
            replies: vec![text],
            ..Default::default()
        }
    }
}

/// Split a comma-separated skill list: trim each segment, drop empties,
/// preserve order and duplicates.
pub fn parse_skills(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a manual project line: `<title> - <description>`. The description
/// may itself contain the separator and is preserved by rejoining.
pub fn parse_manual_project(text: &str) -> Project {
    let mut parts = text.split(" - ");
    let title = parts.next().map(str::trim).unwrap_or_default();
    let description = parts.collect::<Vec<_>>().join(" - ");
    Project::manual(
        if title.is_empty() { "Untitled" } else { title },
        description.trim(),
    )
}

/// Strip an optional leading case-insensitive `github ` token from a
/// username input.
pub fn strip_github_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.len() > 6 && trimmed.is_char_boundary(6) && trimmed[..6].eq_ignore_ascii_case("github") {
        let rest = &trimmed[6..];
        if rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// The pure transition function: deterministic given the session step, the
/// current draft, and the inbound text. Collaborator results are requested
/// via [`Action`], never read here.
pub fn plan(
    step: ConversationStep,
    draft: &ProfileDraft,
    text: &str,
    policy: &ConvoPolicy,
) -> Transition {
    let trimmed = text.trim();

    // Global restart override, evaluated before per-state dispatch.
    if trimmed.eq_ignore_ascii_case(policy.restart_phrase.trim()) {
        return Transition {
            restart: true,
            replies: vec![replies::welcome()],
            ..Default::default()
        };
    }

    use ConversationStep::*;
    match step {
        CollectName => Transition {
            next_step: Some(CollectRole),
            patch: DraftPatch {
                name: Some(trimmed.to_string()),
                ..Default::default()
            },
            replies: vec![replies::name_saved(trimmed)],
            ..Default::default()
        },

        CollectRole => Transition {
            next_step: Some(CollectSkills),
            patch: DraftPatch {
                role: Some(trimmed.to_string()),
                ..Default::default()
            },
            replies: vec![replies::role_saved(trimmed)],
            ..Default::default()
        },

        CollectSkills => {
            let skills = parse_skills(text);
            Transition {
                next_step: Some(CollectBio),
                replies: vec![replies::skills_saved(&skills)],
                patch: DraftPatch {
                    skills: Some(skills),
                    ..Default::default()
                },
                ..Default::default()
            }
        }

        CollectBio => Transition {
            next_step: Some(CollectProjects),
            patch: DraftPatch {
                bio: Some(trimmed.to_string()),
                ..Default::default()
            },
            replies: vec![replies::projects_menu()],
            ..Default::default()
        },

        CollectProjects => {
            // Fixed priority: import/github, then manual, then generate/build.
            let low = trimmed.to_lowercase();
            if low.contains("import") || low.contains("github") {
                Transition {
                    next_step: Some(AwaitGithubUsername),
                    replies: vec![replies::ask_github_username()],
                    ..Default::default()
                }
            } else if low.contains("manual") {
                Transition {
                    next_step: Some(AddingProject),
                    replies: vec![replies::manual_entry_intro()],
                    ..Default::default()
                }
            } else if low.contains("generate") || low.contains("build") {
                Transition {
                    next_step: Some(Building),
                    replies: vec![replies::generating()],
                    action: Some(Action::RunBuild),
                    ..Default::default()
                }
            } else {
                Transition::reply(replies::menu_reprompt())
            }
        }

        AwaitGithubUsername => {
            let username = strip_github_prefix(text);
            if username.is_empty() {
                Transition::reply(replies::invalid_github_username())
            } else {
                Transition {
                    replies: vec![replies::fetching_repos()],
                    action: Some(Action::FetchProjects {
                        username: username.to_string(),
                    }),
                    ..Default::default()
                }
            }
        }

        AddingProject => {
            if trimmed.eq_ignore_ascii_case("done") {
                Transition {
                    next_step: Some(CollectProjects),
                    replies: vec![replies::manual_entry_done()],
                    ..Default::default()
                }
            } else {
                let project = parse_manual_project(text);
                let title = project.title.clone();
                Transition {
                    patch: DraftPatch {
                        append_project: Some(project),
                        ..Default::default()
                    },
                    replies: vec![replies::project_saved(&title)],
                    ..Default::default()
                }
            }
        }

        Building | Completed => {
            let low = trimmed.to_lowercase();
            if low == "reset" {
                Transition {
                    clear_session: true,
                    replies: vec![replies::reset_done()],
                    ..Default::default()
                }
            } else if low == "profile" {
                Transition::reply(replies::profile_summary(draft))
            } else if step == Building && (low.contains("generate") || low.contains("build")) {
                // Recovery path: a crash mid-build parks the participant in
                // Building; let them re-attempt instead of only reset.
                Transition {
                    replies: vec![replies::generating()],
                    action: Some(Action::RunBuild),
                    ..Default::default()
                }
            } else {
                Transition::reply(replies::already_terminal())
            }
        }
    }
}

/// Per-participant mutual exclusion so concurrent webhook deliveries from
/// the same sender cannot interleave a read-modify-write on the session.
struct SenderLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SenderLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, sender: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(
                map.entry(sender.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}

/// The conversation router. One instance serves all participants.
pub struct ConversationRouter {
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
    projects: Arc<dyn ProjectSource>,
    builder: Arc<dyn PortfolioBuilder>,
    policy: ConvoPolicy,
    locks: SenderLocks,
}

impl ConversationRouter {
    pub fn new(
        store: Arc<dyn Store>,
        messenger: Arc<dyn Messenger>,
        projects: Arc<dyn ProjectSource>,
        builder: Arc<dyn PortfolioBuilder>,
        policy: ConvoPolicy,
    ) -> Self {
        Self {
            store,
            messenger,
            projects,
            builder,
            policy,
            locks: SenderLocks::new(),
        }
    }

    /// Handle one inbound message. Never returns an error: any failure is
    /// logged and answered with a best-effort apology so the webhook entry
    /// point cannot crash.
    pub async fn handle_message(&self, msg: IncomingMessage) {
        let _guard = self.locks.acquire(&msg.sender).await;

        if let Err(e) = self.process(&msg).await {
            error!(sender = %msg.sender, error = %e, "Message processing failed");
            if let Err(send_err) = self.send(&msg.sender, replies::apology()).await {
                warn!(sender = %msg.sender, error = %send_err, "Could not deliver apology");
            }
        }
    }

    async fn process(&self, msg: &IncomingMessage) -> Result<(), Error> {
        // Dedup by transport message id when one is available. Log failures
        // degrade to a warning; dedup is best-effort.
        if let Some(ref id) = msg.message_id {
            match self.store.record_message(&msg.sender, id, &msg.text).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(sender = %msg.sender, message_id = %id, "Duplicate delivery ignored");
                    return Ok(());
                }
                Err(e) => warn!(sender = %msg.sender, error = %e, "Message log write failed"),
            }
        }

        // A read failure here must abort: "store unavailable" is never
        // allowed to masquerade as "new participant".
        let session = self.store.get_session(&msg.sender).await?;

        let Some(mut session) = session else {
            let session = UserSession::start();
            self.store.put_session(&msg.sender, &session).await?;
            self.send(&msg.sender, replies::welcome()).await?;
            return Ok(());
        };

        let draft = self.store.get_draft(&msg.sender).await?.unwrap_or_default();
        let transition = plan(session.step, &draft, &msg.text, &self.policy);

        // Persist state and draft before any collaborator call.
        if transition.restart {
            session = UserSession::start();
            self.store.put_session(&msg.sender, &session).await?;
        } else if transition.clear_session {
            self.store.delete_session(&msg.sender).await?;
            if self.policy.reset_clears_draft {
                self.store.delete_draft(&msg.sender).await?;
            }
        } else if let Some(step) = transition.next_step {
            session.advance_to(step);
            self.store.put_session(&msg.sender, &session).await?;
        }

        if !transition.patch.is_empty() {
            self.store.upsert_draft(&msg.sender, &transition.patch).await?;
        }

        for reply in &transition.replies {
            self.send(&msg.sender, reply.clone()).await?;
        }

        match transition.action {
            None => Ok(()),
            Some(Action::FetchProjects { username }) => {
                self.run_fetch(&msg.sender, &mut session, &username).await
            }
            Some(Action::RunBuild) => self.run_build(&msg.sender, &mut session).await,
        }
    }

    /// Fetch projects for a username and fold the result into state.
    async fn run_fetch(
        &self,
        sender: &str,
        session: &mut UserSession,
        username: &str,
    ) -> Result<(), Error> {
        match self.projects.fetch_projects(username).await {
            Err(e) => {
                // Stay in AwaitGithubUsername; the user can retry.
                warn!(sender, username, error = %e, "Project fetch failed");
                self.send(sender, replies::github_fetch_error()).await?;
                Ok(())
            }
            Ok(projects) if projects.is_empty() => {
                session.advance_to(ConversationStep::CollectProjects);
                self.store.put_session(sender, session).await?;
                self.send(sender, replies::no_repos_found()).await?;
                Ok(())
            }
            Ok(projects) => {
                let patch = DraftPatch {
                    github_username: Some(username.to_string()),
                    replace_projects: Some(projects.clone()),
                    ..Default::default()
                };
                self.store.upsert_draft(sender, &patch).await?;
                session.advance_to(ConversationStep::CollectProjects);
                self.store.put_session(sender, session).await?;
                self.send(sender, replies::repos_imported(&projects)).await?;
                Ok(())
            }
        }
    }

    /// Run the portfolio build. The session is already persisted as
    /// `Building` by the caller.
    async fn run_build(&self, sender: &str, session: &mut UserSession) -> Result<(), Error> {
        match self.builder.build(sender).await {
            Ok(artifacts) => {
                let record =
                    BuildRecord::completed(sender, &artifacts.html_url, &artifacts.pdf_url);
                if let Err(e) = self.store.insert_build(&record).await {
                    // The user still gets their links; the record is bookkeeping.
                    warn!(sender, error = %e, "Failed to store build record");
                }
                session.advance_to(ConversationStep::Completed);
                self.store.put_session(sender, session).await?;
                self.send(
                    sender,
                    replies::build_success(&artifacts.html_url, &artifacts.pdf_url),
                )
                .await?;
                Ok(())
            }
            Err(e) => {
                warn!(sender, error = %e, "Portfolio build failed");
                // Regress to CollectProjects so the user can retry; the
                // draft is untouched.
                session.advance_to(ConversationStep::CollectProjects);
                self.store.put_session(sender, session).await?;
                self.send(sender, replies::build_error()).await?;
                Ok(())
            }
        }
    }

    /// Send a reply. A quota condition is logged and swallowed; any other
    /// send failure propagates.
    async fn send(&self, to: &str, body: String) -> Result<(), SendError> {
        match self.messenger.send_text(to, &body).await? {
            SendOutcome::Sent => Ok(()),
            SendOutcome::QuotaExceeded => {
                warn!(to, "Outbound quota exceeded; reply dropped");
                Ok(())
            }
        }
    }
}
