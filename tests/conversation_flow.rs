//! End-to-end conversation scenarios against an in-memory store and mocked
//! collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use foliobot::builder::{BuildArtifacts, PortfolioBuilder};
use foliobot::config::ConvoPolicy;
use foliobot::convo::model::{BuildRecord, DraftPatch, IncomingMessage, ProfileDraft, Project, UserSession};
use foliobot::convo::{ConversationRouter, ConversationStep};
use foliobot::error::{BuildError, FetchError, SendError, StoreError};
use foliobot::github::ProjectSource;
use foliobot::messenger::{Messenger, SendOutcome};
use foliobot::store::{LibSqlStore, Store};

const SENDER: &str = "whatsapp:+15550001111";

// ── Mocks ───────────────────────────────────────────────────────────────

/// Records every outbound reply.
#[derive(Default)]
struct RecordingMessenger {
    sent: Mutex<Vec<String>>,
    quota_exceeded: AtomicBool,
}

impl RecordingMessenger {
    async fn replies(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    async fn last_reply(&self) -> String {
        self.sent.lock().await.last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(&self, _to: &str, body: &str) -> Result<SendOutcome, SendError> {
        if self.quota_exceeded.load(Ordering::SeqCst) {
            return Ok(SendOutcome::QuotaExceeded);
        }
        self.sent.lock().await.push(body.to_string());
        Ok(SendOutcome::Sent)
    }
}

/// Returns a scripted fetch result.
struct FakeProjects {
    result: Mutex<Result<Vec<Project>, ()>>,
}

impl FakeProjects {
    fn returning(projects: Vec<Project>) -> Self {
        Self {
            result: Mutex::new(Ok(projects)),
        }
    }

    fn failing() -> Self {
        Self {
            result: Mutex::new(Err(())),
        }
    }
}

#[async_trait]
impl ProjectSource for FakeProjects {
    async fn fetch_projects(&self, username: &str) -> Result<Vec<Project>, FetchError> {
        match &*self.result.lock().await {
            Ok(projects) => Ok(projects.clone()),
            Err(()) => Err(FetchError::Upstream {
                username: username.to_string(),
                reason: "boom".to_string(),
            }),
        }
    }
}

/// Succeeds (or fails once) and counts invocations.
#[derive(Default)]
struct FakeBuilder {
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

#[async_trait]
impl PortfolioBuilder for FakeBuilder {
    async fn build(&self, _participant: &str) -> Result<BuildArtifacts, BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(BuildError::Publish("disk full".to_string()));
        }
        Ok(BuildArtifacts {
            html_url: "https://host/p/index.html".to_string(),
            pdf_url: "https://host/p/portfolio.pdf".to_string(),
        })
    }
}

/// Delegating store that counts build-record inserts.
struct CountingStore {
    inner: Arc<LibSqlStore>,
    builds: AtomicUsize,
}

#[async_trait]
impl Store for CountingStore {
    async fn get_session(&self, participant: &str) -> Result<Option<UserSession>, StoreError> {
        self.inner.get_session(participant).await
    }
    async fn put_session(
        &self,
        participant: &str,
        session: &UserSession,
    ) -> Result<(), StoreError> {
        self.inner.put_session(participant, session).await
    }
    async fn delete_session(&self, participant: &str) -> Result<(), StoreError> {
        self.inner.delete_session(participant).await
    }
    async fn get_draft(&self, participant: &str) -> Result<Option<ProfileDraft>, StoreError> {
        self.inner.get_draft(participant).await
    }
    async fn upsert_draft(
        &self,
        participant: &str,
        patch: &DraftPatch,
    ) -> Result<(), StoreError> {
        self.inner.upsert_draft(participant, patch).await
    }
    async fn delete_draft(&self, participant: &str) -> Result<(), StoreError> {
        self.inner.delete_draft(participant).await
    }
    async fn insert_build(&self, record: &BuildRecord) -> Result<(), StoreError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_build(record).await
    }
    async fn record_message(
        &self,
        participant: &str,
        message_id: &str,
        body: &str,
    ) -> Result<bool, StoreError> {
        self.inner.record_message(participant, message_id, body).await
    }
}

// ── Harness ─────────────────────────────────────────────────────────────

struct Harness {
    router: ConversationRouter,
    store: Arc<CountingStore>,
    messenger: Arc<RecordingMessenger>,
    builder: Arc<FakeBuilder>,
}

impl Harness {
    async fn new(projects: FakeProjects, policy: ConvoPolicy) -> Self {
        let store = Arc::new(CountingStore {
            inner: Arc::new(LibSqlStore::new_memory().await.unwrap()),
            builds: AtomicUsize::new(0),
        });
        let messenger = Arc::new(RecordingMessenger::default());
        let builder = Arc::new(FakeBuilder::default());
        let router = ConversationRouter::new(
            Arc::clone(&store) as Arc<dyn Store>,
            Arc::clone(&messenger) as Arc<dyn Messenger>,
            Arc::new(projects),
            Arc::clone(&builder) as Arc<dyn PortfolioBuilder>,
            policy,
        );
        Self {
            router,
            store,
            messenger,
            builder,
        }
    }

    async fn default() -> Self {
        Self::new(FakeProjects::returning(Vec::new()), ConvoPolicy::default()).await
    }

    async fn say(&self, text: &str) {
        self.router
            .handle_message(IncomingMessage::new(SENDER, text))
            .await;
    }

    async fn step(&self) -> Option<ConversationStep> {
        self.store
            .get_session(SENDER)
            .await
            .unwrap()
            .map(|s| s.step)
    }

    async fn draft(&self) -> ProfileDraft {
        self.store.get_draft(SENDER).await.unwrap().unwrap_or_default()
    }

    /// Walk a fresh participant up to the project menu.
    async fn advance_to_project_menu(&self) {
        self.say("hi").await;
        self.say("Ann").await;
        self.say("Engineer").await;
        self.say("Go, Rust").await;
        self.say("Builds backends").await;
        assert_eq!(self.step().await, Some(ConversationStep::CollectProjects));
    }
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[tokio::test]
async fn first_message_always_welcomes_regardless_of_content() {
    for text in ["hello", "generate", "reset", ""] {
        let h = Harness::default().await;
        h.say(text).await;
        assert_eq!(h.step().await, Some(ConversationStep::CollectName));
        assert!(h.messenger.last_reply().await.contains("What's your full name?"));
    }
}

#[tokio::test]
async fn end_to_end_generate_flow() {
    let h = Harness::default().await;
    for text in ["hi", "Ann", "Engineer", "Go, Rust", "Builds backends", "generate"] {
        h.say(text).await;
    }

    assert_eq!(h.step().await, Some(ConversationStep::Completed));
    assert_eq!(h.builder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.builds.load(Ordering::SeqCst), 1);

    let draft = h.draft().await;
    assert_eq!(draft.name.as_deref(), Some("Ann"));
    assert_eq!(draft.role.as_deref(), Some("Engineer"));
    assert_eq!(draft.skills, vec!["Go", "Rust"]);
    assert_eq!(draft.bio.as_deref(), Some("Builds backends"));

    let replies = h.messenger.replies().await;
    // Acknowledgment precedes the success reply
    let generating = replies.iter().position(|r| r.contains("Generating")).unwrap();
    let ready = replies.iter().position(|r| r.contains("ready")).unwrap();
    assert!(generating < ready);
    assert!(replies[ready].contains("https://host/p/index.html"));
    assert!(replies[ready].contains("https://host/p/portfolio.pdf"));
}

#[tokio::test]
async fn duplicate_message_id_does_not_double_advance() {
    let h = Harness::default().await;
    h.say("hi").await;

    let msg = IncomingMessage::new(SENDER, "Ann").with_message_id("wamid.42");
    h.router.handle_message(msg.clone()).await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectRole));
    let replies_before = h.messenger.replies().await.len();

    h.router.handle_message(msg).await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectRole));
    assert_eq!(h.messenger.replies().await.len(), replies_before);
}

#[tokio::test]
async fn manual_project_entry_appends_and_finishes() {
    let h = Harness::default().await;
    h.advance_to_project_menu().await;

    h.say("manual").await;
    assert_eq!(h.step().await, Some(ConversationStep::AddingProject));

    h.say("My Project - A cool app").await;
    assert_eq!(h.step().await, Some(ConversationStep::AddingProject));
    h.say("Untitled Thing").await;

    let draft = h.draft().await;
    assert_eq!(draft.projects.len(), 2);
    assert_eq!(draft.projects[0].title, "My Project");
    assert_eq!(draft.projects[0].description, "A cool app");
    assert_eq!(draft.projects[1].title, "Untitled Thing");
    assert_eq!(draft.projects[1].description, "");

    h.say("done").await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectProjects));
}

#[tokio::test]
async fn github_import_replaces_projects_wholesale() {
    let imported = vec![
        Project::manual("repo-1", "first"),
        Project::manual("repo-2", "second"),
        Project::manual("repo-3", "third"),
        Project::manual("repo-4", "fourth"),
    ];
    let h = Harness::new(FakeProjects::returning(imported), ConvoPolicy::default()).await;
    h.advance_to_project_menu().await;

    // Pre-existing manual project gets replaced by the import
    h.say("manual").await;
    h.say("Old - stale").await;
    h.say("done").await;

    h.say("import github").await;
    assert_eq!(h.step().await, Some(ConversationStep::AwaitGithubUsername));
    h.say("github octocat").await;

    assert_eq!(h.step().await, Some(ConversationStep::CollectProjects));
    let draft = h.draft().await;
    assert_eq!(draft.projects.len(), 4);
    assert_eq!(draft.projects[0].title, "repo-1");
    assert_eq!(draft.github_username.as_deref(), Some("octocat"));

    let reply = h.messenger.last_reply().await;
    assert!(reply.contains("fetched 4 repositories"));
    assert!(reply.contains("... and 1 more"));
}

#[tokio::test]
async fn github_import_empty_result_keeps_draft() {
    let h = Harness::default().await;
    h.advance_to_project_menu().await;
    h.say("manual").await;
    h.say("Keep Me - please").await;
    h.say("done").await;

    h.say("import").await;
    h.say("octocat").await;

    assert_eq!(h.step().await, Some(ConversationStep::CollectProjects));
    let draft = h.draft().await;
    assert_eq!(draft.projects.len(), 1);
    assert_eq!(draft.projects[0].title, "Keep Me");
    assert!(draft.github_username.is_none());
    assert!(h.messenger.last_reply().await.contains("No public repositories"));
}

#[tokio::test]
async fn github_fetch_error_stays_put() {
    let h = Harness::new(FakeProjects::failing(), ConvoPolicy::default()).await;
    h.advance_to_project_menu().await;
    h.say("import github").await;
    h.say("octocat").await;

    assert_eq!(h.step().await, Some(ConversationStep::AwaitGithubUsername));
    assert!(h.messenger.last_reply().await.contains("Error fetching GitHub repos"));
}

#[tokio::test]
async fn build_failure_regresses_to_project_menu() {
    let h = Harness::default().await;
    h.advance_to_project_menu().await;
    h.builder.fail_next.store(true, Ordering::SeqCst);

    h.say("generate").await;

    assert_eq!(h.step().await, Some(ConversationStep::CollectProjects));
    assert_eq!(h.store.builds.load(Ordering::SeqCst), 0);
    assert!(h.messenger.last_reply().await.contains("error generating your portfolio"));

    // Draft survived the failed build
    let draft = h.draft().await;
    assert_eq!(draft.name.as_deref(), Some("Ann"));

    // Retry succeeds
    h.say("generate").await;
    assert_eq!(h.step().await, Some(ConversationStep::Completed));
    assert_eq!(h.store.builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn profile_command_renders_not_set_fallbacks() {
    let h = Harness::default().await;
    // Park an empty-draft participant at Completed
    h.say("hi").await;
    let mut session = h.store.get_session(SENDER).await.unwrap().unwrap();
    session.advance_to(ConversationStep::Completed);
    h.store.put_session(SENDER, &session).await.unwrap();

    h.say("profile").await;
    let reply = h.messenger.last_reply().await;
    assert!(reply.contains(
        "Name: (not set)\nRole: (not set)\nSkills: (not set)\nBio: (not set)"
    ));
}

#[tokio::test]
async fn reset_keeps_draft_by_default() {
    let h = Harness::default().await;
    for text in ["hi", "Ann", "Engineer", "Go, Rust", "Builds backends", "generate"] {
        h.say(text).await;
    }
    assert_eq!(h.step().await, Some(ConversationStep::Completed));

    h.say("reset").await;
    assert_eq!(h.step().await, None);
    assert!(h.messenger.last_reply().await.contains("reset"));

    // Draft survived; next message starts a fresh session
    assert_eq!(h.draft().await.name.as_deref(), Some("Ann"));
    h.say("anything").await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectName));
}

#[tokio::test]
async fn reset_clears_draft_when_policy_says_so() {
    let policy = ConvoPolicy {
        reset_clears_draft: true,
        ..Default::default()
    };
    let h = Harness::new(FakeProjects::returning(Vec::new()), policy).await;
    for text in ["hi", "Ann", "Engineer", "Go, Rust", "Builds backends", "generate"] {
        h.say(text).await;
    }

    h.say("reset").await;
    assert_eq!(h.step().await, None);
    assert!(h.store.get_draft(SENDER).await.unwrap().is_none());
}

#[tokio::test]
async fn restart_phrase_restarts_mid_flow_and_keeps_draft() {
    let h = Harness::default().await;
    h.say("hello").await;
    h.say("Ann").await;
    h.say("Engineer").await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectSkills));

    h.say("hi").await;
    assert_eq!(h.step().await, Some(ConversationStep::CollectName));
    assert!(h.messenger.last_reply().await.contains("What's your full name?"));
    assert_eq!(h.draft().await.name.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn terminal_state_ignores_other_input() {
    let h = Harness::default().await;
    for text in ["hi", "Ann", "Engineer", "Go, Rust", "Builds backends", "generate"] {
        h.say(text).await;
    }

    h.say("please help").await;
    assert_eq!(h.step().await, Some(ConversationStep::Completed));
    assert!(h.messenger.last_reply().await.contains("Type 'profile' to view"));
    // No second build
    assert_eq!(h.builder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn quota_exceeded_does_not_break_the_transition() {
    let h = Harness::default().await;
    h.messenger.quota_exceeded.store(true, Ordering::SeqCst);

    h.say("hello").await;
    h.say("Ann").await;

    // Replies were dropped, but state advanced normally
    assert_eq!(h.step().await, Some(ConversationStep::CollectRole));
    assert_eq!(h.draft().await.name.as_deref(), Some("Ann"));
    assert!(h.messenger.replies().await.is_empty());
}

#[tokio::test]
async fn skill_parsing_drops_empty_segments() {
    let h = Harness::default().await;
    h.say("hi").await;
    h.say("Ann").await;
    h.say("Engineer").await;
    h.say("a, b ,c,,d").await;
    assert_eq!(h.draft().await.skills, vec!["a", "b", "c", "d"]);
}
