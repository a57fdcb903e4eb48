//! Conversational onboarding — state machine, models, and reply copy.

pub mod model;
pub mod replies;
pub mod router;
pub mod step;

pub use model::{BuildRecord, DraftPatch, IncomingMessage, ProfileDraft, Project, UserSession};
pub use router::ConversationRouter;
pub use step::ConversationStep;
