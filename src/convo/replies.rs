//! User-facing reply text. All outbound copy lives here so the router stays
//! free of string literals and the texts are testable in one place.

use super::model::{ProfileDraft, Project};

pub fn welcome() -> String {
    "👋 Hello! Welcome to foliobot — your AI career assistant.\n\nLet's get started. What's your full name?".to_string()
}

pub fn name_saved(name: &str) -> String {
    format!("Nice to meet you, {name}! What's your professional role / job title?")
}

pub fn role_saved(role: &str) -> String {
    format!(
        "Got it — you're a \"{role}\". Now, please list your key skills separated by commas (e.g., Node.js, React, SQL)."
    )
}

pub fn skills_saved(skills: &[String]) -> String {
    format!(
        "Great — noted your skills: {}.\n\nPlease write a one-line professional summary / bio (e.g., \"Backend developer building scalable services\").",
        skills.join(", ")
    )
}

pub fn projects_menu() -> String {
    "Bio saved.\n\nNext: would you like to import projects from GitHub or add them manually?\n\nReply with:\n• \"import github\" — to pull public repos\n• \"manual\" — to add projects one by one\n• \"generate\" — to skip projects and build now".to_string()
}

pub fn menu_reprompt() -> String {
    "I didn't understand. Reply 'import github' to import repos, 'manual' to add projects, or 'generate' to build the site now.".to_string()
}

pub fn ask_github_username() -> String {
    "Please send your GitHub username (e.g., 'octocat'). I will fetch your public repos.".to_string()
}

pub fn invalid_github_username() -> String {
    "Please send a valid GitHub username.".to_string()
}

pub fn fetching_repos() -> String {
    "🔍 Fetching your GitHub repositories...".to_string()
}

pub fn no_repos_found() -> String {
    "No public repositories found. You can type 'manual' to add projects manually or 'generate' to build with current data.".to_string()
}

/// Import confirmation with a truncated preview: first three titles, then a
/// `... and N more` suffix when the list is longer.
pub fn repos_imported(projects: &[Project]) -> String {
    let preview = projects
        .iter()
        .take(3)
        .map(|p| p.title.as_str())
        .collect::<Vec<_>>()
        .join("\n• ");
    let more = if projects.len() > 3 {
        format!("\n... and {} more", projects.len() - 3)
    } else {
        String::new()
    };
    format!(
        "✅ Successfully fetched {} repositories from GitHub!\n\n• {preview}{more}\n\nType 'generate' to build your portfolio now or 'manual' to add more projects.",
        projects.len()
    )
}

pub fn github_fetch_error() -> String {
    "❌ Error fetching GitHub repos. Please check the username and try again.".to_string()
}

pub fn manual_entry_intro() -> String {
    "OK — send the project as: <Title> - <short description>. I'll save each one. Send 'done' when finished.".to_string()
}

pub fn project_saved(title: &str) -> String {
    format!("Saved project \"{title}\". Add more or send 'done' when finished.")
}

pub fn manual_entry_done() -> String {
    "OK — project entry finished. You can add another or type 'generate' to build.".to_string()
}

pub fn generating() -> String {
    "🔧 Generating your portfolio... This may take a moment.".to_string()
}

pub fn build_success(html_url: &str, pdf_url: &str) -> String {
    format!(
        "🎉 Your portfolio is ready!\n\n📄 Website: {html_url}\n📑 PDF: {pdf_url}\n\nType 'profile' to view your data or 'reset' to start over."
    )
}

pub fn build_error() -> String {
    "❌ Sorry, there was an error generating your portfolio. Please try again or type 'reset' to start over.".to_string()
}

pub fn reset_done() -> String {
    "Your profile has been reset. Let's start again — what's your name?".to_string()
}

/// Fixed-format draft summary. Every field falls back to `(not set)`.
pub fn profile_summary(draft: &ProfileDraft) -> String {
    let not_set = "(not set)";
    let name = draft.name.as_deref().filter(|s| !s.is_empty()).unwrap_or(not_set);
    let role = draft.role.as_deref().filter(|s| !s.is_empty()).unwrap_or(not_set);
    let skills = if draft.skills.is_empty() {
        not_set.to_string()
    } else {
        draft.skills.join(", ")
    };
    let bio = draft.bio.as_deref().filter(|s| !s.is_empty()).unwrap_or(not_set);
    format!("👤 Current draft profile:\nName: {name}\nRole: {role}\nSkills: {skills}\nBio: {bio}")
}

pub fn already_terminal() -> String {
    "I am building or your profile is completed. Type 'profile' to view, or 'reset' to start over.".to_string()
}

pub fn fallback() -> String {
    "Sorry, I didn't understand. Type 'reset' to start over.".to_string()
}

pub fn apology() -> String {
    "⚠️ Oops — something went wrong on my side. Please try again or type 'reset' to restart.".to_string()
}
