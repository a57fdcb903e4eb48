//! Portfolio building — renders the accumulated draft into published
//! HTML and PDF artifacts.

pub mod html;
pub mod pdf;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use crate::error::BuildError;
use crate::store::Store;

/// Published artifact locations returned by a successful build.
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    pub html_url: String,
    pub pdf_url: String,
}

/// Build-by-participant capability. Opaque to the router: possibly slow,
/// possibly failing.
#[async_trait]
pub trait PortfolioBuilder: Send + Sync {
    async fn build(&self, participant: &str) -> Result<BuildArtifacts, BuildError>;
}

/// Builds a static site under an output directory and serves it from a
/// public base URL.
pub struct StaticSiteBuilder {
    store: Arc<dyn Store>,
    out_dir: PathBuf,
    public_base_url: String,
    browser_bin: String,
}

impl StaticSiteBuilder {
    pub fn new(
        store: Arc<dyn Store>,
        out_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        browser_bin: impl Into<String>,
    ) -> Self {
        Self {
            store,
            out_dir: out_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            browser_bin: browser_bin.into(),
        }
    }
}

/// Reduce a participant id to a filesystem/URL-safe slug.
fn slugify(participant: &str) -> String {
    let slug: String = participant
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}

#[async_trait]
impl PortfolioBuilder for StaticSiteBuilder {
    async fn build(&self, participant: &str) -> Result<BuildArtifacts, BuildError> {
        let draft = self
            .store
            .get_draft(participant)
            .await?
            .ok_or_else(|| BuildError::DraftMissing {
                participant: participant.to_string(),
            })?;

        let folder = format!("{}-{}", slugify(participant), Uuid::new_v4());
        let dir = self.out_dir.join(&folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| BuildError::Publish(format!("Failed to create {}: {e}", dir.display())))?;

        let html = html::render(&draft);
        let html_path = dir.join("index.html");
        tokio::fs::write(&html_path, &html)
            .await
            .map_err(|e| BuildError::Publish(format!("Failed to write HTML: {e}")))?;

        let pdf_path = dir.join("portfolio.pdf");
        pdf::print_to_pdf(&self.browser_bin, &html_path, &pdf_path).await?;

        info!(participant, folder = %folder, "Portfolio published");
        Ok(BuildArtifacts {
            html_url: format!("{}/{folder}/index.html", self.public_base_url),
            pdf_url: format!("{}/{folder}/portfolio.pdf", self.public_base_url),
        })
    }
}
