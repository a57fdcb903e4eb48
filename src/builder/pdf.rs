//! PDF synthesis — prints a rendered HTML page to PDF with a headless
//! browser subprocess.

use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::error::BuildError;

/// Print `html_path` to `pdf_path` using the given headless browser binary.
pub async fn print_to_pdf(
    browser_bin: &str,
    html_path: &Path,
    pdf_path: &Path,
) -> Result<(), BuildError> {
    let output = Command::new(browser_bin)
        .arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg(format!("--print-to-pdf={}", pdf_path.display()))
        .arg(format!("file://{}", html_path.display()))
        .output()
        .await
        .map_err(|e| BuildError::Pdf(format!("Failed to launch {browser_bin}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BuildError::Pdf(format!(
            "{browser_bin} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    if !pdf_path.exists() {
        return Err(BuildError::Pdf(format!(
            "{browser_bin} succeeded but produced no output at {}",
            pdf_path.display()
        )));
    }

    debug!(pdf = %pdf_path.display(), "PDF rendered");
    Ok(())
}
