//! Page rasterization via poppler's pdftoppm. One subprocess call renders the
//! whole document; the vision service wants every page of a résumé in a
//! single batched request anyway.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::extraction::ExtractError;

/// Render resolution. High enough for the vision model to read body text,
/// small enough to keep the request payload reasonable.
const RENDER_DPI: u32 = 150;

/// Renders all pages of `pdf` to PNGs inside `out_dir`, clearing any stale
/// contents first. Returns the images in page order.
pub(crate) fn render_pages_sync(
    pdf: &Path,
    out_dir: &Path,
    page_count: usize,
) -> Result<Vec<PathBuf>, ExtractError> {
    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir)
            .map_err(|e| ExtractError::Render(format!("failed to clear {}: {e}", out_dir.display())))?;
    }
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ExtractError::Render(format!("failed to create {}: {e}", out_dir.display())))?;

    let prefix = out_dir.join("page");
    let output = Command::new("pdftoppm")
        .arg("-png")
        .arg("-r")
        .arg(RENDER_DPI.to_string())
        .arg(pdf)
        .arg(&prefix)
        .output()
        .map_err(|e| {
            ExtractError::Render(format!(
                "failed to run pdftoppm: {e}. Make sure poppler-utils is installed."
            ))
        })?;

    if !output.status.success() {
        return Err(ExtractError::Render(format!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    // pdftoppm zero-pads the page suffix depending on the page count.
    let mut images = Vec::with_capacity(page_count);
    for page in 1..=page_count {
        let candidates = [
            format!("{}-{}.png", prefix.display(), page),
            format!("{}-{:02}.png", prefix.display(), page),
            format!("{}-{:03}.png", prefix.display(), page),
        ];
        let found = candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| {
                ExtractError::Render(format!("rendered image for page {page} not found"))
            })?;
        images.push(found);
    }

    Ok(images)
}
