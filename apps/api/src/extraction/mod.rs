// Document extraction: page introspection, paragraph text, and embedded link
// annotations. PDF is the only supported input format; callers gate on
// `is_pdf` before paying for any parsing.

pub mod render;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lopdf::{Document, Object};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("failed to render pages: {0}")]
    Render(String),
}

/// One URI link annotation found in the document, with the hyperlinked text
/// when the producer recorded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAnnotation {
    pub uri: String,
    pub anchor: Option<String>,
}

/// Whether the path names a file in the one supported upload format.
pub fn is_pdf(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(".pdf")
}

/// Document introspection and content extraction, consumed by the pipeline
/// stages. All methods are priced as blocking CPU/subprocess work and must
/// not be called on a handler's hot path.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn page_count(&self, path: &Path) -> Result<usize, ExtractError>;

    /// Ordered paragraphs, split on blank lines; line breaks inside a
    /// paragraph are preserved.
    async fn extract_paragraphs(&self, path: &Path) -> Result<Vec<String>, ExtractError>;

    /// URI link annotations in page order.
    async fn link_annotations(&self, path: &Path) -> Result<Vec<LinkAnnotation>, ExtractError>;

    /// Renders every page to a PNG inside `out_dir`, clearing any stale
    /// contents first. Returns the images in page order.
    async fn render_pages(&self, path: &Path, out_dir: &Path)
        -> Result<Vec<PathBuf>, ExtractError>;
}

/// The production analyzer: lopdf for structure, pdf-extract for text, and
/// poppler's pdftoppm for rasterization.
pub struct PdfAnalyzer;

#[async_trait]
impl DocumentAnalyzer for PdfAnalyzer {
    async fn page_count(&self, path: &Path) -> Result<usize, ExtractError> {
        let path = path.to_path_buf();
        spawn_extract(move || page_count_sync(&path)).await
    }

    async fn extract_paragraphs(&self, path: &Path) -> Result<Vec<String>, ExtractError> {
        let path = path.to_path_buf();
        spawn_extract(move || paragraphs_sync(&path)).await
    }

    async fn link_annotations(&self, path: &Path) -> Result<Vec<LinkAnnotation>, ExtractError> {
        let path = path.to_path_buf();
        spawn_extract(move || links_sync(&path)).await
    }

    async fn render_pages(
        &self,
        path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        let path = path.to_path_buf();
        let out_dir = out_dir.to_path_buf();
        spawn_extract(move || {
            let pages = page_count_sync(&path)?;
            render::render_pages_sync(&path, &out_dir, pages)
        })
        .await
    }
}

/// Runs a blocking extraction closure off the async runtime.
async fn spawn_extract<T, F>(f: F) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Parse(format!("extraction task failed: {e}")))?
}

fn load_document(path: &Path) -> Result<Document, ExtractError> {
    Document::load(path).map_err(|e| ExtractError::Parse(format!("{}: {e}", path.display())))
}

fn page_count_sync(path: &Path) -> Result<usize, ExtractError> {
    let doc = load_document(path)?;
    Ok(doc.get_pages().len())
}

fn paragraphs_sync(path: &Path) -> Result<Vec<String>, ExtractError> {
    let text =
        pdf_extract::extract_text(path).map_err(|e| ExtractError::Parse(e.to_string()))?;
    Ok(split_paragraphs(&text))
}

/// Splits raw page text into paragraphs on blank lines. Single line breaks
/// stay inside their paragraph so the LLM sees the document's own layout.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

fn links_sync(path: &Path) -> Result<Vec<LinkAnnotation>, ExtractError> {
    let doc = load_document(path)?;
    let mut links = Vec::new();

    for (_, page_id) in doc.get_pages() {
        let page = match doc.get_dictionary(page_id) {
            Ok(dict) => dict,
            Err(_) => continue,
        };
        let annots = match page.get(b"Annots").map(|a| resolved(&doc, a)) {
            Ok(object) => object,
            Err(_) => continue,
        };
        let annots = match annots.as_array() {
            Ok(array) => array,
            Err(_) => continue,
        };

        for entry in annots {
            let annot = match resolved(&doc, entry).as_dict() {
                Ok(dict) => dict,
                Err(_) => continue,
            };
            // Only URI actions carry an external link; internal /Dest
            // annotations and plain markup are skipped.
            let action = match annot.get(b"A").map(|a| resolved(&doc, a)) {
                Ok(object) => object,
                Err(_) => continue,
            };
            let action = match action.as_dict() {
                Ok(dict) => dict,
                Err(_) => continue,
            };
            let uri = match action
                .get(b"URI")
                .ok()
                .and_then(|u| object_text(resolved(&doc, u)))
            {
                Some(uri) => uri,
                None => continue,
            };
            let anchor = annot
                .get(b"Contents")
                .ok()
                .and_then(|o| object_text(resolved(&doc, o)))
                .or_else(|| {
                    annot
                        .get(b"T")
                        .ok()
                        .and_then(|o| object_text(resolved(&doc, o)))
                });
            links.push(LinkAnnotation { uri, anchor });
        }
    }

    Ok(links)
}

/// Follows a single level of indirection; annotation entries are usually
/// references into the object table.
fn resolved<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object.as_reference() {
        Ok(id) => doc.get_object(id).unwrap_or(object),
        Err(_) => object,
    }
}

fn object_text(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}
