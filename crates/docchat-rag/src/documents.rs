//! Document loading and chunking

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use docchat_core::{Document, Error, Node, Result};

use crate::splitter::SentenceSplitter;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "text", "md", "markdown", "rst", "csv", "log", "json", "yaml", "yml", "toml", "html",
    "htm",
];

/// Reads raw input files from the configured paths and splits them into
/// retrievable chunks.
///
/// No caching between calls; each call re-reads from disk. A missing path is
/// an error that propagates to the caller.
pub struct DocumentHandler {
    input_files: Vec<PathBuf>,
    splitter: SentenceSplitter,
}

impl DocumentHandler {
    pub fn new(input_files: &[String], chunk_size: usize) -> Self {
        Self {
            input_files: input_files.iter().map(PathBuf::from).collect(),
            splitter: SentenceSplitter::new(chunk_size),
        }
    }

    /// Load the raw documents from disk.
    pub fn documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for path in &self.input_files {
            if !path.exists() {
                return Err(Error::Document(format!(
                    "Input path {} does not exist",
                    path.display()
                )));
            }
            self.collect(path, &mut documents)?;
        }

        log::info!("Loaded {} documents", documents.len());
        Ok(documents)
    }

    /// Load the documents and split them into retrievable chunks.
    pub fn nodes(&self) -> Result<Vec<Node>> {
        let documents = self.documents()?;
        let mut nodes = Vec::new();

        for document in &documents {
            for chunk in self.splitter.split(&document.text) {
                nodes.push(Node {
                    id: Uuid::new_v4().to_string(),
                    text: chunk,
                    source: document.source.clone(),
                });
            }
        }

        log::info!("Split {} documents into {} chunks", documents.len(), nodes.len());
        Ok(nodes)
    }

    fn collect(&self, path: &Path, documents: &mut Vec<Document>) -> Result<()> {
        if path.is_dir() {
            for entry in fs::read_dir(path)? {
                let entry = entry?;
                self.collect(&entry.path(), documents)?;
            }
            return Ok(());
        }

        if let Some(text) = read_file(path)? {
            if text.trim().is_empty() {
                log::debug!("Skipping empty file {}", path.display());
                return Ok(());
            }
            documents.push(Document {
                id: Uuid::new_v4().to_string(),
                source: path.display().to_string(),
                text,
            });
        }
        Ok(())
    }
}

/// Read a single file, returning `None` for formats we do not handle.
fn read_file(path: &Path) -> Result<Option<String>> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase());

    match extension.as_deref() {
        Some("pdf") => {
            let text = pdf_extract::extract_text(path).map_err(|e| {
                Error::Document(format!("Failed to extract text from {}: {}", path.display(), e))
            })?;
            Ok(Some(text))
        }
        Some(ext) if TEXT_EXTENSIONS.contains(&ext) => Ok(Some(fs::read_to_string(path)?)),
        Some(_) => {
            log::debug!("Skipping unsupported file {}", path.display());
            Ok(None)
        }
        // No extension: try to read as UTF-8, skip binary content.
        None => match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                log::debug!("Skipping non-text file {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        },
    }
}
