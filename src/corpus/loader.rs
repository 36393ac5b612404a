//! @ai:module:intent TOML corpus loader for prompt entries
//! @ai:module:layer infrastructure
//! @ai:module:public_api CorpusLoader, CorpusLoaderTrait
//! @ai:module:stateless true

use crate::corpus::entry::{CorpusEntry, CorpusFile};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Trait for loading a prompt corpus
pub trait CorpusLoaderTrait: Send + Sync {
    /// @ai:intent Load all entries from the corpus directory
    fn load_all(&self, corpus_dir: &Path) -> Result<Vec<CorpusEntry>>;
}

/// @ai:intent Loads corpus entries from TOML files
/// @ai:effects pure (stateless)
pub struct CorpusLoader;

impl CorpusLoader {
    /// @ai:intent Create a new corpus loader
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Parse a single corpus file
    /// @ai:pre path points to a valid TOML file
    /// @ai:effects fs:read
    fn parse_corpus_file(path: &Path) -> Result<Vec<CorpusEntry>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;

        let file: CorpusFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse corpus file: {}", path.display()))?;

        Ok(file.entries)
    }

    /// @ai:intent Find all TOML files in directory, in path order
    /// @ai:effects fs:read
    fn find_corpus_files(corpus_dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(corpus_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "toml"))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusLoaderTrait for CorpusLoader {
    /// @ai:effects fs:read
    fn load_all(&self, corpus_dir: &Path) -> Result<Vec<CorpusEntry>> {
        if !corpus_dir.is_dir() {
            anyhow::bail!("Corpus directory not found: {}", corpus_dir.display());
        }

        let mut entries = Vec::new();

        for path in Self::find_corpus_files(corpus_dir) {
            match Self::parse_corpus_file(&path) {
                Ok(parsed) => entries.extend(parsed),
                Err(e) => {
                    tracing::warn!("Skipping invalid corpus file {}: {}", path.display(), e);
                }
            }
        }

        Ok(entries)
    }
}
