//! @ai:module:intent Corpus entry definitions
//! @ai:module:layer domain
//! @ai:module:public_api CorpusEntry, CorpusFile
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};

/// @ai:intent One prompt, optionally with the answer it should produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Workload this prompt belongs to (e.g., "qa-short")
    pub workload: String,
    pub prompt: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub facts: Vec<String>,
}

/// @ai:intent TOML file structure: a list of `[[entries]]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusFile {
    #[serde(default)]
    pub entries: Vec<CorpusEntry>,
}

impl CorpusEntry {
    /// @ai:intent Whether the entry carries anything to score against
    /// @ai:effects pure
    pub fn has_reference(&self) -> bool {
        self.reference.as_deref().is_some_and(|r| !r.trim().is_empty()) || !self.facts.is_empty()
    }
}
