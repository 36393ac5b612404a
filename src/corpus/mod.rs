//! @ai:module:intent Prompt corpora, prompt sources and reference answers
//! @ai:module:layer domain
//! @ai:module:public_api CorpusEntry, CorpusLoader, PromptSource, SyntheticPrompts, CorpusPrompts, ReferenceLookup, ReferenceTable

pub mod entry;
pub mod loader;
pub mod prompts;
pub mod references;

pub use entry::{CorpusEntry, CorpusFile};
pub use loader::{CorpusLoader, CorpusLoaderTrait};
pub use prompts::{CorpusPrompts, PromptSource, SyntheticPrompts, PROMPTS_PER_WORKLOAD};
pub use references::{Reference, ReferenceLookup, ReferenceTable};
