//! @ai:module:intent Produce the ordered prompt list a workload cycles through
//! @ai:module:layer domain
//! @ai:module:public_api PromptSource, SyntheticPrompts, CorpusPrompts, PROMPTS_PER_WORKLOAD
//! @ai:module:stateless true

use crate::config::WorkloadSpec;
use crate::corpus::entry::CorpusEntry;

/// Number of prompts generated for a synthetic workload.
pub const PROMPTS_PER_WORKLOAD: usize = 100;

const QA_PREFIX: &str = "Answer the following question concisely and accurately: ";
const QA_FILLER: &str = " Please provide a detailed explanation.";
const QA_QUESTIONS: &[&str] = &[
    "What is the capital of France?",
    "Who wrote the novel '1984'?",
    "What is the boiling point of water in Celsius?",
    "What is the largest planet in our solar system?",
    "Who painted the Mona Lisa?",
    "What is the chemical symbol for gold?",
    "What is the tallest mountain in the world?",
    "What year did World War II end?",
    "What is the speed of light?",
    "Who is the current Secretary-General of the United Nations?",
];

const CODE_PREFIX: &str = "Write a Python function that ";
const CODE_FILLER: &str = " The function should be efficient and handle edge cases properly.";
const CODE_TASKS: &[&str] = &[
    "sorts a list of integers using the quicksort algorithm.",
    "implements a binary search tree with insert, delete, and search operations.",
    "calculates the Fibonacci sequence up to n terms using dynamic programming.",
    "performs matrix multiplication for two input matrices.",
    "implements a simple HTTP server that serves static files.",
    "parses a CSV file and performs basic data analysis.",
    "implements a simple neural network with forward propagation.",
    "creates a REST API with authentication.",
    "implements a caching mechanism with LRU policy.",
    "performs sentiment analysis on a given text.",
];

const REASONING_PREFIX: &str = "Solve the following logical reasoning problem: ";
const REASONING_FILLER: &str = " Think through this step by step.";
const REASONING_PROBLEMS: &[&str] = &[
    "If all A are B, and all B are C, what can we conclude about the relationship between A and C?",
    "There are five houses in a row, each painted a different color. The green house is next \
     to the white house. The red house is on the far left. The yellow house is two houses away \
     from the blue house. The white house is on the far right. What is the order of the houses \
     from left to right?",
    "If it's not raining, then Susan walks to work. Susan is not walking to work. What can we conclude?",
];

const GENERIC_PROMPT: &str = "Generate a response to this prompt.";
const GENERIC_FILLER: &str = " Generate a response to this prompt.";

/// @ai:intent Supplies the prompts for one workload, in dispatch order
pub trait PromptSource: Send + Sync {
    /// @ai:intent Prompts for `spec`; may be empty
    fn prompts(&self, spec: &WorkloadSpec) -> Vec<String>;
}

/// @ai:intent Pad with `filler` until `target` characters, then cut to exactly `target`
/// @ai:edge_cases target == 0 leaves the prompt untouched
/// @ai:effects pure
fn fit_to_length(mut prompt: String, filler: &str, target: usize) -> String {
    if target == 0 {
        return prompt;
    }

    while prompt.chars().count() < target {
        prompt.push_str(filler);
    }

    prompt.chars().take(target).collect()
}

/// @ai:intent Generates prompts from built-in templates chosen by workload name
///
/// Names starting with `qa` get factual questions, `code` gets programming
/// tasks, `reasoning` gets logic problems, anything else a generic instruction.
#[derive(Debug, Clone)]
pub struct SyntheticPrompts {
    count: usize,
}

impl SyntheticPrompts {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    /// @ai:intent Template prefix, item list and filler for a workload name
    /// @ai:effects pure
    fn template(workload: &str) -> (&'static str, &'static [&'static str], &'static str) {
        if workload.starts_with("qa") {
            (QA_PREFIX, QA_QUESTIONS, QA_FILLER)
        } else if workload.starts_with("code") {
            (CODE_PREFIX, CODE_TASKS, CODE_FILLER)
        } else if workload.starts_with("reasoning") {
            (REASONING_PREFIX, REASONING_PROBLEMS, REASONING_FILLER)
        } else {
            ("", &[GENERIC_PROMPT], GENERIC_FILLER)
        }
    }
}

impl Default for SyntheticPrompts {
    fn default() -> Self {
        Self::new(PROMPTS_PER_WORKLOAD)
    }
}

impl PromptSource for SyntheticPrompts {
    /// @ai:effects pure
    fn prompts(&self, spec: &WorkloadSpec) -> Vec<String> {
        let (prefix, items, filler) = Self::template(&spec.name);

        (0..self.count)
            .map(|i| {
                let base = format!("{}{}", prefix, items[i % items.len()]);
                fit_to_length(base, filler, spec.prompt_len)
            })
            .collect()
    }
}

/// @ai:intent Serves prompts from loaded corpus entries
///
/// Workloads without entries fall back to synthetic prompts.
#[derive(Debug, Clone)]
pub struct CorpusPrompts {
    entries: Vec<CorpusEntry>,
    fallback: SyntheticPrompts,
}

impl CorpusPrompts {
    pub fn new(entries: Vec<CorpusEntry>) -> Self {
        Self {
            entries,
            fallback: SyntheticPrompts::default(),
        }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }
}

impl PromptSource for CorpusPrompts {
    /// @ai:effects pure
    fn prompts(&self, spec: &WorkloadSpec) -> Vec<String> {
        let prompts: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.workload == spec.name)
            .map(|entry| entry.prompt.clone())
            .collect();

        if prompts.is_empty() {
            tracing::debug!("No corpus entries for {}, using synthetic prompts", spec.name);
            return self.fallback.prompts(spec);
        }

        prompts
    }
}
