//! @ai:module:intent Reference answers and facts keyed by prompt
//! @ai:module:layer domain
//! @ai:module:public_api Reference, ReferenceLookup, ReferenceTable
//! @ai:module:stateless true

use crate::corpus::entry::CorpusEntry;

/// @ai:intent What a generated answer is scored against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    pub text: Option<String>,
    pub facts: Vec<String>,
}

impl Reference {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty()) && self.facts.is_empty()
    }
}

/// @ai:intent Finds the reference for a prompt, if any
pub trait ReferenceLookup: Send + Sync {
    fn lookup(&self, prompt: &str) -> Option<Reference>;
}

/// @ai:intent Ordered table of (key, reference) pairs
///
/// Lookup tries an exact key match first, then a case-insensitive
/// containment match in either direction, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: Vec<(String, Reference)>,
}

const BUILTIN_QA: &[(&str, &str, &[&str])] = &[
    (
        "What is the capital of France?",
        "The capital of France is Paris.",
        &["Paris", "capital of France"],
    ),
    (
        "Who wrote the novel '1984'?",
        "George Orwell wrote the novel '1984'.",
        &["George Orwell", "1984"],
    ),
    (
        "What is the boiling point of water in Celsius?",
        "The boiling point of water is 100 degrees Celsius at standard atmospheric pressure.",
        &["100 degrees", "Celsius", "standard atmospheric pressure"],
    ),
    (
        "What is the largest planet in our solar system?",
        "Jupiter is the largest planet in our solar system.",
        &["Jupiter", "largest planet"],
    ),
    (
        "Who painted the Mona Lisa?",
        "Leonardo da Vinci painted the Mona Lisa.",
        &["Leonardo da Vinci", "Mona Lisa"],
    ),
    (
        "What is the chemical symbol for gold?",
        "The chemical symbol for gold is Au.",
        &["Au", "chemical symbol", "gold"],
    ),
    (
        "What is the tallest mountain in the world?",
        "Mount Everest is the tallest mountain in the world above sea level.",
        &["Mount Everest", "tallest mountain", "above sea level"],
    ),
    (
        "What year did World War II end?",
        "World War II ended in 1945.",
        &["1945", "World War II"],
    ),
    (
        "What is the speed of light?",
        "The speed of light in a vacuum is approximately 299,792,458 meters per second.",
        &["299,792,458", "meters per second", "vacuum"],
    ),
    (
        "Who is the current Secretary-General of the United Nations?",
        "António Guterres is the current Secretary-General of the United Nations.",
        &["António Guterres", "Secretary-General", "United Nations"],
    ),
];

const BUILTIN_REASONING: &[(&str, &str, &[&str])] = &[
    (
        "If all A are B, and all B are C, what can we conclude about the relationship between A and C?",
        "If all A are B, and all B are C, then all A are C. This follows from the transitive \
         property of logical implication.",
        &["all A are C", "transitive property"],
    ),
    (
        "There are five houses in a row, each painted a different color. The green house is next \
         to the white house. The red house is on the far left. The yellow house is two houses away \
         from the blue house. The white house is on the far right. What is the order of the houses \
         from left to right?",
        "The order of the houses from left to right is: red, yellow, blue, green, white.",
        &["red, yellow, blue, green, white", "left to right"],
    ),
    (
        "If it's not raining, then Susan walks to work. Susan is not walking to work. What can we conclude?",
        "If it's not raining, then Susan walks to work. Susan is not walking to work. Using modus \
         tollens (denying the consequent), we can conclude that it is raining.",
        &["it is raining", "modus tollens"],
    ),
];

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Table preloaded with answers to the synthetic QA questions
    /// and logical reasoning problems
    /// @ai:effects pure
    pub fn builtin() -> Self {
        let mut table = Self::new();

        for (question, answer, facts) in BUILTIN_QA.iter().chain(BUILTIN_REASONING) {
            table.insert(
                question,
                Reference {
                    text: Some(answer.to_string()),
                    facts: facts.iter().map(|f| f.to_string()).collect(),
                },
            );
        }

        table
    }

    /// @ai:intent Add every corpus entry that carries a reference or facts
    /// @ai:effects pure
    pub fn extend_from_corpus(&mut self, entries: &[CorpusEntry]) {
        for entry in entries.iter().filter(|e| e.has_reference()) {
            self.insert(
                &entry.prompt,
                Reference {
                    text: entry.reference.clone(),
                    facts: entry.facts.clone(),
                },
            );
        }
    }

    pub fn insert(&mut self, key: &str, reference: Reference) {
        self.entries.push((key.to_string(), reference));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceLookup for ReferenceTable {
    /// @ai:effects pure
    fn lookup(&self, prompt: &str) -> Option<Reference> {
        if let Some((_, reference)) = self.entries.iter().find(|(key, _)| key == prompt) {
            return Some(reference.clone()).filter(|r| !r.is_empty());
        }

        let prompt_lower = prompt.to_lowercase();

        self.entries
            .iter()
            .find(|(key, _)| {
                let key_lower = key.to_lowercase();
                prompt_lower.contains(&key_lower) || key_lower.contains(&prompt_lower)
            })
            .map(|(_, reference)| reference.clone())
            .filter(|r| !r.is_empty())
    }
}
