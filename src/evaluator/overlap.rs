//! @ai:module:intent Lexical quality scores for generated text
//! @ai:module:layer application
//! @ai:module:public_api OverlapEvaluator
//! @ai:module:stateless true

use crate::evaluator::Evaluator;
use crate::metrics::EvaluationScores;
use anyhow::Result;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// @ai:intent Scores text by fact containment, sentence cohesion and n-gram overlap
///
/// Produces `factual_accuracy` when facts are given, `unigram_f1` and
/// `bigram_f1` when a reference text is given, and `coherence` always.
pub struct OverlapEvaluator {
    sentence_break: Regex,
    word: Regex,
}

impl OverlapEvaluator {
    /// @ai:intent Create a new overlap evaluator
    /// @ai:effects pure
    pub fn new() -> Result<Self> {
        Ok(Self {
            sentence_break: Regex::new(r"[.!?]+(?:\s+|$)")?,
            word: Regex::new(r"\w+")?,
        })
    }

    fn words(&self, text: &str) -> Vec<String> {
        self.word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// @ai:intent Fraction of facts contained in the text, case-insensitively
    /// @ai:example ("Paris is lovely", ["paris", "Berlin"]) -> 0.5
    /// @ai:effects pure
    pub fn factual_accuracy(&self, text: &str, facts: &[String]) -> f64 {
        if facts.is_empty() {
            return 0.0;
        }

        let lower = text.to_lowercase();
        let present = facts
            .iter()
            .filter(|fact| lower.contains(&fact.to_lowercase()))
            .count();

        present as f64 / facts.len() as f64
    }

    /// @ai:intent Mean Jaccard similarity of adjacent sentences' word sets
    /// @ai:edge_cases a single sentence scores 1.0
    /// @ai:effects pure
    pub fn coherence(&self, text: &str) -> f64 {
        let sentences: Vec<HashSet<String>> = self
            .sentence_break
            .split(text)
            .filter(|s| !s.trim().is_empty())
            .map(|s| self.words(s).into_iter().collect())
            .collect();

        if sentences.len() <= 1 {
            return 1.0;
        }

        let similarities: Vec<f64> = sentences
            .windows(2)
            .filter(|pair| !pair[0].is_empty() && !pair[1].is_empty())
            .map(|pair| {
                let shared = pair[0].intersection(&pair[1]).count();
                let union = pair[0].union(&pair[1]).count();
                shared as f64 / union as f64
            })
            .collect();

        if similarities.is_empty() {
            return 0.0;
        }

        similarities.iter().sum::<f64>() / similarities.len() as f64
    }

    /// @ai:intent F1 of clipped n-gram counts between text and reference
    /// @ai:effects pure
    pub fn ngram_f1(&self, text: &str, reference: &str, n: usize) -> f64 {
        let text_words = self.words(text);
        let reference_words = self.words(reference);
        let candidate = ngram_counts(&text_words, n);
        let expected = ngram_counts(&reference_words, n);

        let candidate_total: usize = candidate.values().sum();
        let expected_total: usize = expected.values().sum();

        if candidate_total == 0 || expected_total == 0 {
            return 0.0;
        }

        let overlap: usize = candidate
            .iter()
            .map(|(gram, count)| (*count).min(expected.get(gram).copied().unwrap_or(0)))
            .sum();

        if overlap == 0 {
            return 0.0;
        }

        let precision = overlap as f64 / candidate_total as f64;
        let recall = overlap as f64 / expected_total as f64;
        2.0 * precision * recall / (precision + recall)
    }
}

fn ngram_counts(words: &[String], n: usize) -> HashMap<Vec<&str>, usize> {
    let mut counts = HashMap::new();

    if n == 0 {
        return counts;
    }

    for window in words.windows(n) {
        let gram: Vec<&str> = window.iter().map(String::as_str).collect();
        *counts.entry(gram).or_insert(0) += 1;
    }

    counts
}

impl Evaluator for OverlapEvaluator {
    /// @ai:effects pure
    fn evaluate(
        &self,
        generated: &str,
        reference: Option<&str>,
        facts: &[String],
    ) -> Result<EvaluationScores> {
        if generated.trim().is_empty() {
            anyhow::bail!("Cannot score an empty response");
        }

        let mut scores = EvaluationScores::new();
        scores.insert("coherence".to_string(), self.coherence(generated));

        if !facts.is_empty() {
            scores.insert(
                "factual_accuracy".to_string(),
                self.factual_accuracy(generated, facts),
            );
        }

        if let Some(reference) = reference.filter(|r| !r.trim().is_empty()) {
            scores.insert("unigram_f1".to_string(), self.ngram_f1(generated, reference, 1));
            scores.insert("bigram_f1".to_string(), self.ngram_f1(generated, reference, 2));
        }

        Ok(scores)
    }
}
