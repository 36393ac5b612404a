//! @ai:module:intent Quality scoring of generated responses
//! @ai:module:layer application
//! @ai:module:public_api Evaluator, OverlapEvaluator

pub mod overlap;

pub use overlap::OverlapEvaluator;

use crate::metrics::EvaluationScores;
use anyhow::Result;

/// @ai:intent Scores one generated answer against its reference material
///
/// An `Err` is logged by the caller and leaves the request unscored; it never
/// fails the request itself.
pub trait Evaluator: Send + Sync {
    fn evaluate(
        &self,
        generated: &str,
        reference: Option<&str>,
        facts: &[String],
    ) -> Result<EvaluationScores>;
}
