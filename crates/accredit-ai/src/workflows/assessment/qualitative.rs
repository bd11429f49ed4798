use std::sync::Arc;

use super::domain::{AnswerSet, MatrixDefinition};
use super::repository::{QualitativeReview, ReasoningError, ReasoningGateway, ReviewRequest};

/// Delegates per-criterion qualitative scoring to the reasoning service.
///
/// A failed call leaves the draft untouched: `score`/`feedback` are written
/// onto the entry only after the gateway returns a complete review.
pub struct QualitativeReviewer<R> {
    gateway: Arc<R>,
}

impl<R> QualitativeReviewer<R>
where
    R: ReasoningGateway,
{
    pub fn new(gateway: Arc<R>) -> Self {
        Self { gateway }
    }

    /// Score the answer at `seq` against the matrix rubric and record the
    /// result on the entry. The entry keeps its previous score and feedback
    /// whenever the gateway fails or returns an incomplete review.
    pub fn review_entry(
        &self,
        matrix: &MatrixDefinition,
        answers: &mut AnswerSet,
        seq: &str,
    ) -> Result<QualitativeReview, ReviewError> {
        let entry = answers
            .entry(seq)
            .ok_or_else(|| ReviewError::UnknownSeq(seq.to_string()))?;

        let request = ReviewRequest {
            task: matrix.key.clone(),
            seq: seq.to_string(),
            rubric: matrix
                .rubric_items()
                .map(|item| item.reference.clone())
                .collect(),
            answer: entry.answer.clone(),
        };

        let review = self.gateway.review(&request)?;
        if !review.score.is_finite() || review.feedback.trim().is_empty() {
            return Err(ReviewError::Upstream(ReasoningError::Incomplete(format!(
                "seq {seq}: score and feedback are both required"
            ))));
        }

        let entry = answers
            .entry_mut(seq)
            .ok_or_else(|| ReviewError::UnknownSeq(seq.to_string()))?;
        entry.score = Some(review.score);
        entry.feedback = Some(review.feedback.clone());

        Ok(review)
    }
}

/// Error raised while obtaining a qualitative review.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("no answer entry for seq '{0}'")]
    UnknownSeq(String),
    #[error(transparent)]
    Upstream(#[from] ReasoningError),
}
