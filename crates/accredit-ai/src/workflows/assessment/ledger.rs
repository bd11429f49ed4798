use std::collections::HashSet;
use std::sync::Arc;

use super::domain::{AnswerSet, AuthorId, CriterionKey, MatrixDefinition, NewVersion, UnitId, Version};
use super::repository::{StoreError, VersionStore};

/// Append-only ledger of committed answer sets.
///
/// "Current" is never stored; both [`latest`](VersionLedger::latest) and
/// [`history`](VersionLedger::history) recompute from the full version set
/// so there is no second source of truth to drift from the store.
pub struct VersionLedger<S> {
    store: Arc<S>,
}

impl<S> VersionLedger<S>
where
    S: VersionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a new immutable version of `answers` for `(unit, matrix.key)`.
    ///
    /// Every answer seq must name a criterion row of the matrix, and no seq
    /// may appear twice; violations fail the commit without touching the
    /// store.
    pub fn commit(
        &self,
        unit: &UnitId,
        matrix: &MatrixDefinition,
        answers: AnswerSet,
        message: &str,
        author: &AuthorId,
    ) -> Result<Version, LedgerError> {
        validate_against_matrix(&answers, matrix)?;

        let version = self.store.append(NewVersion {
            unit: unit.clone(),
            task: matrix.key.clone(),
            message: message.to_string(),
            details: answers,
            author: author.clone(),
        })?;

        Ok(version)
    }

    /// The version with the greatest `created_at` for the key, ties broken
    /// by the larger store-assigned id. `None` when the unit has never
    /// committed for this task.
    pub fn latest(&self, unit: &UnitId, task: &CriterionKey) -> Result<Option<Version>, LedgerError> {
        let versions = self.store.for_key(unit, task)?;
        Ok(versions
            .into_iter()
            .max_by_key(|version| (version.created_at, version.id)))
    }

    /// The unit's current draft basis: the latest committed answers, or the
    /// matrix's default answer set when no version exists yet. The missing
    /// case is recovered here, not surfaced as an error.
    pub fn current_answers(
        &self,
        unit: &UnitId,
        matrix: &MatrixDefinition,
    ) -> Result<AnswerSet, LedgerError> {
        Ok(self
            .latest(unit, &matrix.key)?
            .map(|version| version.details)
            .unwrap_or_else(|| matrix.default_answer_set()))
    }

    /// Full commit history for the key, newest first. Recomputed from the
    /// store on every call.
    pub fn history(&self, unit: &UnitId, task: &CriterionKey) -> Result<Vec<Version>, LedgerError> {
        let mut versions = self.store.for_key(unit, task)?;
        versions.sort_by(|a, b| {
            (b.created_at, b.id).cmp(&(a.created_at, a.id))
        });
        Ok(versions)
    }
}

fn validate_against_matrix(answers: &AnswerSet, matrix: &MatrixDefinition) -> Result<(), LedgerError> {
    let known: HashSet<&str> = matrix.criterion_seqs().into_iter().collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for seq in answers.seqs() {
        if !known.contains(seq) {
            return Err(LedgerError::UnknownSeq {
                task: matrix.key.clone(),
                seq: seq.to_string(),
            });
        }
        if !seen.insert(seq) {
            return Err(LedgerError::DuplicateSeq(seq.to_string()));
        }
    }

    Ok(())
}

/// Error raised by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("answer references seq '{seq}' which is not a criterion row of matrix {task}")]
    UnknownSeq { task: CriterionKey, seq: String },
    #[error("answer set lists seq '{0}' more than once")]
    DuplicateSeq(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
