use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{AnswerSet, MatrixDefinition, UnitId};
use super::ledger::{LedgerError, VersionLedger};
use super::repository::VersionStore;

/// Read-only snapshot of another unit's submission, shown alongside the
/// active draft for comparison. Never fed back into a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceView {
    pub unit: UnitId,
    pub answers: AnswerSet,
    /// Stamp of the commit the view was taken from; absent when the foreign
    /// unit has no version yet and the answers are the synthesized default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Resolves a foreign unit's latest version for the same criterion.
pub struct ReferenceResolver<S> {
    ledger: VersionLedger<S>,
}

impl<S> ReferenceResolver<S>
where
    S: VersionStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            ledger: VersionLedger::new(store),
        }
    }

    /// The foreign unit's latest answers for `matrix.key`, or the synthesized
    /// empty set when it has never committed. "No data" renders as an empty
    /// reference, not as an error.
    pub fn resolve(
        &self,
        foreign_unit: &UnitId,
        matrix: &MatrixDefinition,
    ) -> Result<ReferenceView, LedgerError> {
        let view = match self.ledger.latest(foreign_unit, &matrix.key)? {
            Some(version) => ReferenceView {
                unit: foreign_unit.clone(),
                answers: version.details,
                committed_at: Some(version.created_at),
                message: Some(version.message),
            },
            None => ReferenceView {
                unit: foreign_unit.clone(),
                answers: matrix.default_answer_set(),
                committed_at: None,
                message: None,
            },
        };

        Ok(view)
    }
}
