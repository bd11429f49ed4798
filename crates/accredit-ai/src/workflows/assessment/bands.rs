use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::repository::{BandStore, StoreError};

/// A color-to-range assignment used to classify scores visually. The range
/// is half-open: a score `s` falls in the band when
/// `range_start <= s < range_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub color: String,
    pub range_start: f64,
    pub range_end: f64,
}

impl ScoreBand {
    pub fn new(color: impl Into<String>, range_start: f64, range_end: f64) -> Self {
        Self {
            color: color.into(),
            range_start,
            range_end,
        }
    }

    /// Half-open interval overlap: touching boundaries do not overlap.
    pub fn overlaps(&self, other: &ScoreBand) -> bool {
        self.range_start < other.range_end && other.range_start < self.range_end
    }
}

/// Check the full band set: no two ranges may overlap and no color may be
/// assigned twice. Reports the first violation with enough detail to point
/// at the offending pair or color.
pub fn validate(bands: &[ScoreBand]) -> Result<(), BandError> {
    for (i, band) in bands.iter().enumerate() {
        for (j, other) in bands.iter().enumerate().skip(i + 1) {
            if band.overlaps(other) {
                return Err(BandError::Overlap { first: i, second: j });
            }
            if band.color == other.color {
                return Err(BandError::DuplicateColor(band.color.clone()));
            }
        }
    }
    Ok(())
}

/// Persistent registry for the score-band set. Validation happens only at
/// save time; the persisted set is swapped atomically or not at all.
pub struct ScoreBandRegistry<S> {
    store: Arc<S>,
}

impl<S> ScoreBandRegistry<S>
where
    S: BandStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> Result<Vec<ScoreBand>, BandError> {
        Ok(self.store.load()?)
    }

    /// Validate and persist `bands` as the new complete set. On a validation
    /// failure nothing is written and the violating pair/color is reported.
    pub fn save(&self, bands: Vec<ScoreBand>) -> Result<(), BandError> {
        validate(&bands)?;
        self.store.replace(bands)?;
        Ok(())
    }
}

/// Client-side editing state: a draft the user mutates freely (invalid
/// interim states allowed) next to the last committed set. `cancel`
/// restores the committed set wholesale; `save` promotes the draft only
/// after the registry accepts it.
#[derive(Debug, Clone)]
pub struct BandEditor {
    committed: Vec<ScoreBand>,
    draft: Vec<ScoreBand>,
}

impl BandEditor {
    pub fn new(committed: Vec<ScoreBand>) -> Self {
        let draft = committed.clone();
        Self { committed, draft }
    }

    pub fn draft(&self) -> &[ScoreBand] {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Vec<ScoreBand> {
        &mut self.draft
    }

    pub fn committed(&self) -> &[ScoreBand] {
        &self.committed
    }

    /// Discard the draft and restore the last committed set verbatim.
    pub fn cancel(&mut self) {
        self.draft = self.committed.clone();
    }

    /// Persist the draft through the registry; the draft becomes the
    /// committed set only when the save succeeds.
    pub fn save<S>(&mut self, registry: &ScoreBandRegistry<S>) -> Result<(), BandError>
    where
        S: BandStore,
    {
        registry.save(self.draft.clone())?;
        self.committed = self.draft.clone();
        Ok(())
    }
}

/// Band-set violations reported at save time.
#[derive(Debug, thiserror::Error)]
pub enum BandError {
    #[error("score bands at positions {first} and {second} cover overlapping ranges")]
    Overlap { first: usize, second: usize },
    #[error("color '{0}' is assigned to more than one band")]
    DuplicateColor(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
