use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for an organizational unit whose submissions are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub String);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for the user committing a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorId(pub String);

/// Store-assigned, monotonically increasing version identifier.
///
/// Also the tie-breaker when two versions share a timestamp: a larger id
/// always means a later append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionId(pub u64);

/// Server-issued identifier for an uploaded evidence file. Attachments
/// without one exist only in the local draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentId(pub String);

/// Criterion/sub-criterion pair addressing one assessment task. Doubles as
/// the lookup key for matrix definitions and formula specs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CriterionKey {
    pub no: u32,
    pub sub: String,
}

impl CriterionKey {
    pub fn new(no: u32, sub: impl Into<String>) -> Self {
        Self {
            no,
            sub: sub.into(),
        }
    }
}

impl fmt::Display for CriterionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.no, self.sub)
    }
}

/// Row classification inside a matrix definition. Only `Criterion` rows take
/// free-text answers; the score-band rows carry the rubric descriptions for
/// scores 0 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailItemKind {
    Guidance,
    Indicator,
    Description,
    Element,
    Criterion,
    ScoreBand0,
    ScoreBand1,
    ScoreBand2,
    ScoreBand3,
    ScoreBand4,
}

impl DetailItemKind {
    /// Whether end users may edit rows of this kind.
    pub const fn is_editable(self) -> bool {
        matches!(self, DetailItemKind::Criterion)
    }

    /// The score this rubric row describes, when it is a score-band row.
    pub const fn band_level(self) -> Option<u8> {
        match self {
            DetailItemKind::ScoreBand0 => Some(0),
            DetailItemKind::ScoreBand1 => Some(1),
            DetailItemKind::ScoreBand2 => Some(2),
            DetailItemKind::ScoreBand3 => Some(3),
            DetailItemKind::ScoreBand4 => Some(4),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DetailItemKind::Guidance => "guidance",
            DetailItemKind::Indicator => "indicator",
            DetailItemKind::Description => "description",
            DetailItemKind::Element => "element",
            DetailItemKind::Criterion => "criterion",
            DetailItemKind::ScoreBand0 => "score_band_0",
            DetailItemKind::ScoreBand1 => "score_band_1",
            DetailItemKind::ScoreBand2 => "score_band_2",
            DetailItemKind::ScoreBand3 => "score_band_3",
            DetailItemKind::ScoreBand4 => "score_band_4",
        }
    }
}

/// One row of the matrix: static rubric text, or an editable criterion slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailItem {
    pub seq: String,
    pub kind: DetailItemKind,
    pub reference: String,
}

/// The static rubric structure for one criterion. Immutable once loaded;
/// sourced from the external catalog or a template import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixDefinition {
    pub key: CriterionKey,
    pub items: Vec<DetailItem>,
}

impl MatrixDefinition {
    pub fn new(key: CriterionKey, items: Vec<DetailItem>) -> Self {
        Self { key, items }
    }

    /// Seqs of the editable (criterion) rows, in matrix order.
    pub fn criterion_seqs(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|item| item.kind.is_editable())
            .map(|item| item.seq.as_str())
            .collect()
    }

    /// Rubric text rows (everything that is not an editable criterion slot),
    /// used to brief the reasoning service.
    pub fn rubric_items(&self) -> impl Iterator<Item = &DetailItem> {
        self.items.iter().filter(|item| !item.kind.is_editable())
    }

    /// The draft a unit starts from when it has no committed version yet:
    /// every criterion row present, empty answer, no files, no score.
    pub fn default_answer_set(&self) -> AnswerSet {
        AnswerSet {
            entries: self
                .criterion_seqs()
                .into_iter()
                .map(|seq| AnswerEntry::empty(seq))
                .collect(),
        }
    }
}

/// Descriptor for one uploaded evidence file, tied to the criterion row it
/// supports via `seq`. `id` is present only once the blob store has accepted
/// the upload; draft-only attachments carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AttachmentId>,
    pub name: String,
    pub url: String,
    pub seq: String,
}

impl Attachment {
    pub const fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Identity used by [`remove`](super::attachments::remove): server id when
    /// both sides have one, otherwise the `(seq, name)` pair a staged file is
    /// known by.
    pub fn same_identity(&self, other: &Attachment) -> bool {
        match (&self.id, &other.id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.seq == other.seq && self.name == other.name,
            _ => false,
        }
    }
}

/// The answer for one criterion row: free text, supporting files, and the
/// optional qualitative score/feedback pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub seq: String,
    pub answer: String,
    #[serde(default)]
    pub files: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl AnswerEntry {
    pub fn empty(seq: impl Into<String>) -> Self {
        Self {
            seq: seq.into(),
            answer: String::new(),
            files: Vec::new(),
            score: None,
            feedback: None,
        }
    }
}

/// The mutable draft for one (unit, criterion) pair. Entries are keyed by
/// criterion seq; seqs must be unique and drawn from the matrix definition,
/// which [`commit`](super::ledger::VersionLedger::commit) enforces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub entries: Vec<AnswerEntry>,
}

impl AnswerSet {
    pub fn entry(&self, seq: &str) -> Option<&AnswerEntry> {
        self.entries.iter().find(|entry| entry.seq == seq)
    }

    pub fn entry_mut(&mut self, seq: &str) -> Option<&mut AnswerEntry> {
        self.entries.iter_mut().find(|entry| entry.seq == seq)
    }

    pub fn seqs(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.seq.as_str())
    }
}

/// An immutable, timestamped snapshot of a unit's answers for one task,
/// created by an explicit commit. Never mutated or deleted; superseded by
/// later commits on the same `(unit, task)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub unit: UnitId,
    pub task: CriterionKey,
    pub message: String,
    pub details: AnswerSet,
    pub created_at: DateTime<Utc>,
    pub author: AuthorId,
}

/// Commit payload before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVersion {
    pub unit: UnitId,
    pub task: CriterionKey,
    pub message: String,
    pub details: AnswerSet,
    pub author: AuthorId,
}
