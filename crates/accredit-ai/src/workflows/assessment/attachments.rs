use std::collections::HashSet;
use std::sync::Arc;

use super::domain::{Attachment, AttachmentId, CriterionKey, UnitId};
use super::evidence::{EvidenceError, EvidenceGateway, EvidenceUpload};

/// Merge newly staged attachments into the already-linked list.
///
/// Names already present in `existing` are dropped silently; survivors are
/// appended after the existing entries, preserving their order. Idempotent:
/// merging the same staged set twice yields the same list.
pub fn merge(existing: &[Attachment], staged: &[Attachment]) -> Vec<Attachment> {
    let taken: HashSet<&str> = existing.iter().map(|file| file.name.as_str()).collect();

    let mut merged = existing.to_vec();
    merged.extend(
        staged
            .iter()
            .filter(|file| !taken.contains(file.name.as_str()))
            .cloned(),
    );
    merged
}

/// Drop exactly one attachment matching `target`'s identity (server id for
/// persisted entries, `(seq, name)` for staged ones). The rest of the list
/// is untouched.
pub fn remove(attachments: &[Attachment], target: &Attachment) -> Vec<Attachment> {
    let mut dropped = false;
    attachments
        .iter()
        .filter(|file| {
            if !dropped && file.same_identity(target) {
                dropped = true;
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// Links uploaded evidence to criterion rows through the blob-store gateway.
pub struct EvidenceLinker<G> {
    gateway: Arc<G>,
}

impl<G> EvidenceLinker<G>
where
    G: EvidenceGateway,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Upload `files` for the `(unit, task, seq)` scope and merge the stored
    /// descriptors into `existing`. Duplicate names fall out in the merge.
    pub fn attach(
        &self,
        unit: &UnitId,
        task: &CriterionKey,
        seq: &str,
        existing: &[Attachment],
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, EvidenceError> {
        let staged = self.gateway.upload(unit, task, seq, files)?;
        Ok(merge(existing, &staged))
    }

    /// Remove `target` from the list. The remote store is only involved for
    /// persisted attachments; a staged entry is dropped locally without any
    /// gateway call.
    pub fn detach(
        &self,
        attachments: &[Attachment],
        target: &Attachment,
    ) -> Result<Vec<Attachment>, EvidenceError> {
        if let Some(id) = &target.id {
            self.gateway.delete(id)?;
        }
        Ok(remove(attachments, target))
    }

    /// Delete a persisted attachment by id alone, for callers that no longer
    /// hold the surrounding list.
    pub fn delete_persisted(&self, id: &AttachmentId) -> Result<(), EvidenceError> {
        self.gateway.delete(id)
    }
}
