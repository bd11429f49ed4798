use std::fmt::Debug;
use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Runtime;

use super::domain::{Attachment, AttachmentId, CriterionKey, UnitId};

/// One file handed over for upload, before the blob store has seen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceUpload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum EvidenceError {
    #[error("evidence store operation failed: {0}")]
    Backend(String),
    #[error("evidence runtime unavailable: {0}")]
    Runtime(String),
}

/// Outbound adapter for the blob store holding uploaded evidence. The
/// returned attachments carry the server-issued id and URL; deletion takes
/// that id. Staged (never uploaded) attachments never reach this trait.
pub trait EvidenceGateway: Debug + Send + Sync {
    fn upload(
        &self,
        unit: &UnitId,
        task: &CriterionKey,
        seq: &str,
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, EvidenceError>;

    fn delete(&self, id: &AttachmentId) -> Result<(), EvidenceError>;
}

/// Drive-backed evidence store. Wraps the async hub in its own runtime so
/// the synchronous workflow code never sees async plumbing.
pub struct GoogleDriveEvidence<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Runtime,
    folder_id: String,
}

impl<C> GoogleDriveEvidence<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    pub fn new(hub: DriveHub<C>, runtime: Runtime, folder_id: String) -> Self {
        Self {
            hub,
            runtime,
            folder_id,
        }
    }

    pub fn with_runtime(hub: DriveHub<C>, folder_id: String) -> Result<Self, EvidenceError> {
        let runtime = Runtime::new().map_err(|err| EvidenceError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime, folder_id))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> EvidenceError {
        EvidenceError::Backend(err.to_string())
    }

    fn mime_for(content_type: Option<&str>) -> mime::Mime {
        content_type
            .and_then(|value| value.parse().ok())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }
}

impl<C> std::fmt::Debug for GoogleDriveEvidence<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveEvidence")
            .field("folder_id", &self.folder_id)
            .finish_non_exhaustive()
    }
}

impl<C> EvidenceGateway for GoogleDriveEvidence<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn upload(
        &self,
        unit: &UnitId,
        task: &CriterionKey,
        seq: &str,
        files: Vec<EvidenceUpload>,
    ) -> Result<Vec<Attachment>, EvidenceError> {
        let mut attachments = Vec::with_capacity(files.len());

        for upload in files {
            let metadata = File {
                name: Some(format!("{unit}/{task}/{seq}/{}", upload.name)),
                parents: Some(vec![self.folder_id.clone()]),
                ..File::default()
            };

            let media_type = Self::mime_for(upload.content_type.as_deref());
            let cursor = Cursor::new(upload.bytes);

            let result = self.runtime.block_on(async {
                self.hub
                    .files()
                    .create(metadata)
                    .param("fields", "id,webViewLink")
                    .supports_all_drives(true)
                    .add_scope(Scope::File)
                    .upload(cursor, media_type)
                    .await
            });

            let (_, file) = result.map_err(GoogleDriveEvidence::<C>::map_error)?;
            attachments.push(Attachment {
                id: Some(AttachmentId(file.id.unwrap_or_default())),
                name: upload.name,
                url: file.web_view_link.unwrap_or_default(),
                seq: seq.to_string(),
            });
        }

        Ok(attachments)
    }

    fn delete(&self, id: &AttachmentId) -> Result<(), EvidenceError> {
        let file_id = id.0.clone();
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .delete(&file_id)
                .supports_all_drives(true)
                .add_scope(Scope::File)
                .doit()
                .await
        });

        result
            .map(|_| ())
            .map_err(GoogleDriveEvidence::<C>::map_error)
    }
}
