//! Container export and chunked file upload.

use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};
use soar_model::{Container, ContainerId, SoarError};
use tracing::info;

use crate::transport::{invalid_response, ApiRequest, FilePart, Query};
use crate::SoarClient;

/// Where an uploaded file goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// Attach the file to an existing container's vault.
    Container(ContainerId),
    /// Import the file as a new container.
    ContainerImport,
}

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub upload_id: String,
    /// Hex SHA-256 digest sent with the completion request.
    pub sha256: String,
}

impl SoarClient {
    /// Downloads `container` (refreshed first) as `container-<id>.tgz` under
    /// `dir` and returns the written path.
    pub async fn export_container(
        &self,
        container: &mut Container,
        dir: &Path,
        include_attachments: bool,
    ) -> Result<PathBuf, SoarError> {
        let id = container.require_id("export_container")?;
        self.refresh_container(container).await?;

        let file_name = format!("container-{id}.tgz");
        let mut query = Query::new()
            .text("Filename", file_name.clone())
            .text("Content-Type", "application/-gzip");
        if include_attachments {
            let attachments = self.get_container_attachment_ids(id).await?;
            query = query.list("file_list[]", attachments);
        }
        let archive = self
            .transport
            .raw(ApiRequest::get(format!("container/{id}/export")).query(query))
            .await?;

        let path = dir.join(&file_name);
        tokio::fs::write(&path, &archive.body)
            .await
            .map_err(|source| SoarError::Io {
                path: path.clone(),
                source,
            })?;
        info!(
            container_id = %id,
            path = %path.display(),
            bytes = archive.body.len(),
            "Container exported"
        );
        Ok(path)
    }

    /// Uploads the file at `path` and completes the upload with its SHA-256
    /// digest.
    pub async fn upload_file(
        &self,
        path: &Path,
        target: UploadTarget,
    ) -> Result<UploadReceipt, SoarError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| SoarError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sha256 = hex::encode(Sha256::digest(&bytes));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let upload_url = format!("{}upload_chunked", self.base_url());
        let file = FilePart {
            field: "file".into(),
            file_name,
            bytes,
        };
        let request = match target {
            UploadTarget::Container(id) => ApiRequest::post(&upload_url)
                .header(
                    "Referer",
                    format!("{}mission/{id}/analyst/files/", self.transport.rest_url()),
                )
                .multipart(vec![("container_id".into(), id.to_string())], file),
            UploadTarget::ContainerImport => ApiRequest::post(&upload_url)
                .query(Query::new().flag("import_container", true))
                .multipart(Vec::new(), file),
        };
        let started = self.transport.json(request).await?;
        let upload_id = match started.get("upload_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(invalid_response(&upload_url, "upload response carries no upload_id")),
        };

        self.transport
            .json(
                ApiRequest::post(format!("{}upload_chunked_complete", self.base_url()))
                    .form([("upload_id", upload_id.as_str()), ("sha256", sha256.as_str())]),
            )
            .await?;
        info!(upload_id = %upload_id, "Upload completed");
        Ok(UploadReceipt { upload_id, sha256 })
    }
}
