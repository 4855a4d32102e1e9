//! Artifact operations.

use serde_json::Value;
use soar_model::{Artifact, ArtifactId, Container, SoarError};
use tracing::info;

use crate::transport::{invalid_response, ApiRequest, Query};
use crate::SoarClient;

/// Artifacts fetched per container reload.
const ARTIFACT_PAGE_SIZE: u64 = 1000;

impl SoarClient {
    /// Creates every not-yet-created artifact of `container`, plus `extra`,
    /// then reloads `container.artifacts` from the server.
    ///
    /// # Errors
    ///
    /// [`SoarError::ContainerNotInitialized`] or
    /// [`SoarError::ObjectMissingAttributes`] before any request.
    pub async fn create_artifacts(
        &self,
        container: &mut Container,
        extra: Vec<Artifact>,
    ) -> Result<(), SoarError> {
        let id = container.require_id("create_artifacts")?;
        let mut pending: Vec<Artifact> = container
            .artifacts
            .iter()
            .filter(|artifact| !artifact.is_created())
            .cloned()
            .chain(extra)
            .collect();
        for artifact in &pending {
            artifact.validate_for_creation()?;
        }

        for artifact in &mut pending {
            artifact.container = Some(id);
            let created = self
                .transport
                .json(ApiRequest::post("artifact").entity(&artifact.creation_payload())?)
                .await?;
            let artifact_id = created
                .get("id")
                .and_then(Value::as_u64)
                .ok_or_else(|| invalid_response("artifact", "creation response carries no id"))?;
            artifact.id = Some(ArtifactId::new(artifact_id));
        }
        info!(container_id = %id, count = pending.len(), "Artifacts created");

        self.update_artifacts(container).await
    }

    /// Artifacts matching `query`.
    pub async fn get_artifacts(&self, query: Query) -> Result<Vec<Artifact>, SoarError> {
        self.transport
            .list(ApiRequest::get("artifact").query(query))
            .await
    }

    /// Replaces `container.artifacts` with the server's list.
    pub async fn update_artifacts(&self, container: &mut Container) -> Result<(), SoarError> {
        let id = container.require_id("update_artifacts")?;
        let query = Query::new()
            .int("page_size", ARTIFACT_PAGE_SIZE)
            .text("_filter_container", id.to_string());
        container.artifacts = self.get_artifacts(query).await?;
        Ok(())
    }

    /// Deletes `artifact` and clears its id and container reference.
    pub async fn delete_artifact(&self, artifact: &mut Artifact) -> Result<(), SoarError> {
        let id = artifact.id.ok_or(SoarError::ArtifactNotInitialized {
            operation: "delete_artifact",
        })?;
        self.delete_artifact_by_id(id).await?;
        artifact.id = None;
        artifact.container = None;
        Ok(())
    }

    /// Deletes the artifact with id `id`.
    pub async fn delete_artifact_by_id(&self, id: ArtifactId) -> Result<(), SoarError> {
        self.transport
            .json(ApiRequest::delete(format!("artifact/{id}")))
            .await?;
        info!(artifact_id = %id, "Artifact deleted");
        Ok(())
    }
}
