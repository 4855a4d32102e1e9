//! Container operations: create, read, refresh, modify, delete, annotate.

use serde::Deserialize;
use serde_json::{json, Value};
use soar_model::{
    AttachmentId, Container, ContainerId, HashedObject, Merge, Note, Pin, SoarError,
};
use tracing::{debug, info};

use crate::transport::{invalid_response, ApiRequest, Query};
use crate::SoarClient;

#[derive(Debug, Deserialize)]
struct Comment {
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct Identified {
    id: u64,
}

impl SoarClient {
    /// Creates `container` (with its artifacts and tags) on the server.
    ///
    /// On success the container carries its new id, the server's view of its
    /// fields is merged in, and its artifacts are reloaded.
    ///
    /// # Errors
    ///
    /// [`SoarError::ContainerAlreadyCreated`] or
    /// [`SoarError::ObjectMissingAttributes`] before any request.
    pub async fn create_container(&self, container: &mut Container) -> Result<(), SoarError> {
        container.validate_for_creation("create_container")?;
        let payload = container.creation_payload(true, true);

        let created = self
            .transport
            .json(ApiRequest::post("container").entity(&payload)?)
            .await?;
        let id = created
            .get("id")
            .and_then(Value::as_u64)
            .map(ContainerId::new)
            .ok_or_else(|| invalid_response("container", "creation response carries no id"))?;
        container.id = Some(id);
        info!(container_id = %id, name = %container.name, "Container created");

        let fetched = self.fetch_container(id).await?;
        container.merge(fetched);
        self.update_artifacts(container).await
    }

    /// Containers matching `query`.
    pub async fn get_containers(&self, query: Query) -> Result<Vec<Container>, SoarError> {
        self.transport
            .list(ApiRequest::get("container").query(query))
            .await
    }

    /// Containers matching `query`, each fully refreshed.
    pub async fn get_enriched_containers(&self, query: Query) -> Result<Vec<Container>, SoarError> {
        let mut containers = self.get_containers(query).await?;
        for container in &mut containers {
            self.refresh_container(container).await?;
        }
        Ok(containers)
    }

    /// Pulls the latest state of `container` from the server.
    ///
    /// The container record is merged in, artifacts are replaced, playbook
    /// runs are merged into the declared playbooks, and pins, comments and
    /// notes are reloaded.
    pub async fn refresh_container(&self, container: &mut Container) -> Result<(), SoarError> {
        let id = container.require_id("refresh_container")?;
        debug!(container_id = %id, "Refreshing container");

        let fetched = self.fetch_container(id).await?;
        container.merge(fetched);

        container.artifacts = self
            .get_artifacts(Query::new().int("_filter_container__exact", id.as_u64()))
            .await?;
        let runs = self
            .get_playbook_runs(Query::new().int("_filter_container__exact", id.as_u64()))
            .await?;
        container.absorb_playbook_runs(runs);

        container.pins = self.get_pins(id).await?;
        container.comments = self.get_comments(id).await?;
        container.notes = self.get_notes(id).await?;
        Ok(())
    }

    /// Sends the container-only fields of `container` to the server.
    pub async fn modify_container(&self, container: &Container) -> Result<(), SoarError> {
        let id = container.require_id("modify_container")?;
        self.transport
            .json(ApiRequest::post(format!("container/{id}")).entity(&container.container_only())?)
            .await?;
        Ok(())
    }

    /// Deletes `containers` in one request and clears their ids.
    pub async fn delete_containers(&self, containers: &mut [Container]) -> Result<(), SoarError> {
        let ids = containers
            .iter()
            .map(|container| container.require_id("delete_containers"))
            .collect::<Result<Vec<_>, _>>()?;
        self.transport
            .json(ApiRequest::delete("container").query(Query::new().list("ids", &ids)))
            .await?;
        for container in containers.iter_mut() {
            container.id = None;
        }
        info!(count = ids.len(), "Containers deleted");
        Ok(())
    }

    /// Deletes one container and clears its id.
    pub async fn delete_container(&self, container: &mut Container) -> Result<(), SoarError> {
        self.delete_containers(std::slice::from_mut(container)).await
    }

    /// Posts a comment and appends it to `container.comments`.
    pub async fn add_comment(
        &self,
        container: &mut Container,
        comment: impl Into<String>,
    ) -> Result<(), SoarError> {
        let id = container.require_id("add_comment")?;
        let comment = comment.into();
        self.transport
            .json(
                ApiRequest::post("container_comment")
                    .json(json!({ "container": id, "comment": comment })),
            )
            .await?;
        container.comments.push(comment);
        Ok(())
    }

    /// Comment texts on the container.
    pub async fn get_comments(&self, id: ContainerId) -> Result<Vec<String>, SoarError> {
        let comments: Vec<Comment> = self
            .transport
            .list(ApiRequest::get(format!("container/{id}/comments")))
            .await?;
        Ok(comments.into_iter().map(|comment| comment.comment).collect())
    }

    /// Notes on the container, most recently modified first.
    pub async fn get_notes(&self, id: ContainerId) -> Result<Vec<Note>, SoarError> {
        let query = Query::new()
            .int("_filter_container_id", id.as_u64())
            .flag("pretty", true)
            .int("page", 0)
            .int("page_size", 100)
            .text("order", "desc")
            .text("sort", "modified_time")
            .flag("_annotation_container_attachments", true);
        self.transport
            .list(ApiRequest::get("note").query(query))
            .await
    }

    /// Creates `note` on the container and reloads `container.notes`.
    pub async fn create_note(
        &self,
        container: &mut Container,
        note: &Note,
    ) -> Result<(), SoarError> {
        let id = container.require_id("create_note")?;
        let payload = json!({
            "attachments": [],
            "container_id": id,
            "content": note.content,
            "title": note.title,
            "note_format": note.format,
            "note_type": note.kind,
        });
        self.transport
            .json(ApiRequest::post("note").json(payload))
            .await?;
        container.notes = self.get_notes(id).await?;
        Ok(())
    }

    /// Pins on the container.
    pub async fn get_pins(&self, id: ContainerId) -> Result<Vec<Pin>, SoarError> {
        self.transport
            .list(ApiRequest::get(format!("container/{id}/pins")))
            .await
    }

    /// Ids of the vault attachments of the container.
    pub async fn get_container_attachment_ids(
        &self,
        id: ContainerId,
    ) -> Result<Vec<AttachmentId>, SoarError> {
        let attachments: Vec<Identified> = self
            .transport
            .list(ApiRequest::get(format!("container/{id}/attachments")))
            .await?;
        Ok(attachments
            .into_iter()
            .map(|attachment| AttachmentId::new(attachment.id))
            .collect())
    }

    /// Id of the artifact or container whose server-computed hash is `hash`.
    pub async fn find_by_hash(&self, hash: &str, kind: HashedObject) -> Result<u64, SoarError> {
        let matches: Vec<Identified> = self
            .transport
            .list(ApiRequest::get(kind.endpoint()).query(Query::new().text("_filter_hash", hash)))
            .await?;
        matches
            .first()
            .map(|found| found.id)
            .ok_or_else(|| SoarError::NotFound {
                what: kind.endpoint(),
                name: hash.to_string(),
            })
    }

    async fn fetch_container(&self, id: ContainerId) -> Result<Container, SoarError> {
        self.get_containers(Query::new().int("_filter_id", id.as_u64()))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SoarError::NotFound {
                what: "container",
                name: id.to_string(),
            })
    }
}
