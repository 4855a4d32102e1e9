//! [`PlaybookEngine`] over the REST API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use soar_model::{
    Approval, Container, ContainerId, Playbook, PlaybookEngine, PlaybookRunId, RunScope, SoarError,
};
use tracing::debug;

use crate::transport::{invalid_response, ApiRequest, Query};
use crate::SoarClient;

/// Pending approvals fetched per poll.
/// Sent as text, so it goes out JSON-quoted like the other approval filters.
const APPROVAL_PAGE_SIZE: &str = "200";

#[derive(Debug, Deserialize)]
struct Count {
    #[serde(default)]
    count: u64,
}

#[async_trait]
impl PlaybookEngine for SoarClient {
    async fn start_run(
        &self,
        container: ContainerId,
        playbook: &Playbook,
        scope: &RunScope,
    ) -> Result<PlaybookRunId, SoarError> {
        let payload = json!({
            "container_id": container,
            "playbook_id": playbook.target()?,
            "scope": scope,
            "run": true,
        });
        let started = self
            .transport
            .json(ApiRequest::post("playbook_run").json(payload))
            .await?;
        started
            .get("playbook_run_id")
            .and_then(Value::as_u64)
            .map(PlaybookRunId::new)
            .ok_or_else(|| {
                invalid_response("playbook_run", "start response carries no playbook_run_id")
            })
    }

    async fn is_running(&self, container: ContainerId) -> Result<bool, SoarError> {
        let query = Query::new()
            .int("_filter_container", container.as_u64())
            .text("_filter_status", "running");
        let running: Count = self
            .transport
            .decode(ApiRequest::get("playbook_run").query(query))
            .await?;
        debug!(container_id = %container, running = running.count, "Polled running playbooks");
        Ok(running.count > 0)
    }

    async fn pending_approvals(&self, container: ContainerId) -> Result<Vec<Approval>, SoarError> {
        let query = Query::new()
            .text("_filter_status", "pending")
            .text("_filter_action_run__container_id", container.to_string())
            .text("order", "asc")
            .text("sort", "start_time")
            .text("page_size", APPROVAL_PAGE_SIZE)
            .flag("pretty", true);
        self.transport
            .list(ApiRequest::get("approval").query(query))
            .await
    }

    async fn answer_approval(
        &self,
        approval: &Approval,
        responses: &[String],
    ) -> Result<(), SoarError> {
        let id = approval.id.ok_or_else(|| SoarError::ObjectMissingAttributes {
            message: format!("approval '{}' carries no id", approval.name),
        })?;
        let payload = json!({
            "status": "approve",
            "type": "manual",
            "action": "prompt",
            "message": "",
            "responses": responses,
        });
        self.transport
            .json(ApiRequest::post(format!("approval/{id}")).json(payload))
            .await?;
        Ok(())
    }

    async fn refresh_container(&self, container: &mut Container) -> Result<(), SoarError> {
        SoarClient::refresh_container(self, container).await
    }
}
