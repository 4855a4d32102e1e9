//! Port traits implemented by infrastructure crates.
//!
//! The orchestrator in `soar-orchestrator` drives playbook runs exclusively
//! through [`PlaybookEngine`]; the REST client in `soar-client` supplies the
//! implementation. Tests supply scripted fakes.

use async_trait::async_trait;

use crate::{Approval, Container, ContainerId, Playbook, PlaybookRunId, RunScope, SoarError};

/// The remote automation engine as seen by the orchestrator.
///
/// Every call is a single request/response exchange. Implementations must not
/// retry on their own; failures surface as [`SoarError`] and end the
/// orchestration.
#[async_trait]
pub trait PlaybookEngine: Send + Sync {
    /// Starts `playbook` against `container` and returns the new run id.
    async fn start_run(
        &self,
        container: ContainerId,
        playbook: &Playbook,
        scope: &RunScope,
    ) -> Result<PlaybookRunId, SoarError>;

    /// Returns `true` while any playbook run on `container` is still running.
    async fn is_running(&self, container: ContainerId) -> Result<bool, SoarError>;

    /// Pending approvals raised on `container`, oldest first.
    async fn pending_approvals(&self, container: ContainerId) -> Result<Vec<Approval>, SoarError>;

    /// Submits `responses` to the approval `approval`.
    async fn answer_approval(
        &self,
        approval: &Approval,
        responses: &[String],
    ) -> Result<(), SoarError>;

    /// Re-reads `container` (including playbook runs, their actions and logs)
    /// and merges the result into it.
    async fn refresh_container(&self, container: &mut Container) -> Result<(), SoarError>;
}
