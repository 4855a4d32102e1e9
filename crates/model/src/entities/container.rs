//! Container: the case/incident record and its owned sub-collections.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::entities::short_name;
use crate::entities::{Action, Artifact, Note, Pin, Playbook};
use crate::sparse::{entity, Merge};
use crate::{ArtifactId, ContainerId, PlaybookId, PlaybookRunId, SoarError, Timestamp};

entity! {
    /// A case/incident record on the remote platform.
    ///
    /// Constructed locally without an id, created remotely (id assigned), then
    /// refreshed repeatedly. Artifacts, playbooks, pins, notes, and comments are
    /// owned sub-collections replaced or merged on refresh.
    #[derive(PartialEq)]
    "container" => pub struct Container {
        /// Server-assigned identity; `None` until created and after deletion.
        pub id: Option<ContainerId>,
        pub name: String,
        pub label: String,
        pub description: String,
        pub status: String,
        pub severity: String,
        pub sensitivity: String,
        pub tags: Vec<String>,
        pub custom_fields: BTreeMap<String, Value>,
        pub owner_id: Option<u64>,
        pub owner_name: String,
        pub kill_chain: String,
        pub workflow_name: String,
        pub container_type: String,
        pub source_data_identifier: String,
        pub run_automation: bool,
        pub in_case: bool,
        pub tenant_id: Option<u64>,
        pub hash: String,
        pub data: Value,
        pub create_time: Option<Timestamp>,
        pub start_time: Option<Timestamp>,
        pub end_time: Option<Timestamp>,
        pub due_time: Option<Timestamp>,
        pub close_time: Option<Timestamp>,
        pub artifacts: Vec<Artifact>,
        pub playbooks: Vec<Playbook>,
        pub pins: Vec<Pin>,
        pub notes: Vec<Note>,
        pub comments: Vec<String>,
    }
}

impl Container {
    /// Creates an uncreated container with a name and label.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// A handle to an existing container, by id only.
    pub fn with_id(id: ContainerId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Returns `true` once the container carries a server-assigned id.
    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    /// Returns the container id or a "container not initialized" error naming
    /// `operation`.
    pub fn require_id(&self, operation: &'static str) -> Result<ContainerId, SoarError> {
        self.id
            .ok_or(SoarError::ContainerNotInitialized { operation })
    }

    /// Checks the container can be created: no id yet, a name or label, and
    /// every attached artifact named or labelled.
    pub fn validate_for_creation(&self, operation: &'static str) -> Result<(), SoarError> {
        if let Some(id) = self.id {
            return Err(SoarError::ContainerAlreadyCreated { operation, id });
        }
        if self.name.is_empty() && self.label.is_empty() {
            return Err(SoarError::ObjectMissingAttributes {
                message: format!("{operation}: container must have a name or a label"),
            });
        }
        if let Some(position) = self
            .artifacts
            .iter()
            .position(|artifact| artifact.validate_for_creation().is_err())
        {
            return Err(SoarError::ObjectMissingAttributes {
                message: format!(
                    "{operation}: artifact #{position} of container '{}' must have a name or a label",
                    self.name
                ),
            });
        }
        Ok(())
    }

    /// Returns a copy holding only the fields accepted at creation or update.
    ///
    /// Does not modify `self`. Server-managed fields and the playbook, pin,
    /// note, and comment collections are never included.
    pub fn creation_payload(&self, include_artifacts: bool, include_tags: bool) -> Container {
        let mut payload = Container {
            id: self.id,
            name: self.name.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            status: self.status.clone(),
            severity: self.severity.clone(),
            sensitivity: self.sensitivity.clone(),
            custom_fields: self.custom_fields.clone(),
            owner_id: self.owner_id,
            owner_name: self.owner_name.clone(),
            kill_chain: self.kill_chain.clone(),
            workflow_name: self.workflow_name.clone(),
            container_type: self.container_type.clone(),
            ..Container::default()
        };
        if include_artifacts {
            payload.artifacts = self
                .artifacts
                .iter()
                .map(Artifact::creation_payload)
                .collect();
        }
        if include_tags {
            payload.tags = self.tags.clone();
        }
        payload
    }

    /// The update payload: container fields only, no artifacts or tags.
    pub fn container_only(&self) -> Container {
        self.creation_payload(false, false)
    }

    // -----------------------------------------------------------------------
    // Sub-collections
    // -----------------------------------------------------------------------

    /// Attaches an artifact, pointing its container reference at this container.
    pub fn add_artifact(&mut self, mut artifact: Artifact) {
        artifact.container = self.id;
        self.artifacts.push(artifact);
    }

    /// Attaches a playbook to run.
    pub fn add_playbook(&mut self, playbook: Playbook) {
        self.playbooks.push(playbook);
    }

    /// Attaches a pin.
    pub fn add_pin(&mut self, pin: Pin) {
        self.pins.push(pin);
    }

    /// First artifact with the given name.
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.name == name)
    }

    /// First artifact with the given label.
    pub fn artifact_by_label(&self, label: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.label == label)
    }

    /// The artifact with the given id.
    pub fn artifact_by_id(&self, id: ArtifactId) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.id == Some(id))
    }

    /// Distinct ids of created artifacts.
    pub fn artifact_ids(&self) -> BTreeSet<ArtifactId> {
        self.artifacts.iter().filter_map(|artifact| artifact.id).collect()
    }

    /// Artifact names, in collection order.
    pub fn artifact_names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|artifact| artifact.name.as_str()).collect()
    }

    /// Playbook whose name matches `name`, ignoring any `repo/` prefix on
    /// either side.
    pub fn playbook(&self, name: &str) -> Option<&Playbook> {
        let wanted = short_name(name);
        self.playbooks
            .iter()
            .find(|playbook| playbook.short_name() == wanted)
    }

    /// The playbook with the given run id.
    pub fn playbook_by_run(&self, run_id: PlaybookRunId) -> Option<&Playbook> {
        self.playbooks
            .iter()
            .find(|playbook| playbook.run_id == Some(run_id))
    }

    /// The run of definition `playbook_id` with run id `run_id`.
    pub fn playbook_by_definition(
        &self,
        playbook_id: PlaybookId,
        run_id: PlaybookRunId,
    ) -> Option<&Playbook> {
        self.playbooks.iter().find(|playbook| {
            playbook.playbook_id == Some(playbook_id) && playbook.run_id == Some(run_id)
        })
    }

    /// Distinct names of playbooks on the container.
    pub fn playbook_names(&self) -> BTreeSet<String> {
        self.playbooks.iter().map(Playbook::display_name).collect()
    }

    /// Distinct names of actions run by any playbook on the container.
    pub fn action_names(&self) -> BTreeSet<&str> {
        self.playbooks
            .iter()
            .flat_map(|playbook| playbook.actions.iter())
            .map(|action| action.name.as_str())
            .collect()
    }

    /// Every action named `name`, across all playbooks.
    pub fn actions_named(&self, name: &str) -> Vec<&Action> {
        self.playbooks
            .iter()
            .flat_map(|playbook| playbook.actions.iter())
            .filter(|action| action.name == name)
            .collect()
    }

    /// First playbook whose logs contain exception-class entries.
    pub fn first_failed_playbook(&self) -> Option<&Playbook> {
        self.playbooks.iter().find(|playbook| playbook.exception_occurred())
    }

    /// Merges freshly fetched run records into the declared playbooks.
    ///
    /// A record is merged into the playbook with the same run id; failing
    /// that, into a not-yet-started playbook with the same short name.
    /// Records matching neither are appended. Declared prompt mappings survive
    /// because an empty incoming mapping never overwrites.
    pub fn absorb_playbook_runs(&mut self, runs: Vec<Playbook>) {
        for run in runs {
            let by_run = run.run_id.and_then(|run_id| {
                self.playbooks
                    .iter()
                    .position(|declared| declared.run_id == Some(run_id))
            });
            let slot = by_run.or_else(|| {
                self.playbooks.iter().position(|declared| {
                    !declared.is_started() && declared.short_name() == run.short_name()
                })
            });
            match slot {
                Some(index) => self.playbooks[index].merge(run),
                None => self.playbooks.push(run),
            }
        }
    }
}
