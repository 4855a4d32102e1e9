//! Playbook runs, their logs, and the approvals they raise.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::entities::Action;
use crate::sparse::entity;
use crate::{
    ActionRunId, ApprovalId, ContainerId, PlaybookId, PlaybookRunId, PlaybookTarget, SoarError,
    Timestamp,
};

/// `message_type` value marking an exception-class log entry.
pub const EXCEPTION_MESSAGE_TYPE: u64 = 0;

entity! {
    /// One run of a named automation workflow against a container.
    ///
    /// Declared locally with a name (or definition id) and the responses to
    /// any prompts the workflow may raise; the run id is assigned when the run
    /// starts. Actions and logs are only populated by a refresh.
    #[derive(PartialEq)]
    "playbook" => pub struct Playbook {
        /// Run identity; `None` until the run has been started.
        #[serde(rename = "id")]
        pub run_id: Option<PlaybookRunId>,
        /// Definition identity (the workflow, shared by all its runs).
        #[serde(rename = "playbook")]
        pub playbook_id: Option<PlaybookId>,
        /// Workflow name, optionally prefixed with its repository.
        pub name: String,
        /// Display name reported on run records.
        #[serde(rename = "_pretty_playbook")]
        pub pretty_name: String,
        /// Prompt name → responses to submit, in order.
        pub prompts: BTreeMap<String, Vec<String>>,
        pub status: String,
        pub message: String,
        pub container: Option<ContainerId>,
        pub start_time: Option<Timestamp>,
        pub update_time: Option<Timestamp>,
        pub misc: Value,
        pub run_data: Value,
        pub inputs: Value,
        pub outputs: Value,
        pub targets: Vec<Value>,
        pub log_level: Option<u64>,
        pub test_mode: Option<bool>,
        pub effective_user: Option<u64>,
        pub parent_run: Option<PlaybookRunId>,
        pub actions: Vec<Action>,
        pub logs: Vec<PlaybookLog>,
    }
}

entity! {
    /// A playbook definition: the workflow itself, shared by all its runs.
    #[derive(PartialEq)]
    "playbook definition" => pub struct PlaybookDefinition {
        pub id: Option<PlaybookId>,
        pub name: String,
        /// Source repository id.
        pub scm: Option<u64>,
        #[serde(rename = "_pretty_scm")]
        pub repository: String,
        pub description: String,
        pub category: String,
        pub playbook_type: String,
        pub python_version: String,
        pub active: bool,
        pub latest: bool,
        pub draft_mode: bool,
        pub disabled: bool,
        pub labels: Vec<String>,
        pub tags: Vec<String>,
        pub version: Option<u64>,
        /// Visual editor data, including the editor notes.
        pub coa_data: Value,
        pub create_time: Option<Timestamp>,
        pub update_time: Option<Timestamp>,
    }
}

entity! {
    /// One log line of a playbook run.
    #[derive(PartialEq)]
    "playbook log" => pub struct PlaybookLog {
        pub message: String,
        pub time: Option<Timestamp>,
        /// [`EXCEPTION_MESSAGE_TYPE`] marks exceptions; higher values are
        /// informational.
        pub message_type: Option<u64>,
    }
}

entity! {
    /// An interactive prompt raised by a running playbook.
    #[derive(PartialEq)]
    "approval" => pub struct Approval {
        pub id: Option<ApprovalId>,
        /// Prompt name, matched against [`Playbook::prompts`].
        pub name: String,
        pub status: String,
        pub message: String,
        pub action_run: Option<ActionRunId>,
        pub start_time: Option<Timestamp>,
    }
}

impl PlaybookDefinition {
    /// Notes written in the visual editor, if any.
    pub fn notes(&self) -> Option<&str> {
        self.coa_data.get("notes")?.as_str()
    }
}

impl PlaybookLog {
    /// Returns `true` for exception-class entries.
    pub fn is_exception(&self) -> bool {
        self.message_type == Some(EXCEPTION_MESSAGE_TYPE)
    }
}

impl Playbook {
    /// Declares a playbook to run by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declares a playbook to run by definition id.
    pub fn from_id(playbook_id: PlaybookId) -> Self {
        Self {
            playbook_id: Some(playbook_id),
            ..Self::default()
        }
    }

    /// Adds the responses to submit when the prompt `name` is raised.
    #[must_use]
    pub fn with_prompt<I, S>(mut self, name: impl Into<String>, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prompts
            .insert(name.into(), responses.into_iter().map(Into::into).collect());
        self
    }

    /// Returns `true` once a run id has been assigned.
    pub fn is_started(&self) -> bool {
        self.run_id.is_some()
    }

    /// The name to show for this playbook: the declared name, else the name
    /// reported on the run record, else the definition id.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if !self.pretty_name.is_empty() {
            self.pretty_name.clone()
        } else if let Some(id) = self.playbook_id {
            format!("#{id}")
        } else {
            String::new()
        }
    }

    /// The workflow name without its repository prefix.
    pub fn short_name(&self) -> &str {
        let name = if self.name.is_empty() {
            &self.pretty_name
        } else {
            &self.name
        };
        short_name(name)
    }

    /// How a start request should name this workflow.
    pub fn target(&self) -> Result<PlaybookTarget, SoarError> {
        match (self.playbook_id, self.name.is_empty()) {
            (Some(id), _) => Ok(PlaybookTarget::Id(id)),
            (None, false) => Ok(PlaybookTarget::Name(self.name.clone())),
            (None, true) => Err(SoarError::ObjectMissingAttributes {
                message: "playbook must have a name or a definition id".into(),
            }),
        }
    }

    /// Responses configured for the prompt `name`.
    pub fn responses_for(&self, name: &str) -> Option<&[String]> {
        self.prompts.get(name).map(Vec::as_slice)
    }

    /// Exception-class log entries, in log order.
    pub fn exceptions(&self) -> impl Iterator<Item = &PlaybookLog> {
        self.logs.iter().filter(|log| log.is_exception())
    }

    /// Whether any exception-class log entry exists. Computed on every call.
    pub fn exception_occurred(&self) -> bool {
        self.exceptions().next().is_some()
    }

    /// Concatenated text of every exception-class log entry.
    pub fn exception_message(&self) -> String {
        self.exceptions().map(|log| log.message.as_str()).collect()
    }

    /// Run id of the parent playbook, for runs started by another playbook.
    pub fn parent_playbook_run_id(&self) -> Option<PlaybookRunId> {
        self.parent_run_record()?
            .get("parent_playbook_run_id")?
            .as_u64()
            .map(PlaybookRunId::new)
    }

    /// Name of the parent playbook, for runs started by another playbook.
    pub fn parent_playbook_name(&self) -> Option<&str> {
        self.parent_run_record()?
            .get("parent_playbook_name")?
            .as_str()
    }

    fn parent_run_record(&self) -> Option<&Value> {
        self.misc.get("parent_playbook_run").filter(|v| !v.is_null())
    }

    /// First collected action named `name`.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Ids of all collected actions.
    pub fn action_ids(&self) -> Vec<ActionRunId> {
        self.actions.iter().filter_map(|action| action.id).collect()
    }
}

/// Strips a `repo/` prefix from a playbook name.
pub(crate) fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}
