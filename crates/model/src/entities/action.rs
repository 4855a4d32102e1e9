//! Action runs and the app-run reports that enrich them.

use serde_json::Value;

use crate::sparse::entity;
use crate::{ActionRunId, AppId, AppRunId, ContainerId, PlaybookRunId, Timestamp};

entity! {
    /// A single automated step executed within a playbook run.
    ///
    /// Read from the `action_run` endpoint, then enriched from the matching
    /// `app_run` report (see [`Action::enrich`]).
    #[derive(PartialEq)]
    "action" => pub struct Action {
        pub id: Option<ActionRunId>,
        pub name: String,
        /// Action verb (e.g. `"geolocate ip"`).
        pub action: String,
        pub app: Option<AppId>,
        #[serde(rename = "_pretty_app")]
        pub app_name: String,
        #[serde(rename = "_pretty_asset")]
        pub asset_name: String,
        pub app_run: Option<AppRunId>,
        pub app_version: String,
        pub container: Option<ContainerId>,
        pub playbook_run: Option<PlaybookRunId>,
        pub status: String,
        pub message: String,
        /// Message reported by the app itself.
        pub app_message: String,
        pub handle: String,
        pub exception_occurred: Option<bool>,
        pub result_summary: Value,
        pub result_data: Vec<Value>,
        pub extra_data: Vec<Value>,
        pub effective_user: Option<u64>,
        pub version: Option<u64>,
        pub create_time: Option<Timestamp>,
        pub start_time: Option<Timestamp>,
        pub end_time: Option<Timestamp>,
    }
}

entity! {
    /// Execution report of an app for one action run.
    #[derive(PartialEq)]
    "app run" => pub struct AppRun {
        pub id: Option<AppRunId>,
        pub action_run: Option<ActionRunId>,
        pub app_name: String,
        pub app_version: String,
        pub status: String,
        pub exception_occurred: Option<bool>,
        pub message: String,
        pub result_summary: Value,
        pub result_data: Vec<Value>,
    }
}

entity! {
    /// An action offered by an installed app, as listed by the action builder.
    #[derive(PartialEq)]
    "action definition" => pub struct ActionDefinition {
        pub id: Option<u64>,
        pub name: String,
        pub action: String,
        pub description: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub identifier: String,
        pub app: Option<AppId>,
        pub parameters: Value,
        pub read_only: Option<bool>,
    }
}

impl Action {
    /// Copies execution metadata from the app run backing this action.
    ///
    /// The report is authoritative for the fields it carries, so they are
    /// assigned rather than merged.
    pub fn enrich(&mut self, report: AppRun) {
        self.app_name = report.app_name;
        self.app_run = report.id;
        self.app_version = report.app_version;
        self.exception_occurred = report.exception_occurred;
        self.app_message = report.message;
        self.result_summary = report.result_summary;
        self.result_data = report.result_data;
    }
}
