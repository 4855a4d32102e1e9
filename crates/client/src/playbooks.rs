//! Playbook definitions, playbook runs, action runs and their logs.

use serde::Deserialize;
use soar_model::{
    Action, AppRun, Container, ContainerId, Playbook, PlaybookDefinition, PlaybookId, PlaybookLog,
    PlaybookRunId, SoarError,
};
use tracing::debug;

use crate::transport::{invalid_response, ApiRequest, Query};
use crate::SoarClient;

#[derive(Debug, Deserialize)]
struct RunContainer {
    container: Option<ContainerId>,
}

impl SoarClient {
    /// Playbook definitions matching `query`.
    pub async fn get_playbooks(&self, query: Query) -> Result<Vec<PlaybookDefinition>, SoarError> {
        self.transport
            .list(ApiRequest::get("playbook").query(query))
            .await
    }

    /// Playbook runs matching `query`, each with its actions, resolved name
    /// and logs.
    pub async fn get_playbook_runs(&self, query: Query) -> Result<Vec<Playbook>, SoarError> {
        let query = query.flag("include_expensive", true);
        let mut runs: Vec<Playbook> = self
            .transport
            .list(ApiRequest::get("playbook_run").query(query))
            .await?;
        for run in &mut runs {
            if let Some(run_id) = run.run_id {
                run.actions = self
                    .get_action_runs(Query::new().int("_filter_playbook_run", run_id.as_u64()))
                    .await?;
                run.logs = self.get_playbook_logs(run_id).await?;
            }
            if let Some(playbook_id) = run.playbook_id {
                run.name = self.get_playbook_name(playbook_id).await?;
            }
        }
        Ok(runs)
    }

    /// Every log entry of the run, in time order.
    pub async fn get_playbook_logs(
        &self,
        run_id: PlaybookRunId,
    ) -> Result<Vec<PlaybookLog>, SoarError> {
        let query = Query::new().int("page_size", 0).text("sort", "time");
        self.transport
            .list(ApiRequest::get(format!("playbook_run/{run_id}/log")).query(query))
            .await
    }

    /// Action runs matching `query`, each enriched from its app run reports.
    pub async fn get_action_runs(&self, query: Query) -> Result<Vec<Action>, SoarError> {
        let mut actions: Vec<Action> = self
            .transport
            .list(ApiRequest::get("action_run").query(query))
            .await?;
        for action in &mut actions {
            let Some(action_id) = action.id else { continue };
            let reports = self
                .get_app_runs(Query::new().int("_filter_action_run", action_id.as_u64()))
                .await?;
            for report in reports {
                action.enrich(report);
            }
        }
        Ok(actions)
    }

    /// App run reports matching `query`.
    pub async fn get_app_runs(&self, query: Query) -> Result<Vec<AppRun>, SoarError> {
        let query = query
            .flag("pretty", true)
            .flag("include_expensive", true);
        self.transport
            .list(ApiRequest::get("app_run").query(query))
            .await
    }

    /// Name of the playbook definition `id`.
    pub async fn get_playbook_name(&self, id: PlaybookId) -> Result<String, SoarError> {
        let definition: PlaybookDefinition = self
            .transport
            .decode(ApiRequest::get(format!("playbook/{id}")))
            .await?;
        Ok(definition.name)
    }

    /// Id of the single playbook definition named exactly `name`.
    ///
    /// # Errors
    ///
    /// [`SoarError::NotFound`] when nothing matches and
    /// [`SoarError::AmbiguousPlaybook`] when several definitions do.
    pub async fn resolve_playbook_id(&self, name: &str) -> Result<PlaybookId, SoarError> {
        let matches = self
            .get_playbooks(Query::new().text("_filter_name__exact", name))
            .await?;
        match matches.as_slice() {
            [] => Err(SoarError::NotFound {
                what: "playbook",
                name: name.to_string(),
            }),
            [only] => only
                .id
                .ok_or_else(|| invalid_response("playbook", "playbook record carries no id")),
            _ => Err(SoarError::AmbiguousPlaybook {
                name: name.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// The `count` containers `playbook` most recently ran against, each
    /// fully refreshed.
    ///
    /// `successful` selects runs that ended in success or in failure.
    pub async fn find_containers_from_playbook(
        &self,
        playbook: &Playbook,
        count: u64,
        successful: bool,
    ) -> Result<Vec<Container>, SoarError> {
        let playbook_id = self.definition_id(playbook).await?;
        let query = Query::new()
            .text("sort", "start_time")
            .text("order", "desc")
            .int("_filter_playbook__exact", playbook_id.as_u64())
            .text("_filter_status__exact", if successful { "success" } else { "failed" })
            .int("page_size", count)
            .flag("pretty", true);
        let runs: Vec<RunContainer> = self
            .transport
            .list(ApiRequest::get("playbook_run").query(query))
            .await?;

        let mut containers = Vec::with_capacity(runs.len());
        for id in runs.into_iter().filter_map(|run| run.container) {
            let mut container = Container::with_id(id);
            self.refresh_container(&mut container).await?;
            containers.push(container);
        }
        debug!(
            playbook_id = %playbook_id,
            found = containers.len(),
            "Containers found for playbook"
        );
        Ok(containers)
    }

    /// Notes written on the playbook definition in the visual editor.
    pub async fn get_playbook_notes(&self, playbook: &Playbook) -> Result<String, SoarError> {
        playbook.target()?;
        let mut query = Query::new().flag("include_expensive", true).int("page_size", 1);
        if !playbook.name.is_empty() {
            query = query.text("_filter_name__exact", playbook.name.clone());
        }
        if let Some(id) = playbook.playbook_id {
            query = query.int("_filter_id__exact", id.as_u64());
        }
        let definitions = self.get_playbooks(query).await?;
        definitions
            .first()
            .and_then(PlaybookDefinition::notes)
            .map(str::to_string)
            .ok_or_else(|| SoarError::NotFound {
                what: "playbook notes",
                name: playbook.display_name(),
            })
    }

    /// Marks the playbook definition active or inactive.
    pub async fn set_playbook_active(&self, id: PlaybookId, active: bool) -> Result<(), SoarError> {
        let query = Query::new()
            .flag("active", active)
            .int("id", id.as_u64())
            .flag("toggle", true);
        self.transport
            .json(ApiRequest::post("playbooks").query(query))
            .await?;
        Ok(())
    }

    async fn definition_id(&self, playbook: &Playbook) -> Result<PlaybookId, SoarError> {
        match playbook.playbook_id {
            Some(id) => Ok(id),
            None if !playbook.name.is_empty() => self.resolve_playbook_id(&playbook.name).await,
            None => Err(SoarError::ObjectMissingAttributes {
                message: "playbook must have a name or a definition id".into(),
            }),
        }
    }
}
