//! `soar`: runs one scenario against a SOAR server.
//!
//! This binary is the composition root. It
//!
//! 1. parses the arguments (`clap`) and loads the runner configuration,
//! 2. installs the tracing subscriber (and the OTLP exporter when configured),
//! 3. connects a [`soar_client::SoarClient`] and creates the scenario's
//!    container with its artifacts,
//! 4. runs the scenario's playbooks through a
//!    [`soar_orchestrator::PlaybookExecutor`], answering their prompts,
//! 5. writes the audit log and deletes the container when asked to.

mod args;
mod config;
mod observability;
mod scenario;

use std::process::ExitCode;

use anyhow::Context;
use soar_client::SoarClient;
use soar_model::Container;
use soar_orchestrator::{PlaybookExecutor, RunReport};
use tracing::{error, info, warn};

use crate::args::CliArgs;
use crate::config::RunnerConfig;
use crate::scenario::Scenario;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::try_parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => err.exit(),
    };
    let config = match RunnerConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };
    let telemetry = match observability::init(&config.telemetry) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = run(&args, &config).await;
    let code = match &outcome {
        Ok(report) => {
            info!(
                orchestration_id = %report.orchestration_id,
                container_id = %report.container,
                runs = report.runs.len(),
                "Scenario completed"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            let message = format!("{err:#}");
            error!(error = %message, "Scenario failed");
            ExitCode::FAILURE
        }
    };
    if telemetry.exports_spans() {
        info!("Flushing exported spans");
    }
    telemetry.shutdown();
    code
}

async fn run(args: &CliArgs, config: &RunnerConfig) -> anyhow::Result<RunReport> {
    let scenario = Scenario::from_path(&args.scenario)?;
    let (mut container, playbooks, scope) = scenario.into_parts();

    let client = config
        .client_builder()
        .connect()
        .await
        .with_context(|| format!("failed to connect to {}", config.server.url))?;

    let outcome: anyhow::Result<RunReport> = async {
        client
            .create_container(&mut container)
            .await
            .context("failed to create the scenario container")?;
        PlaybookExecutor::new(&client)
            .run_playbooks(&mut container, playbooks, &scope)
            .await
            .context("playbook run failed")
    }
    .await;

    let report = finish(&client, args, &mut container, outcome).await?;
    for run in &report.runs {
        info!(
            playbook = %run.playbook,
            run_id = ?run.run_id,
            polls = run.polls,
            approvals = run.approvals_answered,
            state = %run.state,
            "Playbook run"
        );
    }
    Ok(report)
}

/// Writes the audit log and deletes the container as requested, then hands
/// back the run's own outcome.
async fn finish(
    client: &SoarClient,
    args: &CliArgs,
    container: &mut Container,
    outcome: anyhow::Result<RunReport>,
) -> anyhow::Result<RunReport> {
    if let Some(path) = &args.audit_log {
        write_audit_log(client, path).await;
    }
    if args.cleanup {
        cleanup(client, container).await;
    }
    outcome
}

/// Writes the audit log. Failures are logged only, like [`cleanup`].
async fn write_audit_log(client: &SoarClient, path: &std::path::Path) {
    match tokio::fs::write(path, client.audit_log().render()).await {
        Ok(()) => {
            info!(path = %path.display(), records = client.audit_log().len(), "Audit log written")
        }
        Err(err) => warn!(path = %path.display(), error = %err, "Audit log write failed"),
    }
}

/// Deletes the container if it was created. Failures are logged only, so
/// the run's own outcome is what the caller sees.
async fn cleanup(client: &SoarClient, container: &mut Container) {
    let Some(id) = container.id else {
        return;
    };
    match client.delete_container(container).await {
        Ok(()) => info!(container_id = %id, "Container deleted"),
        Err(err) => warn!(container_id = %id, error = %err, "Container cleanup failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use soar_model::ContainerId;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn connect(server: &MockServer) -> SoarClient {
        Mock::given(method("GET"))
            .and(path("/rest/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "6.2.1" })))
            .mount(server)
            .await;
        SoarClient::builder(server.uri())
            .token("cli-token")
            .connect()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn unwritable_audit_log_keeps_the_run_error_and_still_cleans_up() {
        let server = MockServer::start().await;
        let client = connect(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/rest/container"))
            .and(query_param("ids", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            scenario: "scenario.toml".into(),
            config: None,
            audit_log: Some(dir.path().join("missing").join("audit.txt")),
            cleanup: true,
        };
        let mut container = Container::with_id(ContainerId::new(42));

        let err = finish(
            &client,
            &args,
            &mut container,
            Err(anyhow::anyhow!("playbook run failed")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "playbook run failed");
        assert!(container.id.is_none());
    }

    #[tokio::test]
    async fn audit_log_is_written_before_the_outcome_is_returned() {
        let server = MockServer::start().await;
        let client = connect(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("audit.txt");
        let args = CliArgs {
            scenario: "scenario.toml".into(),
            config: None,
            audit_log: Some(audit.clone()),
            cleanup: false,
        };
        let mut container = Container::with_id(ContainerId::new(7));

        finish(&client, &args, &mut container, Err(anyhow::anyhow!("failed")))
            .await
            .unwrap_err();

        let written = std::fs::read_to_string(&audit).unwrap();
        assert!(written.contains("/rest/version"));
        assert_eq!(container.id, Some(ContainerId::new(7)));
    }
}
