//! Drives playbook runs on one container to completion.

use soar_model::{
    Approval, Container, ContainerId, OrchestrationId, Playbook, PlaybookEngine, PlaybookRunId,
    RunScope, SoarError,
};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::pacer::{FixedInterval, Pacer};
use crate::state::RunState;

const OPERATION: &str = "run_playbooks";

/// Outcome of one started run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Display name of the playbook.
    pub playbook: String,
    /// Run id assigned by the remote engine; `None` if the start failed.
    pub run_id: Option<PlaybookRunId>,
    /// Number of status polls issued for this run.
    pub polls: u32,
    /// Number of approvals answered for this run.
    pub approvals_answered: u32,
    /// Last state the run reached.
    pub state: RunState,
}

impl RunRecord {
    fn new(playbook: String) -> Self {
        Self {
            playbook,
            run_id: None,
            polls: 0,
            approvals_answered: 0,
            state: RunState::NotStarted,
        }
    }
}

/// Summary of one orchestration invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Correlation id recorded on every span of the invocation.
    pub orchestration_id: OrchestrationId,
    /// The container the runs were started on.
    pub container: ContainerId,
    /// One record per started run, in start order.
    pub runs: Vec<RunRecord>,
}

/// Starts playbook runs against a container and drives each one until the
/// remote engine stops reporting it as running.
///
/// Runs are driven strictly one after another. Between two polls of the same
/// run the executor waits on its [`Pacer`].
pub struct PlaybookExecutor<'a, E: ?Sized, P = FixedInterval> {
    engine: &'a E,
    pacer: P,
}

impl<'a, E: PlaybookEngine + ?Sized> PlaybookExecutor<'a, E, FixedInterval> {
    /// Creates an executor pausing [`crate::POLL_INTERVAL`] between polls.
    pub fn new(engine: &'a E) -> Self {
        Self::with_pacer(engine, FixedInterval::default())
    }
}

impl<'a, E: PlaybookEngine + ?Sized, P: Pacer> PlaybookExecutor<'a, E, P> {
    /// Creates an executor with a custom pause between polls.
    pub fn with_pacer(engine: &'a E, pacer: P) -> Self {
        Self { engine, pacer }
    }

    /// Runs every not-yet-started playbook of `container`, plus `extra`.
    ///
    /// Once the preconditions hold, `extra` playbooks are attached to the
    /// container so their prompt responses survive the final refresh. A
    /// failed precondition leaves the container untouched. After every run has completed the
    /// container is refreshed, and the first playbook on it (started in this
    /// call or not) whose logs contain exceptions fails the whole invocation
    /// with [`SoarError::PlaybookException`].
    ///
    /// # Errors
    ///
    /// - [`SoarError::ContainerNotInitialized`] if the container has no id.
    /// - [`SoarError::NoPlaybooks`] if neither the container nor `extra`
    ///   carries a playbook.
    /// - [`SoarError::ObjectMissingAttributes`] if a playbook to start has
    ///   neither a name nor a definition id.
    /// - [`SoarError::MissingApprovalResponse`] if a pending approval has no
    ///   configured response. Nothing is submitted for that poll.
    /// - Any error returned by the engine.
    pub async fn run_playbooks(
        &self,
        container: &mut Container,
        extra: Vec<Playbook>,
        scope: &RunScope,
    ) -> Result<RunReport, SoarError> {
        let container_id = container.require_id(OPERATION)?;
        if container.playbooks.is_empty() && extra.is_empty() {
            return Err(SoarError::NoPlaybooks {
                operation: OPERATION,
            });
        }

        for playbook in container
            .playbooks
            .iter()
            .filter(|playbook| !playbook.is_started())
            .chain(extra.iter())
        {
            playbook.target()?;
        }

        for playbook in extra {
            container.add_playbook(playbook);
        }
        let pending: Vec<usize> = container
            .playbooks
            .iter()
            .enumerate()
            .filter(|(_, playbook)| !playbook.is_started())
            .map(|(index, _)| index)
            .collect();

        let orchestration_id = OrchestrationId::new_random();
        let span = info_span!(
            "run_playbooks",
            orchestration_id = %orchestration_id,
            container_id = %container_id,
        );

        async move {
            info!(runs = pending.len(), "Starting playbook runs");
            let mut report = RunReport {
                orchestration_id,
                container: container_id,
                runs: Vec::with_capacity(pending.len()),
            };

            for index in pending {
                let playbook = &mut container.playbooks[index];
                let mut record = RunRecord::new(playbook.display_name());
                let name = record.playbook.clone();
                let outcome = self
                    .drive(container_id, playbook, scope, &mut record)
                    .instrument(info_span!("playbook_run", playbook = %name))
                    .await;
                report.runs.push(record);
                outcome?;
            }

            self.engine.refresh_container(container).await?;

            if let Some(failed) = container.first_failed_playbook() {
                let playbook = failed.display_name();
                let message = failed.exception_message();
                let run_id = failed.run_id;
                if let Some(record) = report
                    .runs
                    .iter_mut()
                    .find(|record| record.run_id.is_some() && record.run_id == run_id)
                {
                    record.state = RunState::Failed {
                        kind: soar_model::ErrorKind::PlaybookException,
                    };
                }
                warn!(playbook = %playbook, "Playbook finished with exceptions");
                return Err(SoarError::PlaybookException { playbook, message });
            }

            info!(runs = report.runs.len(), "All playbook runs completed");
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Steps one run from `NotStarted` to a terminal state.
    async fn drive(
        &self,
        container: ContainerId,
        playbook: &mut Playbook,
        scope: &RunScope,
        record: &mut RunRecord,
    ) -> Result<(), SoarError> {
        while !record.state.is_terminal() {
            let current = std::mem::replace(&mut record.state, RunState::NotStarted);
            match self.step(container, playbook, scope, current, record).await {
                Ok(next) => {
                    debug!(state = %next, polls = record.polls, "Run state");
                    record.state = next;
                }
                Err(err) => {
                    warn!(error = %err, "Playbook run failed");
                    record.state = RunState::Failed { kind: err.kind() };
                    return Err(err);
                }
            }
        }
        info!(
            run_id = ?record.run_id,
            polls = record.polls,
            approvals = record.approvals_answered,
            "Playbook run completed"
        );
        Ok(())
    }

    /// Performs the I/O for `state` and returns the next state.
    async fn step(
        &self,
        container: ContainerId,
        playbook: &mut Playbook,
        scope: &RunScope,
        state: RunState,
        record: &mut RunRecord,
    ) -> Result<RunState, SoarError> {
        match state {
            RunState::NotStarted => {
                let run_id = self.engine.start_run(container, playbook, scope).await?;
                playbook.run_id = Some(run_id);
                record.run_id = Some(run_id);
                info!(run_id = %run_id, "Playbook run started");
                Ok(RunState::Running)
            }
            RunState::Running => {
                if record.polls > 0 {
                    self.pacer.pause().await;
                }
                record.polls += 1;
                let still_running = self.engine.is_running(container).await?;
                let approvals = self.engine.pending_approvals(container).await?;
                Ok(RunState::after_poll(still_running, approvals))
            }
            RunState::AwaitingApproval {
                approvals,
                still_running,
            } => {
                let answered = self
                    .answer_approvals(container, playbook, &approvals)
                    .await?;
                record.approvals_answered += answered;
                Ok(RunState::after_answers(still_running))
            }
            terminal @ (RunState::Completed | RunState::Failed { .. }) => Ok(terminal),
        }
    }

    /// Answers every pending approval from the playbook's prompt responses.
    ///
    /// Every approval is matched before the first answer is submitted, so an
    /// unmatched prompt leaves all of them unanswered.
    async fn answer_approvals(
        &self,
        container: ContainerId,
        playbook: &Playbook,
        approvals: &[Approval],
    ) -> Result<u32, SoarError> {
        let mut answers = Vec::with_capacity(approvals.len());
        for approval in approvals {
            let responses = playbook.responses_for(&approval.name).ok_or_else(|| {
                SoarError::MissingApprovalResponse {
                    container,
                    prompt: approval.name.clone(),
                    playbook: playbook.display_name(),
                }
            })?;
            answers.push((approval, responses));
        }

        let mut answered = 0;
        for (approval, responses) in answers {
            debug!(prompt = %approval.name, approval_id = ?approval.id, "Answering approval");
            self.engine.answer_approval(approval, responses).await?;
            answered += 1;
        }
        Ok(answered)
    }
}
