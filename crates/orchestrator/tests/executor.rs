//! Executor behaviour against a scripted in-memory engine.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use soar_model::{
    Approval, ApprovalId, Container, ContainerId, ErrorKind, Playbook, PlaybookEngine,
    PlaybookLog, PlaybookRunId, RunScope, SoarError,
};
use soar_orchestrator::{NoPause, PlaybookExecutor, RunState};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Start(String),
    IsRunning,
    PendingApprovals,
    Answer(String, Vec<String>),
    Refresh,
}

/// Replays canned poll results and records every call it receives.
#[derive(Default)]
struct ScriptedEngine {
    running: Mutex<VecDeque<bool>>,
    approvals: Mutex<VecDeque<Vec<Approval>>>,
    refreshed_runs: Mutex<Vec<Playbook>>,
    next_run_id: Mutex<u64>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEngine {
    fn with_statuses(statuses: &[bool]) -> Self {
        let engine = Self::default();
        *engine.running.lock().unwrap() = statuses.iter().copied().collect();
        *engine.next_run_id.lock().unwrap() = 100;
        engine
    }

    fn then_approvals(self, approvals: Vec<Vec<Approval>>) -> Self {
        *self.approvals.lock().unwrap() = approvals.into();
        self
    }

    fn refreshing_to(self, runs: Vec<Playbook>) -> Self {
        *self.refreshed_runs.lock().unwrap() = runs;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|call| *call == wanted).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PlaybookEngine for ScriptedEngine {
    async fn start_run(
        &self,
        _container: ContainerId,
        playbook: &Playbook,
        _scope: &RunScope,
    ) -> Result<PlaybookRunId, SoarError> {
        self.record(Call::Start(playbook.display_name()));
        let mut next = self.next_run_id.lock().unwrap();
        *next += 1;
        Ok(PlaybookRunId::new(*next))
    }

    async fn is_running(&self, _container: ContainerId) -> Result<bool, SoarError> {
        self.record(Call::IsRunning);
        Ok(self.running.lock().unwrap().pop_front().unwrap_or(false))
    }

    async fn pending_approvals(&self, _container: ContainerId) -> Result<Vec<Approval>, SoarError> {
        self.record(Call::PendingApprovals);
        Ok(self.approvals.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn answer_approval(
        &self,
        approval: &Approval,
        responses: &[String],
    ) -> Result<(), SoarError> {
        self.record(Call::Answer(approval.name.clone(), responses.to_vec()));
        Ok(())
    }

    async fn refresh_container(&self, container: &mut Container) -> Result<(), SoarError> {
        self.record(Call::Refresh);
        let runs = self.refreshed_runs.lock().unwrap().clone();
        container.absorb_playbook_runs(runs);
        Ok(())
    }
}

fn created_container() -> Container {
    let mut container = Container::new("phish", "events");
    container.id = Some(ContainerId::new(42));
    container
}

fn approval(id: u64, name: &str) -> Approval {
    Approval {
        id: Some(ApprovalId::new(id)),
        name: name.into(),
        status: "pending".into(),
        ..Approval::default()
    }
}

fn exception_log(message: &str) -> PlaybookLog {
    PlaybookLog {
        message: message.into(),
        time: None,
        message_type: Some(0),
    }
}

#[tokio::test]
async fn polls_until_the_run_is_no_longer_running() {
    let engine = ScriptedEngine::with_statuses(&[true, true, false]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    let report = executor
        .run_playbooks(&mut container, vec![Playbook::new("triage")], &RunScope::All)
        .await
        .unwrap();

    assert_eq!(engine.count(&Call::IsRunning), 3);
    assert_eq!(engine.count(&Call::PendingApprovals), 3);
    assert_eq!(engine.calls().last(), Some(&Call::Refresh));

    assert_eq!(report.container, ContainerId::new(42));
    assert_eq!(report.runs.len(), 1);
    let run = &report.runs[0];
    assert_eq!(run.playbook, "triage");
    assert_eq!(run.run_id, Some(PlaybookRunId::new(101)));
    assert_eq!(run.polls, 3);
    assert_eq!(run.state, RunState::Completed);

    assert_eq!(container.playbooks.len(), 1);
    assert_eq!(container.playbooks[0].run_id, Some(PlaybookRunId::new(101)));
}

#[tokio::test]
async fn answers_pending_approvals_with_configured_responses() {
    let engine = ScriptedEngine::with_statuses(&[true, true, false])
        .then_approvals(vec![vec![], vec![approval(7, "confirm_block")]]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();
    container.add_playbook(Playbook::new("block_ip").with_prompt("confirm_block", ["yes", "24h"]));

    let report = executor
        .run_playbooks(&mut container, vec![], &RunScope::New)
        .await
        .unwrap();

    assert_eq!(
        engine.count(&Call::Answer(
            "confirm_block".into(),
            vec!["yes".into(), "24h".into()]
        )),
        1
    );
    assert_eq!(report.runs[0].approvals_answered, 1);
    assert_eq!(report.runs[0].polls, 3);
}

#[tokio::test]
async fn unmatched_prompt_fails_without_submitting_anything() {
    let engine = ScriptedEngine::with_statuses(&[true, true])
        .then_approvals(vec![vec![approval(1, "known"), approval(2, "unknown")]]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();
    container.add_playbook(Playbook::new("block_ip").with_prompt("known", ["ok"]));

    let err = executor
        .run_playbooks(&mut container, vec![], &RunScope::All)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MissingApproval);
    match err {
        SoarError::MissingApprovalResponse {
            container,
            prompt,
            playbook,
        } => {
            assert_eq!(container, ContainerId::new(42));
            assert_eq!(prompt, "unknown");
            assert_eq!(playbook, "block_ip");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!engine
        .calls()
        .iter()
        .any(|call| matches!(call, Call::Answer(..) | Call::Refresh)));
}

#[tokio::test]
async fn exception_logs_fail_the_invocation_after_refresh() {
    let failed_run = Playbook {
        run_id: Some(PlaybookRunId::new(101)),
        pretty_name: "enrich".into(),
        status: "failed".into(),
        logs: vec![exception_log("KeyError: 'ip'")],
        ..Playbook::default()
    };
    let engine = ScriptedEngine::with_statuses(&[false]).refreshing_to(vec![failed_run]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    let err = executor
        .run_playbooks(&mut container, vec![Playbook::new("enrich")], &RunScope::All)
        .await
        .unwrap_err();

    match err {
        SoarError::PlaybookException { playbook, message } => {
            assert_eq!(playbook, "enrich");
            assert_eq!(message, "KeyError: 'ip'");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(container.playbooks[0].status, "failed");
}

#[tokio::test]
async fn previously_started_playbooks_are_checked_for_exceptions() {
    let mut earlier = Playbook::new("earlier");
    earlier.run_id = Some(PlaybookRunId::new(5));
    earlier.logs = vec![exception_log("first;"), exception_log("second")];

    let engine = ScriptedEngine::with_statuses(&[false]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();
    container.add_playbook(earlier);

    let err = executor
        .run_playbooks(&mut container, vec![Playbook::new("fresh")], &RunScope::All)
        .await
        .unwrap_err();

    assert_eq!(engine.count(&Call::Start("fresh".into())), 1);
    assert_eq!(engine.count(&Call::Start("earlier".into())), 0);
    match err {
        SoarError::PlaybookException { playbook, message } => {
            assert_eq!(playbook, "earlier");
            assert_eq!(message, "first;second");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn runs_are_driven_one_after_another() {
    let engine = ScriptedEngine::with_statuses(&[true, false, false]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    let report = executor
        .run_playbooks(
            &mut container,
            vec![Playbook::new("first"), Playbook::new("second")],
            &RunScope::All,
        )
        .await
        .unwrap();

    assert_eq!(
        engine.calls(),
        vec![
            Call::Start("first".into()),
            Call::IsRunning,
            Call::PendingApprovals,
            Call::IsRunning,
            Call::PendingApprovals,
            Call::Start("second".into()),
            Call::IsRunning,
            Call::PendingApprovals,
            Call::Refresh,
        ]
    );
    assert_eq!(report.runs[0].polls, 2);
    assert_eq!(report.runs[1].polls, 1);
}

#[tokio::test]
async fn requires_a_created_container() {
    let engine = ScriptedEngine::default();
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = Container::new("phish", "events");

    let err = executor
        .run_playbooks(&mut container, vec![Playbook::new("triage")], &RunScope::All)
        .await
        .unwrap_err();

    assert!(matches!(err, SoarError::ContainerNotInitialized { .. }));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn requires_at_least_one_playbook() {
    let engine = ScriptedEngine::default();
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    let err = executor
        .run_playbooks(&mut container, vec![], &RunScope::All)
        .await
        .unwrap_err();

    assert!(matches!(err, SoarError::NoPlaybooks { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn unnamed_playbook_is_rejected_before_any_request() {
    let engine = ScriptedEngine::default();
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    let err = executor
        .run_playbooks(
            &mut container,
            vec![Playbook::new("ok"), Playbook::default()],
            &RunScope::All,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, SoarError::ObjectMissingAttributes { .. }));
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn rejected_playbooks_are_not_attached_to_the_container() {
    let engine = ScriptedEngine::with_statuses(&[false]);
    let executor = PlaybookExecutor::with_pacer(&engine, NoPause);
    let mut container = created_container();

    executor
        .run_playbooks(
            &mut container,
            vec![Playbook::new("ok"), Playbook::default()],
            &RunScope::All,
        )
        .await
        .unwrap_err();
    assert!(container.playbooks.is_empty());

    let report = executor
        .run_playbooks(&mut container, vec![Playbook::new("ok")], &RunScope::All)
        .await
        .unwrap();

    assert_eq!(report.runs.len(), 1);
    assert_eq!(container.playbooks.len(), 1);
    assert_eq!(engine.calls()[0], Call::Start("ok".into()));
}
