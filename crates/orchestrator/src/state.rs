//! Lifecycle of one playbook run as observed by the executor.
//!
//! ```text
//! NotStarted ──start──▶ Running ──poll──▶ Running
//!                          │                 │
//!                          │ approvals       │ not running
//!                          ▼                 ▼
//!                  AwaitingApproval ──▶ Completed
//! ```
//!
//! Any failure while driving a run moves it to [`RunState::Failed`]. The
//! transitions that depend only on poll results are pure and live here; the
//! executor performs the I/O.

use soar_model::{Approval, ErrorKind};

/// Where a playbook run is in its lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum RunState {
    /// No start request issued yet.
    NotStarted,
    /// Started and last reported as running with nothing to answer.
    Running,
    /// The last poll found pending approvals that must be answered before
    /// polling again.
    AwaitingApproval {
        /// Pending approvals, oldest first.
        approvals: Vec<Approval>,
        /// Whether the same poll still reported the run as running.
        still_running: bool,
    },
    /// No longer reported as running.
    Completed,
    /// Driving the run failed.
    Failed {
        /// Class of the failure that ended the run.
        kind: ErrorKind,
    },
}

impl RunState {
    /// The state following one poll of the remote engine.
    pub fn after_poll(still_running: bool, approvals: Vec<Approval>) -> Self {
        if !approvals.is_empty() {
            RunState::AwaitingApproval {
                approvals,
                still_running,
            }
        } else if still_running {
            RunState::Running
        } else {
            RunState::Completed
        }
    }

    /// The state following the answering of every pending approval.
    ///
    /// Resumes polling only when the poll that raised the approvals still
    /// reported the run as running.
    pub fn after_answers(still_running: bool) -> Self {
        if still_running {
            RunState::Running
        } else {
            RunState::Completed
        }
    }

    /// Returns `true` for [`RunState::Completed`] and [`RunState::Failed`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed { .. })
    }

    /// Short lower-case label used in log events.
    pub fn label(&self) -> &'static str {
        match self {
            RunState::NotStarted => "not_started",
            RunState::Running => "running",
            RunState::AwaitingApproval { .. } => "awaiting_approval",
            RunState::Completed => "completed",
            RunState::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approval(name: &str) -> Approval {
        Approval {
            name: name.into(),
            status: "pending".into(),
            ..Approval::default()
        }
    }

    #[test]
    fn poll_without_approvals_follows_running_flag() {
        assert_eq!(RunState::after_poll(true, vec![]), RunState::Running);
        assert_eq!(RunState::after_poll(false, vec![]), RunState::Completed);
    }

    #[test]
    fn approvals_take_precedence_over_completion() {
        let state = RunState::after_poll(false, vec![approval("confirm")]);
        assert!(matches!(
            state,
            RunState::AwaitingApproval {
                still_running: false,
                ref approvals,
            } if approvals.len() == 1
        ));
        assert!(!state.is_terminal());
        assert_eq!(RunState::after_answers(false), RunState::Completed);
        assert_eq!(RunState::after_answers(true), RunState::Running);
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed {
            kind: ErrorKind::Server
        }
        .is_terminal());
        assert!(!RunState::NotStarted.is_terminal());
        assert_eq!(RunState::NotStarted.to_string(), "not_started");
    }
}
