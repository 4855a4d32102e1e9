//! Playbook run orchestration for the SOAR client.
//!
//! This crate drives remote playbook runs against a container: it starts each
//! run, polls it until the remote engine no longer reports it as running,
//! answers the approval prompts it raises along the way, and finally refreshes
//! the container and reports any playbook whose logs contain exceptions.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The executor sequences calls through the
//! [`soar_model::PlaybookEngine`] port and contains no transport code of its
//! own. The REST client in `soar-client` implements the port; tests use
//! scripted in-memory engines.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`state`] | `RunState` and its pure transitions |
//! | [`pacer`] | The pause between two polls (`Pacer`, `FixedInterval`, `NoPause`) |
//! | [`executor`] | `PlaybookExecutor`, the step function and `RunReport` |

pub mod executor;
pub mod pacer;
pub mod state;

pub use executor::{PlaybookExecutor, RunRecord, RunReport};
pub use pacer::{FixedInterval, NoPause, Pacer, POLL_INTERVAL};
pub use state::RunState;
