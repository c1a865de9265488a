//! State machine for the linear publish workflow
//!
//! Every stage may only advance to the next one or to `Failed`. The history
//! is kept in memory for diagnostics; a run is never resumed.

use crate::core::error::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publishing state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishState {
    Start,
    RepoInfoResolved,
    EndpointChosen,
    ArtifactPathValidated,
    CredentialsResolved,
    AuthProbed,
    Uploaded,
    CredentialsPersisted,
    Done,
    Failed,
}

impl PublishState {
    /// States reachable from `self`
    fn successors(self) -> &'static [PublishState] {
        use PublishState::*;
        match self {
            Start => &[RepoInfoResolved, Failed],
            RepoInfoResolved => &[EndpointChosen, Failed],
            EndpointChosen => &[ArtifactPathValidated, Failed],
            ArtifactPathValidated => &[CredentialsResolved, Failed],
            CredentialsResolved => &[AuthProbed, Failed],
            AuthProbed => &[Uploaded, Failed],
            // Persistence is optional and its failure does not fail the run
            Uploaded => &[CredentialsPersisted, Done],
            CredentialsPersisted => &[Done],
            Done | Failed => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Done | PublishState::Failed)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: PublishState,
    pub to: PublishState,
    pub timestamp: DateTime<Utc>,
}

/// Tracks the stage a publish run has reached
#[derive(Debug)]
pub struct PublishStateMachine {
    current_state: PublishState,
    transitions: Vec<StateTransition>,
}

impl Default for PublishStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishStateMachine {
    pub fn new() -> Self {
        Self {
            current_state: PublishState::Start,
            transitions: Vec::new(),
        }
    }

    /// Advance to `to`, rejecting anything but the next stage or `Failed`
    pub fn transition(&mut self, to: PublishState) -> Result<(), PublishError> {
        let from = self.current_state;
        if !from.successors().contains(&to) {
            return Err(PublishError::InvalidTransition { from, to });
        }

        tracing::debug!(?from, ?to, "publish state transition");
        self.transitions.push(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
        });
        self.current_state = to;

        Ok(())
    }

    /// Move to `Failed` unless the run already finished
    pub fn fail(&mut self) {
        if !self.current_state.is_terminal() {
            // Failed is a successor of every non-terminal stage except the
            // post-upload ones, which cannot fail.
            let _ = self.transition(PublishState::Failed);
        }
    }

    pub fn get_state(&self) -> PublishState {
        self.current_state
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Reset to `Start` for another run
    pub fn clear(&mut self) {
        self.current_state = PublishState::Start;
        self.transitions.clear();
    }

    /// Milliseconds between the first and last transition
    pub fn get_elapsed_time(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| format!("{}: {:?} → {:?}", t.timestamp.to_rfc3339(), t.from, t.to))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
