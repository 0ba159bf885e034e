use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerPhase {
    Starting,
    Ready,
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("invalid worker transition from {from} to {to}")]
    InvalidTransition { from: WorkerPhase, to: WorkerPhase },
    #[error("worker already in terminal phase {state}")]
    FromTerminalState { state: WorkerPhase },
}

pub struct PhaseTransition;

impl PhaseTransition {
    pub fn validate(from: WorkerPhase, to: WorkerPhase) -> Result<(), TransitionError> {
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState { state: from });
        }

        let is_valid = matches!(
            (from, to),
            (WorkerPhase::Starting, WorkerPhase::Ready)
                | (WorkerPhase::Ready, WorkerPhase::Running)
                | (WorkerPhase::Running, WorkerPhase::Draining)
                | (WorkerPhase::Draining, WorkerPhase::Stopped)
                // shut down before the pool ever started
                | (WorkerPhase::Ready, WorkerPhase::Stopped)
        );

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from, to })
        }
    }

    pub fn is_terminal(phase: WorkerPhase) -> bool {
        phase == WorkerPhase::Stopped
    }
}
