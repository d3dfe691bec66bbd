//! Job State Machine - single source of truth for a remote job's local phase
//!
//! State diagram:
//! ```text
//! Submitted ──Accepted──> Polling ──Finished──> Completed
//!                           │  ↑
//!                  [Progressed]│
//!                           │
//!                           └──Aborted──> Failed
//! ```
//!
//! Completed and Failed are terminal; every event is rejected there.

/// Events that can trigger phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum JobEvent {
    /// Provider accepted the upload and assigned an id
    Accepted,
    /// Provider reports an intermediate phase
    Progressed,
    /// Provider reports the job done
    Finished,
    /// Provider reports the job failed
    Aborted,
}

impl JobEvent {
    /// Map a provider phase name onto a state machine event.
    pub fn from_provider_phase(phase: &str) -> Self {
        match phase.trim().to_ascii_lowercase().as_str() {
            "done" => JobEvent::Finished,
            "failed" | "rejected" | "deleted" | "expired" => JobEvent::Aborted,
            _ => JobEvent::Progressed,
        }
    }
}

/// Local phase of a transcription job
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum JobPhase {
    Submitted,
    Polling,
    Completed,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Completed | JobPhase::Failed)
    }
}

/// Result of a successful transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Changed { from: JobPhase, to: JobPhase },
    /// Event was valid but the phase didn't change
    Unchanged,
}

/// Reason a transition was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{attempted_event} event rejected in {current_phase} phase")]
pub struct TransitionRejection {
    pub current_phase: JobPhase,
    pub attempted_event: JobEvent,
}

/// Phase tracker owned by a single session
#[derive(Debug)]
pub struct JobStateMachine {
    phase: JobPhase,
}

impl JobStateMachine {
    pub fn new() -> Self {
        Self {
            phase: JobPhase::Submitted,
        }
    }

    pub fn current(&self) -> JobPhase {
        self.phase
    }

    /// Attempt a transition. The only way to change phase.
    pub fn transition(&mut self, event: JobEvent) -> Result<TransitionResult, TransitionRejection> {
        let current = self.phase;

        match Self::compute_transition(current, event) {
            Some(next) if next == current => Ok(TransitionResult::Unchanged),
            Some(next) => {
                self.phase = next;
                Ok(TransitionResult::Changed {
                    from: current,
                    to: next,
                })
            }
            None => Err(TransitionRejection {
                current_phase: current,
                attempted_event: event,
            }),
        }
    }

    /// Pure function: the phase `event` leads to from `current`, if allowed
    fn compute_transition(current: JobPhase, event: JobEvent) -> Option<JobPhase> {
        match current {
            JobPhase::Submitted => match event {
                JobEvent::Accepted => Some(JobPhase::Polling),
                _ => None,
            },

            JobPhase::Polling => match event {
                JobEvent::Progressed => Some(JobPhase::Polling),
                JobEvent::Finished => Some(JobPhase::Completed),
                JobEvent::Aborted => Some(JobPhase::Failed),
                JobEvent::Accepted => None,
            },

            JobPhase::Completed | JobPhase::Failed => None,
        }
    }
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_in(phase: JobPhase) -> JobStateMachine {
        JobStateMachine { phase }
    }

    #[test]
    fn test_valid_transitions() {
        let test_cases = vec![
            (JobPhase::Submitted, JobEvent::Accepted, JobPhase::Polling),
            (JobPhase::Polling, JobEvent::Finished, JobPhase::Completed),
            (JobPhase::Polling, JobEvent::Aborted, JobPhase::Failed),
        ];

        for (from, event, to) in test_cases {
            let mut machine = machine_in(from);
            assert_eq!(
                machine.transition(event),
                Ok(TransitionResult::Changed { from, to }),
                "{} --{}-->",
                from,
                event
            );
            assert_eq!(machine.current(), to);
        }
    }

    #[test]
    fn test_progress_keeps_polling() {
        let mut machine = machine_in(JobPhase::Polling);
        assert_eq!(
            machine.transition(JobEvent::Progressed),
            Ok(TransitionResult::Unchanged)
        );
        assert_eq!(machine.current(), JobPhase::Polling);
    }

    #[test]
    fn test_terminal_phases_reject_everything() {
        let events = [
            JobEvent::Accepted,
            JobEvent::Progressed,
            JobEvent::Finished,
            JobEvent::Aborted,
        ];

        for phase in [JobPhase::Completed, JobPhase::Failed] {
            for event in events {
                let mut machine = machine_in(phase);
                let rejection = machine.transition(event).unwrap_err();
                assert_eq!(rejection.current_phase, phase);
                assert_eq!(machine.current(), phase);
            }
        }
    }

    #[test]
    fn test_submitted_only_accepts_acceptance() {
        let mut machine = JobStateMachine::new();
        assert!(machine.transition(JobEvent::Finished).is_err());
        assert_eq!(machine.current(), JobPhase::Submitted);
    }

    #[test]
    fn test_provider_phase_mapping() {
        let test_cases = vec![
            ("done", JobEvent::Finished),
            ("DONE", JobEvent::Finished),
            ("failed", JobEvent::Aborted),
            ("rejected", JobEvent::Aborted),
            ("expired", JobEvent::Aborted),
            ("queued", JobEvent::Progressed),
            ("running", JobEvent::Progressed),
            ("transcribing", JobEvent::Progressed),
        ];

        for (phase, expected) in test_cases {
            assert_eq!(JobEvent::from_provider_phase(phase), expected, "{}", phase);
        }
    }

    #[test]
    fn test_rejection_message() {
        let rejection = TransitionRejection {
            current_phase: JobPhase::Completed,
            attempted_event: JobEvent::Progressed,
        };
        assert_eq!(
            rejection.to_string(),
            "Progressed event rejected in Completed phase"
        );
    }
}
