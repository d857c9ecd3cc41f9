//! The pipeline state machine.
//!
//! Legal step order is encoded as an explicit transition table
//! `(state, step method) -> next state` rather than ad hoc conditional
//! checks, so the set of valid pipelines is enumerable and independently
//! testable, and new step methods register new transitions without touching
//! unrelated validation code.
//!
//! The machine tracks pipeline progress only; it performs no numeric work.
//! [`PipelineMachine::validate_sequence`] replays a configured step sequence
//! purely to detect order violations (a dry-run).

use serde::Serialize;
use tracing::debug;

use crate::core::errors::PipelineError;
use crate::steps::PipelineStep;

/// Pipeline progress states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum State {
    /// Initial state: no data produced yet.
    Begin,
    /// A matching-cost volume has been computed.
    CostVolumeComputed,
    /// A disparity map has been selected from the cost volume.
    DisparityComputed,
    /// The disparity map has been refined at sub-pixel precision.
    Refined,
    /// The disparity map has been filtered.
    Filtered,
    /// The disparity map has been validated.
    Validated,
    /// Terminal state: no recognized step remains.
    End,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Begin => write!(f, "begin"),
            State::CostVolumeComputed => write!(f, "cost_volume_computed"),
            State::DisparityComputed => write!(f, "disparity_computed"),
            State::Refined => write!(f, "refined"),
            State::Filtered => write!(f, "filtered"),
            State::Validated => write!(f, "validated"),
            State::End => write!(f, "end"),
        }
    }
}

/// The fixed transition table: `(source state, step method, next state)`.
///
/// The right-disparity-map step is a placeholder that participates in the
/// walk without advancing progress, so its methods loop on `Begin`.
const TRANSITIONS: &[(State, &str, State)] = &[
    (State::Begin, "none", State::Begin),
    (State::Begin, "accurate", State::Begin),
    (State::Begin, "ssd", State::CostVolumeComputed),
    (State::Begin, "sad", State::CostVolumeComputed),
    (State::Begin, "census", State::CostVolumeComputed),
    (State::Begin, "zncc", State::CostVolumeComputed),
    (State::CostVolumeComputed, "wta", State::DisparityComputed),
    (State::DisparityComputed, "vfit", State::Refined),
    (State::DisparityComputed, "quadratic", State::Refined),
    (State::DisparityComputed, "median", State::Filtered),
    (State::Refined, "median", State::Filtered),
    (State::DisparityComputed, "bilateral", State::Filtered),
    (State::Refined, "bilateral", State::Filtered),
    (State::DisparityComputed, "cross_checking", State::Validated),
    (State::Refined, "cross_checking", State::Validated),
    (State::Filtered, "cross_checking", State::Validated),
];

/// A finite state machine over pipeline progress.
///
/// An instance is rebuilt (or [`reset`](Self::reset)) per validation pass;
/// it is never shared across unrelated configurations.
#[derive(Debug)]
pub struct PipelineMachine {
    state: State,
}

impl PipelineMachine {
    /// Creates a machine in the initial `Begin` state.
    pub fn new() -> Self {
        Self {
            state: State::Begin,
        }
    }

    /// Returns the machine's current state.
    pub fn current_state(&self) -> State {
        self.state
    }

    /// Puts the machine back in the initial `Begin` state.
    pub fn reset(&mut self) {
        self.state = State::Begin;
    }

    /// Attempts the transition named by `method` for the step `step`.
    ///
    /// Fails with [`PipelineError::InvalidTransition`] when no table entry
    /// matches the current state and method, or when the method is
    /// unrecognized altogether; the machine does not change state on failure.
    pub fn transition(&mut self, step: &str, method: &str) -> Result<State, PipelineError> {
        let next = TRANSITIONS
            .iter()
            .find(|(from, name, _)| *from == self.state && *name == method)
            .map(|(_, _, to)| *to);

        match next {
            Some(next) => {
                debug!(%step, %method, from = %self.state, to = %next, "transition");
                self.state = next;
                Ok(next)
            }
            None => Err(PipelineError::InvalidTransition {
                step: step.to_string(),
                method: method.to_string(),
                state: self.state,
            }),
        }
    }

    /// Dry-runs `steps` against a freshly reset machine.
    ///
    /// Replays every step in order to detect order violations; no numeric
    /// work happens and nothing outside the machine instance is touched.
    /// On success the machine parks in the terminal `End` state and the last
    /// progress state reached by the steps is returned. On failure the error
    /// identifies the offending step and the state at the time of failure.
    pub fn validate_sequence(&mut self, steps: &[PipelineStep]) -> Result<State, PipelineError> {
        self.reset();
        let mut last = self.state;
        for step in steps {
            last = self.transition(&step.name, &step.method)?;
        }
        self.state = State::End;
        Ok(last)
    }
}

impl Default for PipelineMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn step(name: &str, method: &str) -> PipelineStep {
        PipelineStep {
            name: name.to_string(),
            method: method.to_string(),
            params: Map::new(),
        }
    }

    #[test]
    fn minimal_pipeline_is_legal() {
        let mut machine = PipelineMachine::new();
        let final_state = machine
            .validate_sequence(&[step("stereo", "zncc"), step("disparity", "wta")])
            .unwrap();
        assert_eq!(final_state, State::DisparityComputed);
        assert_eq!(machine.current_state(), State::End);
    }

    #[test]
    fn full_pipeline_is_legal() {
        let mut machine = PipelineMachine::new();
        let final_state = machine
            .validate_sequence(&[
                step("right_disp_map", "accurate"),
                step("stereo", "census"),
                step("disparity", "wta"),
                step("refinement", "vfit"),
                step("filter", "median"),
                step("validation", "cross_checking"),
            ])
            .unwrap();
        assert_eq!(final_state, State::Validated);
    }

    #[test]
    fn filter_before_disparity_is_rejected() {
        let mut machine = PipelineMachine::new();
        let err = machine
            .validate_sequence(&[
                step("stereo", "zncc"),
                step("filter", "median"),
                step("disparity", "wta"),
            ])
            .unwrap_err();
        match err {
            PipelineError::InvalidTransition {
                step,
                method,
                state,
            } => {
                assert_eq!(step, "filter");
                assert_eq!(method, "median");
                assert_eq!(state, State::CostVolumeComputed);
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_method_is_rejected() {
        let mut machine = PipelineMachine::new();
        let err = machine.transition("stereo", "block_matching").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTransition { .. }));
    }

    #[test]
    fn failed_transition_leaves_state_unchanged() {
        let mut machine = PipelineMachine::new();
        machine.transition("stereo", "zncc").unwrap();
        assert_eq!(machine.current_state(), State::CostVolumeComputed);
        machine.transition("filter", "median").unwrap_err();
        assert_eq!(machine.current_state(), State::CostVolumeComputed);
    }

    #[test]
    fn validate_sequence_resets_between_runs() {
        let mut machine = PipelineMachine::new();
        machine
            .validate_sequence(&[step("stereo", "zncc"), step("disparity", "wta")])
            .unwrap();
        // A second replay starts from Begin again, not from End.
        machine
            .validate_sequence(&[step("stereo", "sad"), step("disparity", "wta")])
            .unwrap();
    }

    #[test]
    fn validation_is_reachable_from_every_post_disparity_state() {
        for prefix in [
            vec![step("stereo", "zncc"), step("disparity", "wta")],
            vec![
                step("stereo", "zncc"),
                step("disparity", "wta"),
                step("refinement", "quadratic"),
            ],
            vec![
                step("stereo", "zncc"),
                step("disparity", "wta"),
                step("filter", "bilateral"),
            ],
        ] {
            let mut machine = PipelineMachine::new();
            let mut steps = prefix;
            steps.push(step("validation", "cross_checking"));
            assert_eq!(
                machine.validate_sequence(&steps).unwrap(),
                State::Validated
            );
        }
    }
}
