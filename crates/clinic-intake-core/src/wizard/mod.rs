//! Wizard step controller.
//!
//! Holds only the current step and the `completed` flag. Gating lives with
//! the caller: [`Wizard::set_step`] moves unconditionally.

mod guidance;

pub use guidance::*;

use serde::{Deserialize, Serialize};

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    #[default]
    Patient,
    Tests,
    Review,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Patient, Step::Tests, Step::Review];

    pub fn index(&self) -> u8 {
        match self {
            Step::Patient => 0,
            Step::Tests => 1,
            Step::Review => 2,
        }
    }

    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Patient => Some(Step::Tests),
            Step::Tests => Some(Step::Review),
            Step::Review => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::Patient => None,
            Step::Tests => Some(Step::Patient),
            Step::Review => Some(Step::Tests),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Patient => "Patient",
            Step::Tests => "Tests",
            Step::Review => "Review",
        }
    }
}

impl TryFrom<u8> for Step {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Step::Patient),
            1 => Ok(Step::Tests),
            2 => Ok(Step::Review),
            other => Err(other),
        }
    }
}

/// Step position plus the momentary "completed" assertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WizardState {
    pub step: Step,
    pub completed: bool,
}

/// Step state machine. Never persisted; every session starts at
/// [`Step::Patient`].
#[derive(Debug, Clone, Default)]
pub struct Wizard {
    state: WizardState,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    /// Move to `step` without consulting any validity signal.
    pub fn set_step(&mut self, step: Step) {
        self.state.step = step;
        if step != Step::Review {
            self.state.completed = false;
        }
    }

    /// Mark the review as completed.
    ///
    /// Only honoured on the review step; returns whether it took effect so
    /// the presentation can scroll back to the top.
    pub fn complete(&mut self) -> bool {
        if self.state.step != Step::Review {
            tracing::debug!(step = ?self.state.step, "completion ignored outside review");
            return false;
        }
        self.state.completed = true;
        true
    }

    /// Any edit to the form invalidates a previous completion.
    pub fn invalidate(&mut self) {
        self.state.completed = false;
    }

    pub fn reset(&mut self) {
        self.state = WizardState::default();
    }
}
