#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turns drill events into the guidance shown to the trainee.

mod report;

use seizure_drill_core::{Event, FeedbackKind, GatedAction, RejectionReason, SessionStage, Verdict};
use serde::Serialize;
use tracing::debug;

pub use report::{format_clock, DrillReport};

/// Prompt shown while the trainee waits for the incident.
pub const OBSERVE_PROMPT: &str = "Observe the person on the platform...";

/// One coaching message paired with the sensory feedback that accompanies it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Cue {
    /// Text presented to the trainee.
    pub message: &'static str,
    /// Feedback rendered alongside the message, if any.
    pub feedback: Option<FeedbackKind>,
}

impl Cue {
    const fn quiet(message: &'static str) -> Self {
        Self {
            message,
            feedback: None,
        }
    }

    const fn with(message: &'static str, feedback: FeedbackKind) -> Self {
        Self {
            message,
            feedback: Some(feedback),
        }
    }
}

/// Pure system that keeps the on-screen prompt in step with the drill.
#[derive(Debug)]
pub struct Coaching {
    current: &'static str,
}

impl Coaching {
    /// Creates a coach showing the observation prompt.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: OBSERVE_PROMPT,
        }
    }

    /// Message currently on screen.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        self.current
    }

    /// Consumes world events and emits one cue per relevant event.
    pub fn handle(&mut self, events: &[Event], out_cues: &mut Vec<Cue>) {
        for event in events {
            let cue = match event {
                Event::SessionStageChanged { stage } => stage_cue(*stage),
                Event::ActionResolved { action, verdict } => Some(attempt_cue(*action, *verdict)),
                _ => None,
            };

            if let Some(cue) = cue {
                debug!(message = cue.message, feedback = ?cue.feedback, "coaching cue");
                self.current = cue.message;
                out_cues.push(cue);
            }
        }
    }
}

impl Default for Coaching {
    fn default() -> Self {
        Self::new()
    }
}

fn stage_cue(stage: SessionStage) -> Option<Cue> {
    match stage {
        SessionStage::Briefing => None,
        SessionStage::Simulating => Some(Cue::quiet(OBSERVE_PROMPT)),
        SessionStage::Complete { .. } => Some(Cue::with("Life Saved.", FeedbackKind::Success)),
    }
}

fn attempt_cue(action: GatedAction, verdict: Verdict) -> Cue {
    match (action, verdict) {
        (GatedAction::StartTiming, Verdict::Accepted) => {
            Cue::quiet("Timing started. Protect the head!")
        }
        (GatedAction::PlaceCushion, Verdict::Accepted) => {
            Cue::quiet("Head protected! Wait for shaking to stop.")
        }
        (GatedAction::TurnOnSide, Verdict::Accepted) => Cue::with(
            "Great job. They are in the recovery position.",
            FeedbackKind::Success,
        ),
        (_, Verdict::Rejected(RejectionReason::AlreadyDone)) => {
            Cue::with("You have already done that step.", FeedbackKind::Warning)
        }
        (_, Verdict::Rejected(reason)) => {
            Cue::with(rejection_message(action, reason), FeedbackKind::Error)
        }
    }
}

fn rejection_message(action: GatedAction, reason: RejectionReason) -> &'static str {
    match (action, reason) {
        (_, RejectionReason::Premature) => "Wait for the emergency to begin!",
        (_, RejectionReason::UnsafeToMove) => "Wait! Don't move them while they're shaking!",
        (GatedAction::TurnOnSide, _) => "Protect the head before turning!",
        _ => "Safety first! Start the timer.",
    }
}
