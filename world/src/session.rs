use std::time::Duration;

use seizure_drill_core::{
    ActivityLevel, Event, FeedbackKind, GateFlags, GatedAction, RandomSource, RejectionReason,
    SessionStage, Verdict,
};
use tracing::{debug, info, warn};

use crate::{
    activity::ActivityState,
    incident::{IncidentScheduler, IncidentTiming, RollOutcome},
    timer::Countdown,
};

/// Presentation delay between the accepted turn and the completed stage.
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_millis(2_500);

#[derive(Clone, Copy, Debug)]
struct PendingCompletion {
    countdown: Countdown,
    elapsed: Duration,
}

/// Top-level drill state machine: Briefing → Simulating → Complete.
///
/// Gates the three user actions against the incident phase and records the
/// response time. Owns the [`IncidentScheduler`] for the current drill entry;
/// beginning or resetting the drill replaces it, which cancels its timers.
#[derive(Debug)]
pub struct TrainingSession {
    timing: IncidentTiming,
    completion_delay: Duration,
    stage: SessionStage,
    gates: GateFlags,
    started_at: Option<Duration>,
    completion: Option<PendingCompletion>,
    incident: IncidentScheduler,
}

impl TrainingSession {
    /// Creates a session waiting in the briefing stage.
    #[must_use]
    pub fn new(timing: IncidentTiming, completion_delay: Duration) -> Self {
        Self {
            timing,
            completion_delay,
            stage: SessionStage::Briefing,
            gates: GateFlags::default(),
            started_at: None,
            completion: None,
            incident: IncidentScheduler::new(timing),
        }
    }

    /// Current stage of the drill.
    #[must_use]
    pub const fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Snapshot of the gate flags.
    #[must_use]
    pub const fn gates(&self) -> GateFlags {
        self.gates
    }

    /// Incident owned by the current drill entry.
    #[must_use]
    pub const fn incident(&self) -> &IncidentScheduler {
        &self.incident
    }

    /// Leaves the briefing, raises the activity to the crisis level, and
    /// schedules a fresh incident. Returns `false` outside the briefing.
    pub fn begin(&mut self, activity: &mut ActivityState, out_events: &mut Vec<Event>) -> bool {
        if self.stage != SessionStage::Briefing {
            warn!(stage = ?self.stage, "drill already started");
            return false;
        }

        info!("drill started");
        self.set_stage(SessionStage::Simulating, out_events);
        activity.set_level(ActivityLevel::CRISIS.get(), out_events);
        self.incident = IncidentScheduler::new(self.timing);
        self.incident.schedule();
        true
    }

    /// Starts the stopwatch. Only accepted while the incident is active.
    pub fn attempt_start_timing(&mut self, now: Duration, out_events: &mut Vec<Event>) -> Verdict {
        let verdict = if self.gates.timing_started {
            Verdict::Rejected(RejectionReason::AlreadyDone)
        } else if !self.incident.is_shaking() {
            Verdict::Rejected(RejectionReason::Premature)
        } else {
            self.started_at = Some(now);
            self.gates.timing_started = true;
            Verdict::Accepted
        };
        resolve(GatedAction::StartTiming, verdict, out_events)
    }

    /// Places the cushion. Only accepted once timing started.
    pub fn attempt_place_cushion(&mut self, out_events: &mut Vec<Event>) -> Verdict {
        let verdict = if self.gates.cushion_placed {
            Verdict::Rejected(RejectionReason::AlreadyDone)
        } else if !self.gates.timing_started {
            Verdict::Rejected(RejectionReason::OutOfOrder)
        } else {
            self.gates.cushion_placed = true;
            self.incident.apply_cushion(out_events);
            Verdict::Accepted
        };
        resolve(GatedAction::PlaceCushion, verdict, out_events)
    }

    /// Turns the person onto their side. Rejected while shaking regardless of
    /// the other gates, and before the cushion is placed.
    pub fn attempt_turn_side(&mut self, now: Duration, out_events: &mut Vec<Event>) -> Verdict {
        let verdict = if self.incident.is_shaking() {
            Verdict::Rejected(RejectionReason::UnsafeToMove)
        } else if self.gates.turned_on_side {
            Verdict::Rejected(RejectionReason::AlreadyDone)
        } else if !self.gates.cushion_placed {
            Verdict::Rejected(RejectionReason::OutOfOrder)
        } else {
            let elapsed = now.saturating_sub(self.started_at.unwrap_or(now));
            self.gates.turned_on_side = true;
            let outcome = self.incident.roll_to_side(out_events);
            debug!(?outcome, elapsed_ms = elapsed.as_millis(), "turned onto side");
            debug_assert_eq!(outcome, RollOutcome::Rolling);
            self.completion = Some(PendingCompletion {
                countdown: Countdown::new(self.completion_delay),
                elapsed,
            });
            Verdict::Accepted
        };
        resolve(GatedAction::TurnOnSide, verdict, out_events)
    }

    /// Returns to the briefing from any stage, clearing every gate, cancelling
    /// every pending timer, and restoring the activity baseline.
    pub fn reset(&mut self, activity: &mut ActivityState, out_events: &mut Vec<Event>) {
        info!(stage = ?self.stage, "drill reset");
        self.gates = GateFlags::default();
        self.started_at = None;
        self.completion = None;

        let previous = std::mem::replace(&mut self.incident, IncidentScheduler::new(self.timing));
        if previous.phase() != self.incident.phase() {
            out_events.push(Event::IncidentPhaseChanged {
                phase: self.incident.phase(),
            });
        }
        if previous.pose() != self.incident.pose() {
            out_events.push(Event::PoseChanged {
                pose: self.incident.pose(),
            });
        }

        self.set_stage(SessionStage::Briefing, out_events);
        activity.set_level(ActivityLevel::RESTORED.get(), out_events);
    }

    /// Advances the incident and the completion delay.
    pub fn advance(
        &mut self,
        dt: Duration,
        random: &mut dyn RandomSource,
        out_events: &mut Vec<Event>,
    ) {
        self.incident.advance(dt, random, out_events);

        let Some(pending) = self.completion.as_mut() else {
            return;
        };
        if pending.countdown.advance(dt).is_none() {
            return;
        }

        let elapsed = pending.elapsed;
        self.completion = None;
        info!(elapsed_ms = elapsed.as_millis(), "drill complete");
        self.set_stage(SessionStage::Complete { elapsed }, out_events);
        out_events.push(Event::Feedback {
            kind: FeedbackKind::Success,
        });
    }

    fn set_stage(&mut self, stage: SessionStage, out_events: &mut Vec<Event>) {
        if self.stage == stage {
            return;
        }
        self.stage = stage;
        out_events.push(Event::SessionStageChanged { stage });
    }
}

fn resolve(action: GatedAction, verdict: Verdict, out_events: &mut Vec<Event>) -> Verdict {
    if let Verdict::Rejected(reason) = verdict {
        debug!(?action, %reason, "action rejected");
    }
    out_events.push(Event::ActionResolved { action, verdict });
    verdict
}
