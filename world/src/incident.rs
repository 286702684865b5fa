use std::time::Duration;

use seizure_drill_core::{Event, FeedbackKind, IncidentPhase, Pose, RandomSource};
use tracing::{debug, warn};

use crate::timer::{Countdown, Pulse};

/// Tuning knobs for every delay in the scripted incident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncidentTiming {
    /// Delay between scheduling and the onset of the fall.
    pub settle_delay: Duration,
    /// Length of the fall before shaking begins.
    pub fall_window: Duration,
    /// Shortest shaking window that may be drawn.
    pub active_min: Duration,
    /// Longest shaking window that may be drawn.
    pub active_max: Duration,
    /// Time taken to roll the person into the recovery position.
    pub roll_duration: Duration,
    /// Interval between tremor feedback pulses while shaking.
    pub tremor_period: Duration,
}

impl Default for IncidentTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1_500),
            fall_window: Duration::from_millis(400),
            active_min: Duration::from_secs(15),
            active_max: Duration::from_secs(25),
            roll_duration: Duration::from_millis(800),
            tremor_period: Duration::from_millis(100),
        }
    }
}

/// Result of asking the scheduler to roll the person onto their side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollOutcome {
    /// The person is shaking; nothing changed.
    Unsafe,
    /// The roll started and will resolve the incident.
    Rolling,
    /// A roll was already started or finished.
    AlreadyRolled,
}

/// Sequences the phases of one simulated emergency.
///
/// Pending → Onset → Active(duration) → Stabilizing → Resolved. The scheduler
/// owns every countdown involved, so discarding it cancels them all.
#[derive(Debug)]
pub struct IncidentScheduler {
    timing: IncidentTiming,
    phase: IncidentPhase,
    pose: Pose,
    countdown: Option<Countdown>,
    tremor: Pulse,
    cushion_applied: bool,
    rolling: bool,
}

impl IncidentScheduler {
    /// Creates an idle scheduler in the pending phase.
    #[must_use]
    pub fn new(timing: IncidentTiming) -> Self {
        Self {
            timing,
            phase: IncidentPhase::Pending,
            pose: Pose::Standing,
            countdown: None,
            tremor: Pulse::new(timing.tremor_period),
            cushion_applied: false,
            rolling: false,
        }
    }

    /// Current phase of the incident.
    #[must_use]
    pub const fn phase(&self) -> IncidentPhase {
        self.phase
    }

    /// Current posture of the simulated person.
    #[must_use]
    pub const fn pose(&self) -> Pose {
        self.pose
    }

    /// True exactly while the incident is in the active phase.
    #[must_use]
    pub const fn is_shaking(&self) -> bool {
        self.phase.is_shaking()
    }

    /// Whether a cushion has been placed.
    #[must_use]
    pub const fn cushion_applied(&self) -> bool {
        self.cushion_applied
    }

    /// Arms the settle delay that leads into the onset.
    ///
    /// Ignored unless the scheduler is pending and unarmed.
    pub fn schedule(&mut self) {
        if self.phase != IncidentPhase::Pending || self.countdown.is_some() {
            warn!(phase = ?self.phase, "incident already scheduled");
            return;
        }
        self.countdown = Some(Countdown::new(self.timing.settle_delay));
    }

    /// Advances every countdown by `dt`, carrying overshoot across phases.
    pub fn advance(
        &mut self,
        dt: Duration,
        random: &mut dyn RandomSource,
        out_events: &mut Vec<Event>,
    ) {
        let mut budget = dt;
        while let Some(countdown) = self.countdown.as_mut() {
            match countdown.advance(budget) {
                None => {
                    self.emit_tremor(budget, out_events);
                    return;
                }
                Some(overshoot) => {
                    self.emit_tremor(budget - overshoot, out_events);
                    self.countdown = None;
                    self.on_expiry(random, out_events);
                    budget = overshoot;
                }
            }
        }
    }

    /// Places the cushion. Gating is the caller's responsibility.
    pub fn apply_cushion(&mut self, out_events: &mut Vec<Event>) {
        self.cushion_applied = true;
        out_events.push(Event::CushionApplied);
        out_events.push(Event::Feedback {
            kind: FeedbackKind::Light,
        });
    }

    /// Starts rolling the person onto their side unless they are shaking.
    pub fn roll_to_side(&mut self, out_events: &mut Vec<Event>) -> RollOutcome {
        if self.is_shaking() {
            debug!("roll refused while shaking");
            return RollOutcome::Unsafe;
        }
        if self.rolling || self.phase == IncidentPhase::Resolved {
            return RollOutcome::AlreadyRolled;
        }

        if self.phase != IncidentPhase::Stabilizing {
            self.enter(IncidentPhase::Stabilizing, Pose::Settled, out_events);
        }
        self.rolling = true;
        self.countdown = Some(Countdown::new(self.timing.roll_duration));
        RollOutcome::Rolling
    }

    fn on_expiry(&mut self, random: &mut dyn RandomSource, out_events: &mut Vec<Event>) {
        match self.phase {
            IncidentPhase::Pending => {
                self.enter(IncidentPhase::Onset, Pose::Falling, out_events);
                self.countdown = Some(Countdown::new(self.timing.fall_window));
            }
            IncidentPhase::Onset => {
                let duration = self.draw_active_duration(random);
                self.enter(IncidentPhase::Active { duration }, Pose::Seizing, out_events);
                out_events.push(Event::Feedback {
                    kind: FeedbackKind::Heavy,
                });
                self.tremor.restart();
                self.countdown = Some(Countdown::new(duration));
            }
            IncidentPhase::Active { .. } => {
                self.enter(IncidentPhase::Stabilizing, Pose::Settled, out_events);
            }
            IncidentPhase::Stabilizing => {
                self.rolling = false;
                self.enter(IncidentPhase::Resolved, Pose::RecoveryPosition, out_events);
                out_events.push(Event::Feedback {
                    kind: FeedbackKind::Success,
                });
            }
            IncidentPhase::Resolved => {}
        }
    }

    fn draw_active_duration(&self, random: &mut dyn RandomSource) -> Duration {
        let low = self.timing.active_min.as_secs_f64();
        let high = self.timing.active_max.as_secs_f64().max(low);
        Duration::from_secs_f64(random.uniform(low, high))
    }

    fn enter(&mut self, phase: IncidentPhase, pose: Pose, out_events: &mut Vec<Event>) {
        debug!(from = ?self.phase, to = ?phase, "incident phase changed");
        self.phase = phase;
        out_events.push(Event::IncidentPhaseChanged { phase });
        if self.pose != pose {
            self.pose = pose;
            out_events.push(Event::PoseChanged { pose });
        }
    }

    fn emit_tremor(&mut self, elapsed: Duration, out_events: &mut Vec<Event>) {
        if !self.is_shaking() {
            return;
        }
        for _ in 0..self.tremor.advance(elapsed) {
            out_events.push(Event::Feedback {
                kind: FeedbackKind::Light,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl RandomSource for Constant {
        fn next_unit(&mut self) -> f64 {
            self.0
        }
    }

    fn phases(events: &[Event]) -> Vec<IncidentPhase> {
        events
            .iter()
            .filter_map(|event| match event {
                Event::IncidentPhaseChanged { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn unscheduled_incident_never_progresses() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        let mut events = Vec::new();
        scheduler.advance(Duration::from_secs(60), &mut Constant(0.5), &mut events);
        assert_eq!(scheduler.phase(), IncidentPhase::Pending);
        assert!(events.is_empty());
    }

    #[test]
    fn single_large_step_walks_through_every_timed_phase() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        scheduler.schedule();
        let mut events = Vec::new();
        scheduler.advance(Duration::from_secs(30), &mut Constant(0.5), &mut events);

        assert_eq!(
            phases(&events),
            vec![
                IncidentPhase::Onset,
                IncidentPhase::Active {
                    duration: Duration::from_secs(20)
                },
                IncidentPhase::Stabilizing,
            ]
        );
        assert_eq!(scheduler.pose(), Pose::Settled);
        assert!(!scheduler.is_shaking());
    }

    #[test]
    fn active_duration_spans_the_configured_window() {
        for (unit, expected) in [(0.0, 15.0), (0.5, 20.0), (0.999, 24.99)] {
            let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
            scheduler.schedule();
            let mut events = Vec::new();
            scheduler.advance(Duration::from_millis(1_900), &mut Constant(unit), &mut events);

            let IncidentPhase::Active { duration } = scheduler.phase() else {
                panic!("expected active phase, found {:?}", scheduler.phase());
            };
            assert!((duration.as_secs_f64() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn tremor_pulses_only_while_shaking() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        scheduler.schedule();
        let mut events = Vec::new();
        scheduler.advance(Duration::from_millis(1_900), &mut Constant(0.0), &mut events);
        events.clear();

        scheduler.advance(Duration::from_secs(1), &mut Constant(0.0), &mut events);
        let light = events
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::Feedback {
                        kind: FeedbackKind::Light
                    }
                )
            })
            .count();
        assert_eq!(light, 10);
    }

    #[test]
    fn roll_is_refused_while_shaking() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        scheduler.schedule();
        let mut events = Vec::new();
        scheduler.advance(Duration::from_secs(2), &mut Constant(0.5), &mut events);
        assert!(scheduler.is_shaking());

        events.clear();
        assert_eq!(scheduler.roll_to_side(&mut events), RollOutcome::Unsafe);
        assert!(events.is_empty(), "refused roll must not change state");
        assert!(scheduler.is_shaking());
    }

    #[test]
    fn roll_after_stabilizing_resolves_with_success() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        scheduler.schedule();
        let mut events = Vec::new();
        scheduler.advance(Duration::from_secs(30), &mut Constant(0.5), &mut events);

        events.clear();
        assert_eq!(scheduler.roll_to_side(&mut events), RollOutcome::Rolling);
        assert_eq!(scheduler.roll_to_side(&mut events), RollOutcome::AlreadyRolled);
        scheduler.advance(Duration::from_millis(800), &mut Constant(0.5), &mut events);

        assert_eq!(scheduler.phase(), IncidentPhase::Resolved);
        assert_eq!(scheduler.pose(), Pose::RecoveryPosition);
        assert!(events.contains(&Event::Feedback {
            kind: FeedbackKind::Success
        }));
    }

    #[test]
    fn roll_before_onset_abandons_the_schedule() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        scheduler.schedule();
        let mut events = Vec::new();
        assert_eq!(scheduler.roll_to_side(&mut events), RollOutcome::Rolling);
        scheduler.advance(Duration::from_secs(5), &mut Constant(0.5), &mut events);

        assert_eq!(
            phases(&events),
            vec![IncidentPhase::Stabilizing, IncidentPhase::Resolved]
        );
    }

    #[test]
    fn cushion_is_an_unconditional_cue() {
        let mut scheduler = IncidentScheduler::new(IncidentTiming::default());
        let mut events = Vec::new();
        scheduler.apply_cushion(&mut events);
        assert!(scheduler.cushion_applied());
        assert_eq!(
            events,
            vec![
                Event::CushionApplied,
                Event::Feedback {
                    kind: FeedbackKind::Light
                }
            ]
        );
    }
}
