use std::time::Duration;

use seizure_drill_core::{ActivityLevel, AlertState, Event};
use tracing::debug;

use crate::alert::AlertSignaler;

/// Scalar excitability model with threshold-triggered alerting.
///
/// Every mutation clamps the level into range and re-evaluates the alert, so
/// `alert_state() == Signaling` holds exactly when the level exceeds
/// [`ActivityLevel::ALERT_THRESHOLD`].
#[derive(Debug, Default)]
pub struct ActivityState {
    level: ActivityLevel,
    alert: AlertSignaler,
    relapse_spent: bool,
}

impl ActivityState {
    /// Creates a model resting at the baseline level with the alert idle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clamped level.
    #[must_use]
    pub const fn level(&self) -> ActivityLevel {
        self.level
    }

    /// Whether the periodic alert is currently signalling.
    #[must_use]
    pub fn alert_state(&self) -> AlertState {
        self.alert.state()
    }

    /// Raises the level by `amount`, saturating at the ceiling.
    pub fn add_stress(&mut self, amount: f64, out_events: &mut Vec<Event>) {
        self.replace(self.level.raised_by(amount), out_events);
    }

    /// Lowers the level by `amount`, saturating at the floor.
    pub fn calm_down(&mut self, amount: f64, out_events: &mut Vec<Event>) {
        self.replace(self.level.lowered_by(amount), out_events);
    }

    /// Overwrites the level, clamping the value into range.
    pub fn set_level(&mut self, value: f64, out_events: &mut Vec<Event>) {
        self.replace(ActivityLevel::new(value), out_events);
    }

    /// Jumps to [`ActivityLevel::RELAPSE`] when the level is calm enough.
    ///
    /// Fires at most once; returns whether the relapse happened.
    pub fn trigger_relapse(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.relapse_spent || self.level.get() > ActivityLevel::RELAPSE_TRIGGER_CEILING {
            debug!(level = self.level.get(), spent = self.relapse_spent, "relapse skipped");
            return false;
        }
        self.relapse_spent = true;
        self.replace(ActivityLevel::RELAPSE, out_events);
        true
    }

    /// Advances the alert's periodic emitter.
    pub fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.alert.advance(dt, out_events);
    }

    fn replace(&mut self, next: ActivityLevel, out_events: &mut Vec<Event>) {
        if next != self.level {
            self.level = next;
            out_events.push(Event::ActivityChanged { level: next });
        }
        self.evaluate_alert(out_events);
    }

    fn evaluate_alert(&mut self, out_events: &mut Vec<Event>) {
        let changed = if self.level.exceeds_alert_threshold() {
            self.alert.start()
        } else {
            self.alert.stop()
        };

        if changed {
            let state = self.alert.state();
            debug!(level = self.level.get(), ?state, "activity alert changed");
            out_events.push(Event::AlertChanged { state });
        }
    }
}
