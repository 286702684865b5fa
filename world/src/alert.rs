use std::time::Duration;

use seizure_drill_core::{AlertState, Event, FeedbackKind};

use crate::timer::Pulse;

/// Interval between heavy feedback pulses while the alert is signalling.
pub(crate) const ALERT_PERIOD: Duration = Duration::from_millis(400);

/// Periodic emitter that is only active while the activity level exceeds the
/// alert threshold. Owned and driven exclusively by `ActivityState`.
#[derive(Debug, Default)]
pub(crate) struct AlertSignaler {
    pulse: Option<Pulse>,
}

impl AlertSignaler {
    pub(crate) fn state(&self) -> AlertState {
        if self.pulse.is_some() {
            AlertState::Signaling
        } else {
            AlertState::Idle
        }
    }

    /// Begins periodic signalling. Returns `false` when already running.
    pub(crate) fn start(&mut self) -> bool {
        if self.pulse.is_some() {
            return false;
        }
        self.pulse = Some(Pulse::new(ALERT_PERIOD));
        true
    }

    /// Cancels any pending pulse. Returns `false` when already idle.
    pub(crate) fn stop(&mut self) -> bool {
        self.pulse.take().is_some()
    }

    pub(crate) fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(pulse) = self.pulse.as_mut() else {
            return;
        };

        for _ in 0..pulse.advance(dt) {
            out_events.push(Event::Feedback {
                kind: FeedbackKind::Heavy,
            });
        }
    }
}
