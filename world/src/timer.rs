use std::time::Duration;

/// One-shot countdown measured in simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Countdown {
    remaining: Duration,
}

impl Countdown {
    pub(crate) const fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    /// Consumes up to `dt`, returning the unconsumed overshoot once the
    /// countdown reaches zero.
    pub(crate) fn advance(&mut self, dt: Duration) -> Option<Duration> {
        if dt >= self.remaining {
            let overshoot = dt - self.remaining;
            self.remaining = Duration::ZERO;
            Some(overshoot)
        } else {
            self.remaining -= dt;
            None
        }
    }
}

/// Most pulses reported by a single [`Pulse::advance`]; any older backlog is
/// dropped so one long step cannot replay an unbounded burst.
pub(crate) const MAX_CATCH_UP_PULSES: u32 = 16;

/// Fixed-period repeating pulse; the first fire happens one full period after
/// the pulse starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pulse {
    period: Duration,
    accumulated: Duration,
}

impl Pulse {
    pub(crate) const fn new(period: Duration) -> Self {
        Self {
            period,
            accumulated: Duration::ZERO,
        }
    }

    /// Accumulates `dt` and returns how many periods elapsed, capped at
    /// [`MAX_CATCH_UP_PULSES`]. The phase within the current period is kept.
    pub(crate) fn advance(&mut self, dt: Duration) -> u32 {
        if self.period.is_zero() {
            return 0;
        }

        let accumulated = self.accumulated.saturating_add(dt).as_nanos();
        let period = self.period.as_nanos();
        let remainder = u64::try_from(accumulated % period).unwrap_or(u64::MAX);
        self.accumulated = Duration::from_nanos(remainder);

        u32::try_from(accumulated / period)
            .unwrap_or(u32::MAX)
            .min(MAX_CATCH_UP_PULSES)
    }

    pub(crate) fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
