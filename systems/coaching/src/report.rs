use std::{fmt, time::Duration};

use seizure_drill_core::{SessionSnapshot, SessionStage};
use serde::Serialize;

/// End-of-drill summary built from a completed session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DrillReport {
    /// Time between starting the stopwatch and turning the person.
    pub elapsed: Duration,
    /// Whether the seizure was timed.
    pub timed: bool,
    /// Whether soft material was placed under the head.
    pub protected: bool,
    /// Whether the person ended in the recovery position.
    pub recovery_position: bool,
}

impl DrillReport {
    /// Builds the report once the drill is complete.
    #[must_use]
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Option<Self> {
        let SessionStage::Complete { elapsed } = snapshot.stage else {
            return None;
        };
        Some(Self {
            elapsed,
            timed: snapshot.gates.timing_started,
            protected: snapshot.gates.cushion_placed,
            recovery_position: snapshot.gates.turned_on_side,
        })
    }
}

impl fmt::Display for DrillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Life Saved.")?;
        writeln!(f, "STAY  Timed Seizure: {}", format_clock(self.elapsed))?;
        if self.protected {
            writeln!(f, "SAFE  Soft material placed")?;
        }
        if self.recovery_position {
            write!(f, "SIDE  Person turned to side")?;
        }
        Ok(())
    }
}

/// Renders a duration as `MM:SS`, truncating to whole seconds.
#[must_use]
pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
