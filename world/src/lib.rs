#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative drill state for the seizure first-aid trainer.
//!
//! [`apply`] is the only mutation path: user input, alert pulses, incident
//! timers, and stage transitions are all serialized through it, so no two
//! producers can interleave a partial update.

mod activity;
mod alert;
mod incident;
mod session;
mod timer;

use std::{fmt, time::Duration};

use seizure_drill_core::{ActivityLevel, Command, Event, RandomSource, SeededRandom};
use tracing::trace;

pub use activity::ActivityState;
pub use incident::{IncidentScheduler, IncidentTiming, RollOutcome};
pub use session::{TrainingSession, DEFAULT_COMPLETION_DELAY};

const DEFAULT_SEED: u64 = 0x5e12_0d21_11a5_e0f7;

/// Configuration used to construct a [`World`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    /// Seed for the incident's random duration draw.
    pub seed: u64,
    /// Delays applied to the scripted incident.
    pub incident: IncidentTiming,
    /// Delay between the final accepted action and the completed stage.
    pub completion_delay: Duration,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            incident: IncidentTiming::default(),
            completion_delay: DEFAULT_COMPLETION_DELAY,
        }
    }
}

/// Represents the authoritative drill state.
///
/// Holds the single activity model for the whole session and the training
/// session for the current drill entry.
pub struct World {
    clock: Duration,
    activity: ActivityState,
    session: TrainingSession,
    random: Box<dyn RandomSource + Send>,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a world whose randomness is seeded from the configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self::with_random(config, Box::new(SeededRandom::from_seed(config.seed)))
    }

    /// Creates a world drawing randomness from the provided source. The
    /// configured seed is ignored.
    #[must_use]
    pub fn with_random(config: WorldConfig, random: Box<dyn RandomSource + Send>) -> Self {
        Self {
            clock: Duration::ZERO,
            activity: ActivityState::new(),
            session: TrainingSession::new(config.incident, config.completion_delay),
            random,
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("clock", &self.clock)
            .field("activity", &self.activity)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    trace!(?command, "applying command");
    match command {
        Command::Tick { dt } => {
            world.clock = world.clock.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });
            world.activity.advance(dt, out_events);
            world.session.advance(dt, world.random.as_mut(), out_events);
        }
        Command::AddStress { amount } => world.activity.add_stress(amount, out_events),
        Command::CalmDown { amount } => world.activity.calm_down(amount, out_events),
        Command::SetActivityLevel { level } => world.activity.set_level(level, out_events),
        Command::ApplyStressor { stressor } => {
            world.activity.add_stress(stressor.magnitude(), out_events);
        }
        Command::ApplyRemedy { remedy } => {
            world.activity.calm_down(remedy.magnitude(), out_events);
        }
        Command::RestoreBaseline => {
            world.activity.set_level(ActivityLevel::RESTORED.get(), out_events);
        }
        Command::TriggerRelapse => {
            let _ = world.activity.trigger_relapse(out_events);
        }
        Command::BeginDrill => {
            let _ = world.session.begin(&mut world.activity, out_events);
        }
        Command::ResetDrill => world.session.reset(&mut world.activity, out_events),
        Command::StartTiming => {
            let _ = world.session.attempt_start_timing(world.clock, out_events);
        }
        Command::PlaceCushion => {
            let _ = world.session.attempt_place_cushion(out_events);
        }
        Command::TurnOnSide => {
            let _ = world.session.attempt_turn_side(world.clock, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{IncidentScheduler, World};
    use seizure_drill_core::{
        ActivityLevel, AlertState, GateFlags, IncidentPhase, SessionSnapshot, SessionStage,
    };

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Current activity level.
    #[must_use]
    pub fn activity_level(world: &World) -> ActivityLevel {
        world.activity.level()
    }

    /// Whether the threshold alert is signalling.
    #[must_use]
    pub fn alert_state(world: &World) -> AlertState {
        world.activity.alert_state()
    }

    /// Provides read-only access to the current drill's incident.
    #[must_use]
    pub fn incident(world: &World) -> &IncidentScheduler {
        world.session.incident()
    }

    /// Current incident phase.
    #[must_use]
    pub fn incident_phase(world: &World) -> IncidentPhase {
        world.session.incident().phase()
    }

    /// Current drill stage.
    #[must_use]
    pub fn session_stage(world: &World) -> SessionStage {
        world.session.stage()
    }

    /// Current gate flags.
    #[must_use]
    pub fn gate_flags(world: &World) -> GateFlags {
        world.session.gates()
    }

    /// Captures every observable value in one snapshot.
    #[must_use]
    pub fn snapshot(world: &World) -> SessionSnapshot {
        let incident = world.session.incident();
        SessionSnapshot {
            clock: world.clock,
            level: world.activity.level(),
            alert: world.activity.alert_state(),
            phase: incident.phase(),
            pose: incident.pose(),
            cushion_applied: incident.cushion_applied(),
            stage: world.session.stage(),
            gates: world.session.gates(),
        }
    }
}
