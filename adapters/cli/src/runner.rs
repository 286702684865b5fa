use std::{collections::VecDeque, time::Duration};

use seizure_drill_core::{
    Command, Event, FeedbackKind, IncidentPhase, SeededRandom, SessionSnapshot, SessionStage,
};
use seizure_drill_system_coaching::{format_clock, Coaching, Cue, DrillReport};
use seizure_drill_system_waveform::WaveformSynthesizer;
use seizure_drill_world::{self as world, query, World, WorldConfig};
use serde::Serialize;
use tracing::{debug, info};

use crate::script::{DrillScript, ScriptedStep};

const WAVEFORM_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Counts of every feedback signal emitted during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct FeedbackTally {
    light: u32,
    medium: u32,
    heavy: u32,
    success: u32,
    error: u32,
    warning: u32,
}

impl FeedbackTally {
    fn record(&mut self, kind: FeedbackKind) {
        let slot = match kind {
            FeedbackKind::Light => &mut self.light,
            FeedbackKind::Medium => &mut self.medium,
            FeedbackKind::Heavy => &mut self.heavy,
            FeedbackKind::Success => &mut self.success,
            FeedbackKind::Error => &mut self.error,
            FeedbackKind::Warning => &mut self.warning,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Coaching cue stamped with the simulated time it was shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct TimedCue {
    pub(crate) at: String,
    #[serde(flatten)]
    pub(crate) cue: Cue,
}

/// Everything observed while running one drill.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct RunSummary {
    pub(crate) seed: u64,
    pub(crate) ticks: u64,
    pub(crate) cues: Vec<TimedCue>,
    pub(crate) feedback: FeedbackTally,
    pub(crate) waveform_samples: usize,
    pub(crate) snapshot: SessionSnapshot,
    pub(crate) report: Option<DrillReport>,
}

enum Responder {
    Scripted(VecDeque<ScriptedStep>),
    Automatic,
}

impl Responder {
    fn from_script(script: &DrillScript) -> Self {
        if script.actions.is_empty() {
            Self::Automatic
        } else {
            Self::Scripted(script.actions.iter().copied().collect())
        }
    }

    /// Commands due at `now`; the automatic responder follows the correct protocol.
    fn poll(&mut self, now: Duration, snapshot: &SessionSnapshot, out: &mut Vec<Command>) {
        match self {
            Self::Scripted(steps) => {
                while let Some(step) = steps.front() {
                    if Duration::from_millis(step.at_ms) > now {
                        break;
                    }
                    out.push(step.action.command());
                    let _ = steps.pop_front();
                }
            }
            Self::Automatic => {
                let gates = snapshot.gates;
                if snapshot.phase.is_shaking() && !gates.timing_started {
                    out.push(Command::StartTiming);
                } else if gates.timing_started && !gates.cushion_placed {
                    out.push(Command::PlaceCushion);
                } else if gates.cushion_placed
                    && !gates.turned_on_side
                    && snapshot.phase == IncidentPhase::Stabilizing
                {
                    out.push(Command::TurnOnSide);
                }
            }
        }
    }
}

struct Driver {
    world: World,
    waveform: WaveformSynthesizer,
    wave_random: SeededRandom,
    coaching: Coaching,
    cues: Vec<TimedCue>,
    feedback: FeedbackTally,
}

impl Driver {
    fn send(&mut self, command: Command) {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);

        for event in &events {
            match event {
                Event::Feedback { kind } => self.feedback.record(*kind),
                Event::SessionStageChanged {
                    stage: SessionStage::Briefing,
                } => self.waveform.reset(),
                _ => {}
            }
        }
        self.waveform.handle(
            &events,
            query::activity_level(&self.world),
            &mut self.wave_random,
        );

        let mut cues = Vec::new();
        self.coaching.handle(&events, &mut cues);
        let at = format_clock(query::clock(&self.world));
        for cue in cues {
            info!(at = %at, message = cue.message, "coach");
            self.cues.push(TimedCue { at: at.clone(), cue });
        }
    }
}

/// Runs one drill to completion or until the script's time limit.
pub(crate) fn run(script: &DrillScript, seed: u64) -> RunSummary {
    let config = WorldConfig {
        seed,
        ..WorldConfig::default()
    };
    let mut driver = Driver {
        world: World::with_config(config),
        waveform: WaveformSynthesizer::default(),
        wave_random: SeededRandom::from_seed(seed ^ WAVEFORM_SEED_SALT),
        coaching: Coaching::new(),
        cues: Vec::new(),
        feedback: FeedbackTally::default(),
    };
    let mut responder = Responder::from_script(script);
    let tick = script.tick();
    let mut ticks = 0_u64;
    let mut due = Vec::new();

    info!(seed, tick_ms = script.tick_ms, "running drill");
    driver.send(Command::BeginDrill);

    while query::clock(&driver.world) < script.max_duration() {
        responder.poll(
            query::clock(&driver.world),
            &query::snapshot(&driver.world),
            &mut due,
        );
        for command in due.drain(..) {
            debug!(?command, "responder action");
            driver.send(command);
        }

        driver.send(Command::Tick { dt: tick });
        ticks += 1;

        if matches!(
            query::session_stage(&driver.world),
            SessionStage::Complete { .. }
        ) {
            break;
        }
    }

    let snapshot = query::snapshot(&driver.world);
    RunSummary {
        seed,
        ticks,
        cues: driver.cues,
        feedback: driver.feedback,
        waveform_samples: driver.waveform.samples().len(),
        snapshot,
        report: DrillReport::from_snapshot(&snapshot),
    }
}
