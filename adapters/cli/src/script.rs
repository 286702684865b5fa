use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use seizure_drill_core::{Command, Remedy, Stressor};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const DEFAULT_TICK_MS: u64 = 100;
pub(crate) const DEFAULT_MAX_DURATION_MS: u64 = 60_000;

/// Drill description loaded from a TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DrillScript {
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    #[serde(default = "default_tick_ms")]
    pub(crate) tick_ms: u64,
    #[serde(default = "default_max_duration_ms")]
    pub(crate) max_duration_ms: u64,
    #[serde(default)]
    pub(crate) actions: Vec<ScriptedStep>,
}

/// A trainee action issued once the simulated clock reaches `at_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScriptedStep {
    pub(crate) at_ms: u64,
    pub(crate) action: ScriptedAction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScriptedAction {
    Begin,
    Reset,
    StartTiming,
    PlaceCushion,
    TurnOnSide,
    RestoreBaseline,
    TriggerRelapse,
    ApplyStressor(Stressor),
    ApplyRemedy(Remedy),
}

impl ScriptedAction {
    pub(crate) const fn command(self) -> Command {
        match self {
            Self::Begin => Command::BeginDrill,
            Self::Reset => Command::ResetDrill,
            Self::StartTiming => Command::StartTiming,
            Self::PlaceCushion => Command::PlaceCushion,
            Self::TurnOnSide => Command::TurnOnSide,
            Self::RestoreBaseline => Command::RestoreBaseline,
            Self::TriggerRelapse => Command::TriggerRelapse,
            Self::ApplyStressor(stressor) => Command::ApplyStressor { stressor },
            Self::ApplyRemedy(remedy) => Command::ApplyRemedy { remedy },
        }
    }
}

/// Reasons a parsed drill script cannot be run.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScriptError {
    #[error("tick size must be greater than zero")]
    ZeroTick,
    #[error("maximum duration {max_duration_ms}ms is shorter than one {tick_ms}ms tick")]
    DurationTooShort { max_duration_ms: u64, tick_ms: u64 },
    #[error("action #{index} at {at_ms}ms is scheduled before the previous action")]
    ActionsOutOfOrder { index: usize, at_ms: u64 },
    #[error("action #{index} at {at_ms}ms is past the maximum duration of {max_duration_ms}ms")]
    ActionAfterEnd {
        index: usize,
        at_ms: u64,
        max_duration_ms: u64,
    },
}

impl DrillScript {
    /// Script driven by the built-in responder.
    pub(crate) fn automatic() -> Self {
        Self {
            seed: None,
            tick_ms: DEFAULT_TICK_MS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            actions: Vec::new(),
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read drill script at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid drill script at {}", path.display()))
    }

    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let script: Self =
            toml::from_str(contents).context("failed to parse drill script toml contents")?;
        script.validate()?;
        Ok(script)
    }

    pub(crate) fn validate(&self) -> Result<(), ScriptError> {
        if self.tick_ms == 0 {
            return Err(ScriptError::ZeroTick);
        }
        if self.max_duration_ms < self.tick_ms {
            return Err(ScriptError::DurationTooShort {
                max_duration_ms: self.max_duration_ms,
                tick_ms: self.tick_ms,
            });
        }

        let mut previous = 0;
        for (index, step) in self.actions.iter().enumerate() {
            if step.at_ms < previous {
                return Err(ScriptError::ActionsOutOfOrder {
                    index,
                    at_ms: step.at_ms,
                });
            }
            if step.at_ms > self.max_duration_ms {
                return Err(ScriptError::ActionAfterEnd {
                    index,
                    at_ms: step.at_ms,
                    max_duration_ms: self.max_duration_ms,
                });
            }
            previous = step.at_ms;
        }
        Ok(())
    }

    pub(crate) const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub(crate) const fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

fn default_tick_ms() -> u64 {
    DEFAULT_TICK_MS
}

fn default_max_duration_ms() -> u64 {
    DEFAULT_MAX_DURATION_MS
}
