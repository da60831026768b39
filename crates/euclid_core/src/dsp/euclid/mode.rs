use std::borrow::Cow;
use std::fmt;

use anyhow::{Result, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::pattern::Pattern;

/// How the indexed pattern is built from the steps and pulses controls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// A single `steps`/`pulses` Euclidean pattern.
    #[default]
    Normal,
    /// Two full-length patterns, one using steps as its pulse count, combined with XOR.
    Xor,
}

impl Mode {
    /// Mode switch position: up (1) is Normal, down (0) is XOR.
    pub fn from_switch(value: f32) -> Self {
        if value >= 0.5 { Mode::Normal } else { Mode::Xor }
    }

    pub fn switch_value(self) -> f32 {
        match self {
            Mode::Normal => 1.0,
            Mode::Xor => 0.0,
        }
    }

    /// Build the pattern the sequencer reads from.
    ///
    /// `steps` and `pulses` are expected to be clamped to the active range already.
    pub fn pattern(self, num_steps: usize, steps: usize, pulses: usize) -> Pattern {
        match self {
            Mode::Normal => Pattern::generate(steps, pulses.min(steps)),
            Mode::Xor => {
                let by_steps = Pattern::generate(num_steps, steps);
                let by_pulses = Pattern::generate(num_steps, pulses);
                by_steps.xor(&by_pulses)
            }
        }
    }

    /// Where the step cursor wraps back to zero.
    pub fn step_bound(self, num_steps: usize, steps: usize) -> usize {
        match self {
            Mode::Normal => steps.max(1),
            Mode::Xor => num_steps,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => f.write_str("normal"),
            Mode::Xor => f.write_str("xor"),
        }
    }
}

/// Position of the 16/32 range switch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum StepRange {
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl StepRange {
    /// Switch down (0) selects 16 steps, up (1) selects 32.
    pub fn from_switch(value: f32) -> Self {
        if value >= 0.5 {
            StepRange::ThirtyTwo
        } else {
            StepRange::Sixteen
        }
    }

    pub fn switch_value(self) -> f32 {
        match self {
            StepRange::Sixteen => 0.0,
            StepRange::ThirtyTwo => 1.0,
        }
    }

    pub fn num_steps(self) -> usize {
        match self {
            StepRange::Sixteen => 16,
            StepRange::ThirtyTwo => 32,
        }
    }
}

impl TryFrom<u32> for StepRange {
    type Error = anyhow::Error;

    fn try_from(steps: u32) -> Result<Self> {
        match steps {
            16 => Ok(StepRange::Sixteen),
            32 => Ok(StepRange::ThirtyTwo),
            other => bail!("step range must be 16 or 32, got {}", other),
        }
    }
}

impl From<StepRange> for u32 {
    fn from(range: StepRange) -> u32 {
        range.num_steps() as u32
    }
}

impl JsonSchema for StepRange {
    fn schema_name() -> Cow<'static, str> {
        Cow::Borrowed("StepRange")
    }

    fn json_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "description": "Number of steps selected by the range switch",
            "type": "integer",
            "enum": [16, 32]
        })
    }
}

/// Everything the sequencer needs to handle a clock edge during one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rhythm {
    pub pattern: Pattern,
    pub offset: usize,
    pub bound: usize,
}

impl Rhythm {
    pub fn new(mode: Mode, range: StepRange, steps: usize, pulses: usize, offset: usize) -> Self {
        let num_steps = range.num_steps();
        Self {
            pattern: mode.pattern(num_steps, steps, pulses),
            offset,
            bound: mode.step_bound(num_steps, steps),
        }
    }
}

impl Default for Rhythm {
    fn default() -> Self {
        let range = StepRange::default();
        let num_steps = range.num_steps();
        Rhythm::new(Mode::Normal, range, num_steps, num_steps, 0)
    }
}
