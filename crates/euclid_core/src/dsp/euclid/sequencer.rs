use serde::Serialize;

use super::mode::{Rhythm, StepRange};
use crate::dsp::utils::{SchmittTrigger, wrap_index};

/// Which output a clock edge fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Gate {
    /// The pattern cell was an onset.
    Main,
    /// The pattern cell was a rest.
    Aux,
}

/// What happened on a clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    /// Cursor position the edge was read at.
    pub step: usize,
    /// Pattern index after applying the offset.
    pub index: usize,
    pub gate: Gate,
}

/// Clock-driven cursor over a [`Rhythm`].
///
/// Reset is evaluated before clock within a sample, so a reset and a clock
/// arriving together read step 0.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    step: usize,
    range: StepRange,
    clock: SchmittTrigger,
    reset: SchmittTrigger,
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self {
            step: 0,
            range: StepRange::Sixteen,
            clock: SchmittTrigger::default(),
            reset: SchmittTrigger::default(),
        }
    }
}

impl StepSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run both edge detectors on one sample and step if the clock rose.
    pub fn process(&mut self, clock: f32, reset: f32, rhythm: &Rhythm) -> Option<StepReport> {
        if self.reset.process(reset) {
            self.reset();
        }

        if self.clock.process(clock) {
            Some(self.advance(rhythm))
        } else {
            None
        }
    }

    /// Handle a clock edge: read the cell under the offset cursor, then move on.
    pub fn advance(&mut self, rhythm: &Rhythm) -> StepReport {
        let step = self.step;
        let index = wrap_index(
            step as i64 + rhythm.offset as i64,
            self.range.num_steps(),
        );
        // The index wraps over the whole range, so in Normal mode it can land past
        // a shorter pattern. Those cells are rests and fire aux.
        let gate = if rhythm.pattern.cell(index) {
            Gate::Main
        } else {
            Gate::Aux
        };

        self.step += 1;
        if self.step >= rhythm.bound.max(1) {
            self.step = 0;
        }

        StepReport { step, index, gate }
    }

    /// Move the cursor back to the first step.
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// Latch a range switch position.
    pub fn set_range(&mut self, range: StepRange) {
        self.range = range;
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn range(&self) -> StepRange {
        self.range
    }

    pub fn num_steps(&self) -> usize {
        self.range.num_steps()
    }
}
