//! Euclidean gate generator: pattern, mode, sequencer and the rack module tying them together.

pub mod gate;
pub mod mode;
pub mod pattern;
pub mod sequencer;

pub use gate::{EuclideanGate, InputId, LightId, OutputId, ParamId};
pub use mode::{Mode, Rhythm, StepRange};
pub use pattern::{MAX_STEPS, Pattern};
pub use sequencer::{Gate, StepReport, StepSequencer};
