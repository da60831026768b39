//! Euclidean gate generator core library
//!
//! This crate provides a clock-driven rhythm module with two gate outputs derived
//! from a Euclidean bit pattern, plus the small rack-style host interface it runs
//! against. It has no audio or device I/O: driving the render loop and
//! producing voltages belongs to the host.

pub mod dsp;
pub mod settings;
pub mod types;

// Re-export commonly used items
pub use dsp::euclid::{EuclideanGate, Gate, Mode, Pattern, Rhythm, StepRange, StepReport};
pub use settings::EuclidSettings;
pub use types::{Module, ModuleConfig, ModuleIo, ProcessArgs};
