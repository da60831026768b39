pub mod euclid;
pub mod utils;

/// Duration of a gate pulse in seconds.
pub const TRIGGER_TIME: f32 = 1e-3;

/// Voltage emitted by an output while its gate is high.
pub const GATE_VOLTAGE: f32 = 10.0;
