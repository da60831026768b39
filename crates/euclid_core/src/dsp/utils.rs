/// Low threshold of the rack's gate inputs. An input at or below it re-arms a trigger.
pub const GATE_LOW_THRESHOLD: f32 = 0.1;

/// High threshold of the rack's gate inputs. An input at or above it is a rising edge.
pub const GATE_HIGH_THRESHOLD: f32 = 1.0;

/// Wrap a possibly negative index into `0..len`. Returns 0 for an empty range.
pub fn wrap_index(index: i64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    index.rem_euclid(len as i64) as usize
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchmittState {
    Low,
    High,
    Uninitialized,
}

/// Reusable Schmitt trigger with hysteresis
#[derive(Debug, Clone, Copy)]
pub struct SchmittTrigger {
    pub state: SchmittState,
    low_threshold: f32,
    high_threshold: f32,
}

impl SchmittTrigger {
    /// Create a new Schmitt trigger with the given thresholds
    pub fn new(low_threshold: f32, high_threshold: f32) -> Self {
        Self {
            state: SchmittState::Uninitialized,
            low_threshold,
            high_threshold,
        }
    }

    /// Process a sample through the Schmitt trigger
    /// Returns true if it toggled from low to high
    pub fn process(&mut self, input: f32) -> bool {
        match self.state {
            SchmittState::Uninitialized => {
                // First sample only sets the level, it never counts as an edge
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                } else {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::High => {
                if input <= self.low_threshold {
                    self.state = SchmittState::Low;
                }
            }
            SchmittState::Low => {
                if input >= self.high_threshold {
                    self.state = SchmittState::High;
                    return true;
                }
            }
        }

        false
    }

    pub fn set_thresholds(&mut self, low_threshold: f32, high_threshold: f32) {
        self.low_threshold = low_threshold;
        self.high_threshold = high_threshold;
    }

    pub fn state(&self) -> SchmittState {
        self.state
    }

    /// Reset state to Uninitialized
    pub fn reset(&mut self) {
        self.state = SchmittState::Uninitialized;
    }
}

impl Default for SchmittTrigger {
    fn default() -> Self {
        Self::new(GATE_LOW_THRESHOLD, GATE_HIGH_THRESHOLD)
    }
}

/// Monostable: holds its output high for a fixed time after a trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PulseGenerator {
    remaining: f32,
}

impl PulseGenerator {
    /// Start a pulse. A running pulse is only ever extended, never shortened.
    pub fn trigger(&mut self, duration: f32) {
        if duration > self.remaining {
            self.remaining = duration;
        }
    }

    /// Advance by `delta_time` seconds. Returns true while the pulse is high.
    pub fn process(&mut self, delta_time: f32) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= delta_time;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::TRIGGER_TIME;

    #[test]
    fn test_wrap_index_within_range() {
        assert_eq!(wrap_index(3, 16), 3);
    }

    #[test]
    fn test_wrap_index_far_above_range() {
        // A single subtraction would leave 40 at 24, modulo gives 8
        assert_eq!(wrap_index(40, 16), 8);
        assert_eq!(wrap_index(32, 16), 0);
    }

    #[test]
    fn test_wrap_index_negative() {
        assert_eq!(wrap_index(-1, 16), 15);
    }

    #[test]
    fn test_wrap_index_empty_range() {
        assert_eq!(wrap_index(5, 0), 0);
    }

    #[test]
    fn test_schmitt_first_sample_is_not_an_edge() {
        let mut trigger = SchmittTrigger::default();
        assert!(!trigger.process(10.0));
        assert_eq!(trigger.state(), SchmittState::High);
    }

    #[test]
    fn test_schmitt_fires_once_per_crossing() {
        let mut trigger = SchmittTrigger::default();
        trigger.process(0.0);

        assert!(trigger.process(5.0), "rising crossing should fire");
        assert!(!trigger.process(5.0), "holding high must not fire again");
        assert!(!trigger.process(10.0));
        assert!(!trigger.process(0.0));
        assert!(trigger.process(5.0), "re-armed trigger should fire again");
    }

    #[test]
    fn test_schmitt_hysteresis_ignores_chatter() {
        let mut trigger = SchmittTrigger::default();
        trigger.process(0.0);
        assert!(trigger.process(1.0));

        // Dipping between the thresholds does not re-arm
        assert!(!trigger.process(0.5));
        assert!(!trigger.process(1.5));
        assert_eq!(trigger.state(), SchmittState::High);

        assert!(!trigger.process(0.1));
        assert_eq!(trigger.state(), SchmittState::Low);
    }

    #[test]
    fn test_schmitt_custom_thresholds_and_reset() {
        let mut trigger = SchmittTrigger::new(-1.0, 1.0);
        trigger.process(-2.0);
        assert!(!trigger.process(0.5));
        assert!(trigger.process(1.0));

        trigger.reset();
        assert_eq!(trigger.state(), SchmittState::Uninitialized);
        assert!(!trigger.process(-2.0));

        trigger.set_thresholds(2.0, 4.0);
        assert!(!trigger.process(3.0));
        assert!(trigger.process(4.0));
    }

    #[test]
    fn test_pulse_generator_holds_for_duration() {
        let sample_time = 1.0 / 48_000.0;
        let mut pulse = PulseGenerator::default();
        assert!(!pulse.process(sample_time));

        pulse.trigger(TRIGGER_TIME);
        let high_samples = (0..200).filter(|_| pulse.process(sample_time)).count();
        // 1ms at 48kHz, allowing one sample of float slack
        assert!(
            (48..=49).contains(&high_samples),
            "expected ~48 high samples, got {}",
            high_samples
        );
        assert!(!pulse.process(sample_time));
    }

    #[test]
    fn test_pulse_generator_retrigger_extends_only() {
        let mut pulse = PulseGenerator::default();
        pulse.trigger(0.01);
        pulse.trigger(0.001);
        assert!(pulse.process(0.005));
        assert!(pulse.process(0.004), "shorter retrigger must not cut the pulse");
        // 1ms left: one more high sample, then low
        assert!(pulse.process(0.004));
        assert!(!pulse.process(0.004));
    }
}
