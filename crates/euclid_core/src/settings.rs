//! Knob positions as a serde document, for hosts that load a patch from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dsp::euclid::{EuclideanGate, Mode, ParamId, StepRange};
use crate::types::ModuleIo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EuclidSettings {
    /// Pattern length (Normal) or first pulse count (XOR)
    pub steps: u32,
    /// Range switch: 16 or 32 steps
    pub range: StepRange,
    /// Number of onsets
    pub pulses: u32,
    /// Normal or XOR pattern combination
    pub mode: Mode,
    /// Read position offset in steps
    pub offset: u32,
}

impl Default for EuclidSettings {
    fn default() -> Self {
        let range = StepRange::default();
        Self {
            steps: range.num_steps() as u32,
            range,
            pulses: range.num_steps() as u32,
            mode: Mode::Normal,
            offset: 0,
        }
    }
}

impl EuclidSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: EuclidSettings =
            serde_json::from_str(json).context("Failed to parse settings JSON")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Reject knob positions the panel could never reach. Pulses above steps are
    /// fine, the module clamps them.
    pub fn validate(&self) -> Result<()> {
        let max = self.range.num_steps() as u32;
        if self.steps < 1 || self.steps > max {
            bail!("steps must be in 1..={}, got {}", max, self.steps);
        }
        if self.pulses > max {
            bail!("pulses must be in 0..={}, got {}", max, self.pulses);
        }
        if self.offset > max {
            bail!("offset must be in 0..={}, got {}", max, self.offset);
        }
        Ok(())
    }

    /// Turn the knobs and switches of a module to these positions.
    ///
    /// The range switch is latched on `gate` first, so the knob values set here
    /// survive the next `process` call.
    pub fn apply(&self, gate: &mut EuclideanGate, io: &mut ModuleIo) {
        gate.switch_range(self.range, io);
        io.set_param(ParamId::Mode, self.mode.switch_value());
        io.set_param(ParamId::Steps, self.steps as f32);
        io.set_param(ParamId::Pulses, self.pulses as f32);
        io.set_param(ParamId::Offset, self.offset as f32);
    }

    /// JSON schema of the settings document.
    pub fn schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(EuclidSettings)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Module, ProcessArgs};

    #[test]
    fn test_empty_document_uses_panel_defaults() {
        let settings = EuclidSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, EuclidSettings::default());
        assert_eq!(settings.steps, 16);
        assert_eq!(settings.pulses, 16);
    }

    #[test]
    fn test_parse_full_document() {
        let settings = EuclidSettings::from_json_str(
            r#"{"steps": 24, "range": 32, "pulses": 5, "mode": "xor", "offset": 3}"#,
        )
        .unwrap();
        assert_eq!(settings.range, StepRange::ThirtyTwo);
        assert_eq!(settings.mode, Mode::Xor);
        assert_eq!(settings.steps, 24);
    }

    #[test]
    fn test_rejects_unreachable_positions() {
        assert!(EuclidSettings::from_json_str(r#"{"steps": 24}"#).is_err());
        assert!(EuclidSettings::from_json_str(r#"{"steps": 0}"#).is_err());
        assert!(EuclidSettings::from_json_str(r#"{"offset": 17}"#).is_err());
        assert!(EuclidSettings::from_json_str(r#"{"range": 8}"#).is_err());
        assert!(EuclidSettings::from_json_str(r#"{"swing": 1}"#).is_err());
    }

    #[test]
    fn test_pulses_above_steps_are_accepted() {
        let settings = EuclidSettings::from_json_str(r#"{"steps": 4, "pulses": 9}"#).unwrap();
        assert_eq!(settings.pulses, 9);
    }

    #[test]
    fn test_apply_sets_long_range_values() {
        let mut gate = EuclideanGate::new();
        let mut io = ModuleIo::new(&gate.config());
        let settings = EuclidSettings {
            steps: 24,
            range: StepRange::ThirtyTwo,
            pulses: 7,
            mode: Mode::Xor,
            offset: 20,
        };
        settings.apply(&mut gate, &mut io);
        gate.process(&ProcessArgs::new(48_000.0, 0), &mut io);

        assert_eq!(io.param(ParamId::Steps), 24.0);
        assert_eq!(io.param(ParamId::Pulses), 7.0);
        assert_eq!(io.param(ParamId::Offset), 20.0);
        assert_eq!(StepRange::from_switch(io.param(ParamId::Range)), StepRange::ThirtyTwo);
        assert_eq!(Mode::from_switch(io.param(ParamId::Mode)), Mode::Xor);
        assert_eq!(gate.rhythm().offset, 20);
    }

    #[test]
    fn test_schema_lists_fields() {
        let schema = EuclidSettings::schema();
        let props = schema["properties"].as_object().unwrap();
        for field in ["steps", "range", "pulses", "mode", "offset"] {
            assert!(props.contains_key(field), "missing {}", field);
        }
    }
}
