use tracing::{debug, trace};

use super::mode::{Mode, Rhythm, StepRange};
use super::sequencer::{Gate, StepReport, StepSequencer};
use crate::dsp::utils::PulseGenerator;
use crate::dsp::{GATE_VOLTAGE, TRIGGER_TIME};
use crate::types::{Module, ModuleConfig, ModuleIo, ParamQuantity, ProcessArgs};

crate::io_ids! {
    pub enum ParamId {
        Steps,
        Range,
        Pulses,
        Mode,
        Offset,
    }
}

crate::io_ids! {
    pub enum InputId {
        Clock,
        Reset,
        StepsCv,
        PulsesCv,
        OffsetCv,
    }
}

crate::io_ids! {
    pub enum OutputId {
        Aux,
        Main,
    }
}

crate::io_ids! {
    pub enum LightId {
        Clock,
        Reset,
        Aux,
        Main,
    }
}

/// Knob value plus the integer part of its CV, truncated like a C cast.
fn knob_plus_cv(knob: f32, cv: f32) -> i64 {
    knob as i64 + cv as i64
}

/// Steps/pulses/offset quantities for one range switch position.
fn range_quantities(range: StepRange) -> [(ParamId, ParamQuantity); 3] {
    let max = range.num_steps() as f32;
    [
        (ParamId::Steps, ParamQuantity::new("Steps", 1.0, max, max).snapped()),
        (ParamId::Pulses, ParamQuantity::new("Pulses", 0.0, max, max).snapped()),
        (ParamId::Offset, ParamQuantity::new("Offset", 0.0, max, 0.0).snapped()),
    ]
}

/// Clock-driven Euclidean gate generator.
///
/// Every sample the pattern is rebuilt from the knobs and CVs. A rising clock
/// fires the main output when the cell under the cursor is an onset and the aux
/// output otherwise; both outputs are 1ms triggers.
#[derive(Debug, Clone, Default)]
pub struct EuclideanGate {
    sequencer: StepSequencer,
    main_pulse: PulseGenerator,
    aux_pulse: PulseGenerator,
    rhythm: Rhythm,
    last_step: Option<StepReport>,
}

impl EuclideanGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The step fired during the most recent sample, if any.
    pub fn last_step(&self) -> Option<StepReport> {
        self.last_step
    }

    /// Pattern, offset and bound used for the most recent sample.
    pub fn rhythm(&self) -> &Rhythm {
        &self.rhythm
    }

    pub fn sequencer(&self) -> &StepSequencer {
        &self.sequencer
    }

    /// Put the 16/32 switch in `range` and latch it. Steps, pulses and offset are
    /// reconfigured for the new range and return to its defaults.
    pub fn switch_range(&mut self, range: StepRange, io: &mut ModuleIo) {
        self.sequencer.set_range(range);
        io.set_param(ParamId::Range, range.switch_value());
        for (id, quantity) in range_quantities(range) {
            io.config_param(id, quantity);
        }
    }

    /// Read knobs and CVs into the rhythm for this sample, clamped to the active range.
    fn read_rhythm(&self, io: &ModuleIo) -> Rhythm {
        let range = self.sequencer.range();
        let num_steps = range.num_steps() as i64;
        let mode = Mode::from_switch(io.param(ParamId::Mode));

        let steps = knob_plus_cv(io.param(ParamId::Steps), io.input(InputId::StepsCv))
            .clamp(1, num_steps) as usize;
        let pulses = knob_plus_cv(io.param(ParamId::Pulses), io.input(InputId::PulsesCv))
            .clamp(0, num_steps) as usize;
        let offset = knob_plus_cv(io.param(ParamId::Offset), io.input(InputId::OffsetCv))
            .clamp(0, num_steps) as usize;

        Rhythm::new(mode, range, steps, pulses, offset)
    }
}

impl Module for EuclideanGate {
    fn config(&self) -> ModuleConfig {
        let mut config =
            ModuleConfig::new(ParamId::LEN, InputId::LEN, OutputId::LEN, LightId::LEN);

        for (id, quantity) in range_quantities(StepRange::Sixteen) {
            config.config_param(id, quantity);
        }
        config.config_param(
            ParamId::Range,
            ParamQuantity::new("16/32", 0.0, 1.0, StepRange::Sixteen.switch_value()).snapped(),
        );
        config.config_param(
            ParamId::Mode,
            ParamQuantity::new("Norm/XOR", 0.0, 1.0, Mode::Normal.switch_value()).snapped(),
        );

        config.config_input(InputId::Clock, "Clock In");
        config.config_input(InputId::Reset, "Reset In");
        config.config_input(InputId::StepsCv, "Steps CV");
        config.config_input(InputId::PulsesCv, "Pulses CV");
        config.config_input(InputId::OffsetCv, "Offset CV");
        config.config_output(OutputId::Aux, "Aux Pulse");
        config.config_output(OutputId::Main, "Pulse");
        config
    }

    fn process(&mut self, args: &ProcessArgs, io: &mut ModuleIo) {
        let range = StepRange::from_switch(io.param(ParamId::Range));
        if range != self.sequencer.range() {
            self.switch_range(range, io);
            debug!(steps = range.num_steps(), "step range switched");
        }

        self.rhythm = self.read_rhythm(io);

        let clock = io.input(InputId::Clock);
        let reset = io.input(InputId::Reset);
        self.last_step = self.sequencer.process(clock, reset, &self.rhythm);

        if let Some(report) = self.last_step {
            match report.gate {
                Gate::Main => self.main_pulse.trigger(TRIGGER_TIME),
                Gate::Aux => self.aux_pulse.trigger(TRIGGER_TIME),
            }
            trace!(
                frame = args.frame,
                step = report.step,
                index = report.index,
                gate = ?report.gate,
                pattern = %self.rhythm.pattern,
                "clock edge"
            );
        }

        let main = self.main_pulse.process(args.sample_time);
        let aux = self.aux_pulse.process(args.sample_time);
        io.set_output(OutputId::Main, if main { GATE_VOLTAGE } else { 0.0 });
        io.set_output(OutputId::Aux, if aux { GATE_VOLTAGE } else { 0.0 });

        let dt = args.sample_time;
        io.light_mut(LightId::Clock).set_smooth_brightness(clock, dt);
        io.light_mut(LightId::Reset).set_smooth_brightness(reset, dt);
        io.light_mut(LightId::Main)
            .set_smooth_brightness(if main { 1.0 } else { 0.0 }, dt);
        io.light_mut(LightId::Aux)
            .set_smooth_brightness(if aux { 1.0 } else { 0.0 }, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn setup() -> (EuclideanGate, ModuleIo) {
        let gate = EuclideanGate::new();
        let io = ModuleIo::new(&gate.config());
        (gate, io)
    }

    fn tick(gate: &mut EuclideanGate, io: &mut ModuleIo, frame: &mut u64) {
        gate.process(&ProcessArgs::new(SAMPLE_RATE, *frame), io);
        *frame += 1;
    }

    #[test]
    fn test_config_defaults() {
        let (gate, io) = setup();
        let config = gate.config();
        assert_eq!(config.params.len(), ParamId::LEN);
        assert_eq!(config.inputs[usize::from(InputId::Clock)].name, "Clock In");
        assert_eq!(config.outputs[usize::from(OutputId::Main)].name, "Pulse");
        assert_eq!(io.param(ParamId::Steps), 16.0);
        assert_eq!(io.param(ParamId::Pulses), 16.0);
        assert_eq!(io.param(ParamId::Offset), 0.0);
        assert_eq!(Mode::from_switch(io.param(ParamId::Mode)), Mode::Normal);
        assert!(config.params.iter().all(|q| q.snap));
    }

    fn knobs(io: &ModuleIo) -> (f32, f32, f32) {
        (
            io.param(ParamId::Steps),
            io.param(ParamId::Pulses),
            io.param(ParamId::Offset),
        )
    }

    #[test]
    fn test_range_switch_reconfigures_params() {
        let (mut gate, mut io) = setup();
        let mut frame = 0;

        io.set_param(ParamId::Steps, 8.0);
        io.set_param(ParamId::Pulses, 3.0);
        io.set_param(ParamId::Offset, 5.0);
        io.set_param(ParamId::Range, 1.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(gate.sequencer().num_steps(), 32);
        assert_eq!(io.params[usize::from(ParamId::Steps)].quantity().max, 32.0);
        assert_eq!(knobs(&io), (32.0, 32.0, 0.0));
        assert_eq!(gate.rhythm().pattern.len(), 32);

        io.set_param(ParamId::Steps, 28.0);
        io.set_param(ParamId::Pulses, 30.0);
        io.set_param(ParamId::Offset, 20.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(knobs(&io), (28.0, 30.0, 20.0), "knobs stay put while the switch holds");

        io.set_param(ParamId::Range, 0.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(gate.sequencer().num_steps(), 16);
        assert_eq!(knobs(&io), (16.0, 16.0, 0.0));
    }

    #[test]
    fn test_switch_range_latches_without_a_second_reset() {
        let (mut gate, mut io) = setup();
        let mut frame = 0;

        gate.switch_range(StepRange::ThirtyTwo, &mut io);
        io.set_param(ParamId::Steps, 24.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(io.param(ParamId::Steps), 24.0);
        assert_eq!(gate.rhythm().pattern.len(), 24);
    }

    #[test]
    fn test_cv_adds_truncated_volts_and_clamps() {
        let (mut gate, mut io) = setup();
        let mut frame = 0;
        io.set_param(ParamId::Steps, 8.0);
        io.set_param(ParamId::Pulses, 2.0);
        io.set_input(InputId::PulsesCv, 1.9);
        io.set_input(InputId::OffsetCv, 40.0);
        tick(&mut gate, &mut io, &mut frame);

        let rhythm = gate.rhythm();
        assert_eq!(rhythm.pattern.len(), 8);
        assert_eq!(rhythm.pattern.pulse_count(), 3);
        assert_eq!(rhythm.offset, 16);

        io.set_input(InputId::StepsCv, -20.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(gate.rhythm().pattern.len(), 1);
    }

    #[test]
    fn test_clock_fires_one_millisecond_trigger() {
        let (mut gate, mut io) = setup();
        let mut frame = 0;
        io.set_input(InputId::Clock, 0.0);
        tick(&mut gate, &mut io, &mut frame);

        io.set_input(InputId::Clock, 10.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(gate.last_step().map(|r| r.gate), Some(Gate::Main));
        assert_eq!(io.output(OutputId::Main), GATE_VOLTAGE);
        assert_eq!(io.output(OutputId::Aux), 0.0);
        assert_eq!(io.light(LightId::Main), 1.0);

        let mut high = 1;
        for _ in 0..100 {
            tick(&mut gate, &mut io, &mut frame);
            assert!(gate.last_step().is_none());
            if io.output(OutputId::Main) > 0.0 {
                high += 1;
            }
        }
        assert!((48..=49).contains(&high), "main was high for {} samples", high);
        assert_eq!(io.output(OutputId::Main), 0.0);
        assert!(io.light(LightId::Main) < 1.0);
    }

    #[test]
    fn test_zero_pulses_fires_aux_only() {
        let (mut gate, mut io) = setup();
        let mut frame = 0;
        io.set_param(ParamId::Pulses, 0.0);
        io.set_input(InputId::Clock, 0.0);
        tick(&mut gate, &mut io, &mut frame);

        io.set_input(InputId::Clock, 5.0);
        tick(&mut gate, &mut io, &mut frame);
        assert_eq!(gate.last_step().map(|r| r.gate), Some(Gate::Aux));
        assert_eq!(io.output(OutputId::Aux), GATE_VOLTAGE);
        assert_eq!(io.output(OutputId::Main), 0.0);
    }
}
