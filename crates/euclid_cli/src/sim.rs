//! Offline render loop: plays the rack engine's role for one module.
//!
//! A square clock at a given tempo is synthesised sample by sample, optional
//! reset pulses are inserted before chosen clocks, and every step the module
//! fires is collected as a [`GateEvent`].

use anyhow::{Result, bail};
use euclid_core::dsp::euclid::InputId;
use euclid_core::{
    EuclidSettings, EuclideanGate, Gate, Module, ModuleIo, ProcessArgs, Rhythm,
};
use serde::Serialize;
use tracing::{debug, info};

/// Clock pulses per quarter note (sixteenth-note clock).
const CLOCKS_PER_BEAT: f32 = 4.0;

/// Constant CV voltages patched into the module for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CvInputs {
    pub steps: Option<f32>,
    pub pulses: Option<f32>,
    pub offset: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub sample_rate: f32,
    pub bpm: f32,
    pub clocks: usize,
    /// Clock indices preceded by a reset pulse.
    pub reset_at: Vec<usize>,
    pub cv: CvInputs,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            bpm: 120.0,
            clocks: 16,
            reset_at: Vec::new(),
            cv: CvInputs::default(),
        }
    }
}

impl SimConfig {
    /// Reject reset positions the render loop cannot place.
    fn validate(&self) -> Result<()> {
        // A reset pulse sits in the low half before its clock; clock 0 has none
        if self.reset_at.contains(&0) {
            bail!("cannot reset before clock 0: the run already starts on step 0");
        }
        Ok(())
    }

    /// Samples per clock period.
    fn period(&self) -> Result<u64> {
        if !(self.sample_rate > 0.0) || !(self.bpm > 0.0) {
            bail!(
                "sample rate and tempo must be positive (got {} Hz, {} bpm)",
                self.sample_rate,
                self.bpm
            );
        }
        let period = (self.sample_rate * 60.0 / (self.bpm * CLOCKS_PER_BEAT)).round() as u64;
        if period < 4 {
            bail!(
                "tempo {} bpm is too fast for {} Hz: a clock period needs at least 4 samples",
                self.bpm,
                self.sample_rate
            );
        }
        Ok(period)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GateEvent {
    /// Index of the clock edge within the run.
    pub clock: usize,
    pub frame: u64,
    pub time_ms: f64,
    pub step: usize,
    pub index: usize,
    pub gate: Gate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimReport {
    /// Pattern in effect at the end of the run.
    pub pattern: String,
    pub offset: usize,
    pub bound: usize,
    pub events: Vec<GateEvent>,
    pub frames: u64,
}

impl SimReport {
    pub fn count(&self, gate: Gate) -> usize {
        self.events.iter().filter(|e| e.gate == gate).count()
    }
}

fn report_from(rhythm: &Rhythm, events: Vec<GateEvent>, frames: u64) -> SimReport {
    SimReport {
        pattern: rhythm.pattern.to_string(),
        offset: rhythm.offset,
        bound: rhythm.bound,
        events,
        frames,
    }
}

/// Render `config.clocks` clock periods through a fresh module.
pub fn simulate(settings: &EuclidSettings, config: &SimConfig) -> Result<SimReport> {
    settings.validate()?;
    config.validate()?;
    let period = config.period()?;
    let high_len = period / 2;
    let reset_len = ((period - high_len) / 2).max(1);

    let mut gate = EuclideanGate::new();
    let mut io = ModuleIo::new(&gate.config());
    settings.apply(&mut gate, &mut io);
    io.set_input(InputId::Clock, 0.0);
    io.set_input(InputId::Reset, 0.0);
    if let Some(v) = config.cv.steps {
        io.set_input(InputId::StepsCv, v);
    }
    if let Some(v) = config.cv.pulses {
        io.set_input(InputId::PulsesCv, v);
    }
    if let Some(v) = config.cv.offset {
        io.set_input(InputId::OffsetCv, v);
    }

    info!(
        period,
        clocks = config.clocks,
        sample_rate = config.sample_rate,
        "starting simulation"
    );

    // Lead-in sample so both detectors start armed
    let mut frame = 0u64;
    gate.process(&ProcessArgs::new(config.sample_rate, frame), &mut io);
    frame += 1;

    let total = config.clocks as u64 * period;
    let mut events = Vec::with_capacity(config.clocks);
    for t in 0..total {
        let clock_index = (t / period) as usize;
        let phase = t % period;

        let clock = if phase < high_len { 10.0 } else { 0.0 };
        let resetting = config.reset_at.contains(&(clock_index + 1))
            && phase >= high_len
            && phase < high_len + reset_len;
        let reset = if resetting { 10.0 } else { 0.0 };

        io.set_input(InputId::Clock, clock);
        io.set_input(InputId::Reset, reset);
        gate.process(&ProcessArgs::new(config.sample_rate, frame), &mut io);

        if let Some(report) = gate.last_step() {
            let event = GateEvent {
                clock: events.len(),
                frame,
                time_ms: frame as f64 * 1000.0 / config.sample_rate as f64,
                step: report.step,
                index: report.index,
                gate: report.gate,
            };
            debug!(?event, "gate");
            events.push(event);
        }
        frame += 1;
    }

    Ok(report_from(gate.rhythm(), events, frame))
}
