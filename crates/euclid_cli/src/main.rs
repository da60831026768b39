//! euclid-sim: command-line host for the Euclidean gate generator
//!
//! Plays the role of the rack engine so the module can be exercised without
//! one:
//!
//! - `pattern`: print the pattern for a steps/pulses setting
//! - `run`: clock the module sample by sample and list the gates it fires
//! - `info`: show the module's parameter ranges and port labels
//! - `schema`: print the JSON schema of a settings file

mod sim;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use euclid_core::{EuclidSettings, EuclideanGate, Gate, Mode, Module, Pattern, Rhythm, StepRange};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::sim::{CvInputs, GateEvent, SimConfig, SimReport, simulate};

/// Render and simulate the Euclidean gate generator
#[derive(Parser)]
#[command(name = "euclid-sim")]
#[command(about = "Render and simulate a clock-driven Euclidean gate generator")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv per-edge trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum ModeArg {
    Normal,
    Xor,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Normal => Mode::Normal,
            ModeArg::Xor => Mode::Xor,
        }
    }
}

/// Knob overrides shared by `pattern` and `run`.
#[derive(clap::Args, Debug, Default)]
struct KnobArgs {
    /// Steps knob (pattern length in normal mode)
    #[arg(short, long)]
    steps: Option<u32>,

    /// Pulses knob (number of onsets)
    #[arg(short, long)]
    pulses: Option<u32>,

    /// Offset knob (read position shift)
    #[arg(short, long)]
    offset: Option<u32>,

    /// Pattern combination mode
    #[arg(short, long)]
    mode: Option<ModeArg>,

    /// Range switch: 16 or 32 steps
    #[arg(short, long, value_parser = parse_range)]
    range: Option<StepRange>,
}

impl KnobArgs {
    /// Layer the overrides over a base settings document.
    fn apply_to(&self, mut settings: EuclidSettings) -> Result<EuclidSettings> {
        if let Some(range) = self.range {
            settings.range = range;
        }
        if let Some(steps) = self.steps {
            settings.steps = steps;
        }
        if let Some(pulses) = self.pulses {
            settings.pulses = pulses;
        }
        if let Some(offset) = self.offset {
            settings.offset = offset;
        }
        if let Some(mode) = self.mode {
            settings.mode = mode.into();
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn parse_range(s: &str) -> Result<StepRange> {
    let steps: u32 = s.parse().context("range must be a number")?;
    StepRange::try_from(steps)
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pattern the module would read
    Pattern {
        #[command(flatten)]
        knobs: KnobArgs,

        /// Show the bucket output before the one-step rotation (both inputs in XOR mode)
        #[arg(long)]
        unrotated: bool,
    },

    /// Clock the module and list every gate it fires
    Run {
        /// Settings JSON file (knob flags override it)
        #[arg(long)]
        settings: Option<PathBuf>,

        #[command(flatten)]
        knobs: KnobArgs,

        /// Tempo in BPM (one clock per sixteenth note)
        #[arg(short, long, default_value_t = 120.0)]
        bpm: f32,

        /// Number of clock pulses to send
        #[arg(short, long, default_value_t = 16)]
        clocks: usize,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 48000.0)]
        sample_rate: f32,

        /// Send a reset pulse before this clock index, counted from 1 (repeatable)
        #[arg(long)]
        reset_at: Vec<usize>,

        /// Constant voltage on the steps CV input
        #[arg(long)]
        steps_cv: Option<f32>,

        /// Constant voltage on the pulses CV input
        #[arg(long)]
        pulses_cv: Option<f32>,

        /// Constant voltage on the offset CV input
        #[arg(long)]
        offset_cv: Option<f32>,
    },

    /// Show parameter ranges and port labels
    Info,

    /// Print the JSON schema of a settings file
    Schema,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn format_pattern(pattern: &str) -> String {
    pattern
        .chars()
        .map(|c| {
            if c == '1' {
                "x".green().bold().to_string()
            } else {
                ".".dimmed().to_string()
            }
        })
        .collect()
}

fn format_gate(gate: Gate) -> String {
    match gate {
        Gate::Main => "main".green().to_string(),
        Gate::Aux => "aux".yellow().to_string(),
    }
}

fn print_event_table(event: &GateEvent) {
    println!(
        "{:>6} {:>12} {:>6} {:>6} {:>6}",
        event.clock.to_string().dimmed(),
        format!("{:.2}ms", event.time_ms),
        event.step,
        event.index,
        format_gate(event.gate)
    );
}

/// The combined pattern the module reads, or with `unrotated` the bucket
/// output feeding it: one row in Normal mode, both XOR inputs in XOR mode.
fn pattern_rows(settings: &EuclidSettings, unrotated: bool) -> Vec<Pattern> {
    let steps = settings.steps as usize;
    let pulses = settings.pulses as usize;
    if !unrotated {
        let rhythm = Rhythm::new(
            settings.mode,
            settings.range,
            steps,
            pulses,
            settings.offset as usize,
        );
        return vec![rhythm.pattern];
    }

    match settings.mode {
        Mode::Normal => vec![Pattern::generate_unrotated(steps, pulses)],
        Mode::Xor => {
            let num_steps = settings.range.num_steps();
            vec![
                Pattern::generate_unrotated(num_steps, steps),
                Pattern::generate_unrotated(num_steps, pulses),
            ]
        }
    }
}

fn cmd_pattern(knobs: &KnobArgs, unrotated: bool, format: OutputFormat) -> Result<()> {
    let settings = knobs.apply_to(EuclidSettings::default())?;

    for pattern in pattern_rows(&settings, unrotated) {
        match format {
            OutputFormat::Table => {
                println!("{}", format_pattern(&pattern.to_string()));
                println!(
                    "{} steps, {} pulses ({} mode)",
                    pattern.len(),
                    pattern.pulse_count(),
                    settings.mode
                );
            }
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "pattern": pattern.to_string(),
                    "steps": pattern.len(),
                    "pulses": pattern.pulse_count(),
                    "mode": settings.mode,
                    "unrotated": unrotated,
                });
                println!("{}", obj);
            }
        }
    }
    Ok(())
}

fn print_report(report: &SimReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", format_pattern(&report.pattern));
            println!(
                "{:>6} {:>12} {:>6} {:>6} {:>6}",
                "CLOCK", "TIME", "STEP", "INDEX", "GATE"
            );
            println!("{}", "-".repeat(42));
            for event in &report.events {
                print_event_table(event);
            }
            println!("{}", "-".repeat(42));
            println!(
                "{} clocks: {} main, {} aux over {} frames",
                report.events.len(),
                report.count(Gate::Main),
                report.count(Gate::Aux),
                report.frames
            );
        }
        OutputFormat::Json => {
            for event in &report.events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Pattern { knobs, unrotated } => cmd_pattern(&knobs, unrotated, cli.format)?,
        Commands::Run {
            settings,
            knobs,
            bpm,
            clocks,
            sample_rate,
            reset_at,
            steps_cv,
            pulses_cv,
            offset_cv,
        } => {
            let base = match settings {
                Some(path) => EuclidSettings::from_file(&path)?,
                None => EuclidSettings::default(),
            };
            let settings = knobs.apply_to(base)?;
            let config = SimConfig {
                sample_rate,
                bpm,
                clocks,
                reset_at,
                cv: CvInputs {
                    steps: steps_cv,
                    pulses: pulses_cv,
                    offset: offset_cv,
                },
            };
            let report = simulate(&settings, &config)?;
            print_report(&report, cli.format)?;
        }
        Commands::Info => {
            let config = EuclideanGate::new().config();
            match cli.format {
                OutputFormat::Table => {
                    println!(
                        "{:>10} {:>6} {:>6} {:>8} {:>5}",
                        "PARAM", "MIN", "MAX", "DEFAULT", "SNAP"
                    );
                    for q in &config.params {
                        println!(
                            "{:>10} {:>6} {:>6} {:>8} {:>5}",
                            q.name.cyan(),
                            q.min,
                            q.max,
                            q.default,
                            q.snap
                        );
                    }
                    let names = |ports: &[euclid_core::types::PortInfo]| {
                        ports.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
                    };
                    println!("inputs:  {}", names(config.inputs.as_slice()));
                    println!("outputs: {}", names(config.outputs.as_slice()));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
            }
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&EuclidSettings::schema())?);
        }
    }
    Ok(())
}
