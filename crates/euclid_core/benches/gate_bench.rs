//! Criterion benchmarks for euclid_core
//!
//! Run with: cargo bench -p euclid_core
//!
//! The module rebuilds its pattern on every sample, so these measure the
//! per-sample cost in both modes and the bare pattern generator.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use euclid_core::dsp::euclid::InputId;
use euclid_core::{EuclidSettings, EuclideanGate, Mode, Module, ModuleIo, Pattern, ProcessArgs, StepRange};

const SAMPLE_RATE: f32 = 48000.0;
const FRAMES_PER_ITER: u64 = 480; // 10ms worth

fn bench_pattern(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern");
    for steps in [8usize, 16, 32] {
        group.bench_with_input(BenchmarkId::new("generate", steps), &steps, |b, &steps| {
            b.iter(|| Pattern::generate(black_box(steps), black_box(steps / 3)))
        });
    }
    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    group.throughput(Throughput::Elements(FRAMES_PER_ITER));

    for mode in [Mode::Normal, Mode::Xor] {
        let settings = EuclidSettings {
            steps: 27,
            range: StepRange::ThirtyTwo,
            pulses: 11,
            mode,
            offset: 5,
        };

        group.bench_function(BenchmarkId::new("gate", mode), |b| {
            let mut gate = EuclideanGate::new();
            let mut io = ModuleIo::new(&gate.config());
            settings.apply(&mut gate, &mut io);
            let mut frame = 0u64;

            b.iter(|| {
                for _ in 0..FRAMES_PER_ITER {
                    // 100Hz square clock
                    let clock = if frame % 480 < 240 { 10.0 } else { 0.0 };
                    io.set_input(InputId::Clock, clock);
                    gate.process(&ProcessArgs::new(SAMPLE_RATE, frame), &mut io);
                    frame += 1;
                }
                black_box(io.outputs[0].get_voltage());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pattern, bench_process);
criterion_main!(benches);
