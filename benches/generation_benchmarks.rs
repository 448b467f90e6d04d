use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use factory_sim::simulation::{
    GeneratorSettings, PerturbationScheduler, RngSource, RuntimeState, SignalGenerator,
};
use factory_sim::topology::{
    default_topology, Factory, LineSpec, MachineSpec, TagSpec, TopologySpec, WaveformClass,
    WaveformRules,
};

const TAG_NAMES: &[&str] = &["speed", "temperature", "pressure", "rpm", "torque", "humidity"];
const PLANT_SIZES: &[usize] = &[1, 10, 100];

/// `lines` lines of ten machines, each carrying every known tag name
fn plant(lines: usize) -> Factory {
    let spec = TopologySpec {
        lines: (0..lines)
            .map(|l| LineSpec {
                name: format!("Line{}", l + 1),
                machines: (0..10)
                    .map(|m| MachineSpec {
                        name: format!("Machine{}", m + 1),
                        tags: TAG_NAMES
                            .iter()
                            .map(|name| TagSpec::new(name, 0.0, 100.0))
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    };
    Factory::from_spec(&spec, WaveformRules::default()).unwrap()
}

fn benchmark_compute(c: &mut Criterion) {
    let generator = SignalGenerator::default();
    let mut group = c.benchmark_group("compute");

    for class in WaveformClass::ALL {
        group.bench_function(class.to_string(), |b| {
            let mut tick = 0u64;
            b.iter(|| {
                tick += 1;
                generator.compute(
                    black_box(class),
                    black_box(tick),
                    20.0,
                    90.0,
                    black_box(3.5),
                    black_box(0.1),
                )
            });
        });
    }

    group.finish();
}

fn benchmark_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for &lines in PLANT_SIZES {
        let factory = plant(lines);
        let state = RuntimeState::new(&factory);
        group.throughput(Throughput::Elements(state.len() as u64));

        for parallel in [false, true] {
            let generator = SignalGenerator::new(GeneratorSettings {
                parallel,
                ..GeneratorSettings::default()
            });
            let label = if parallel { "parallel" } else { "sequential" };

            group.bench_with_input(
                BenchmarkId::new(label, format!("{}tags", state.len())),
                &state,
                |b, state| {
                    let mut source = RngSource::seeded(42);
                    let mut tick = 0u64;
                    b.iter(|| {
                        tick += 1;
                        black_box(generator.step(tick, state, &mut source));
                    });
                },
            );
        }
    }

    group.finish();
}

fn benchmark_refresh(c: &mut Criterion) {
    let factory = Factory::from_spec(&default_topology(), WaveformRules::default()).unwrap();
    let state = RuntimeState::new(&factory);
    let scheduler = PerturbationScheduler::default();
    let mut source = RngSource::seeded(7);

    c.bench_function("perturbation_refresh", |b| {
        b.iter(|| scheduler.refresh(black_box(&state), &mut source));
    });
}

criterion_group!(benches, benchmark_compute, benchmark_step, benchmark_refresh);
criterion_main!(benches);
