use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use sonar_core::config::RangeCfg;
use sonar_core::stats;
use sonar_core::{SampleWindow, Slot};

const RANGE: RangeCfg = RangeCfg {
    min_mm: 20,
    max_mm: 4_000,
};

// Sweeping target with every seventh echo lost
fn synth_window(size: usize, seed: u32) -> SampleWindow {
    let mut state = seed.max(1);
    let mut jitter = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x % 21) as i32 - 10
    };
    let mut w = SampleWindow::new(size);
    for i in 0..size {
        w.stamp_poll(i as u64 * 60);
        w.advance_poll();
        let slot = if i % 7 == 6 {
            Slot::Missed
        } else {
            Slot::Echo(800 + 15 * i as i32 + jitter())
        };
        w.record(slot);
    }
    w
}

pub fn bench_statistics(c: &mut Criterion) {
    let mut g = c.benchmark_group("statistics");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p sonar_core --bench statistics
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    for &size in &[3usize, 10, 30] {
        let window = synth_window(size, 0xC0FFEE);
        g.bench_function(format!("mean_distance_w{size}"), |b| {
            b.iter(|| black_box(stats::mean_distance(black_box(&window), &RANGE)))
        });
        g.bench_function(format!("variance_w{size}"), |b| {
            b.iter(|| black_box(stats::variance(black_box(&window), 900)))
        });
        g.bench_function(format!("mean_velocity_w{size}"), |b| {
            b.iter(|| black_box(stats::mean_velocity(black_box(&window), &RANGE)))
        });
    }

    g.bench_function("record_and_reconcile_w10", |b| {
        b.iter_batched(
            || SampleWindow::new(10),
            |mut w| {
                for i in 0..100u64 {
                    w.reconcile();
                    w.stamp_poll(i * 60);
                    w.advance_poll();
                    if i % 3 != 0 {
                        w.record(Slot::Echo(black_box(500)));
                    }
                }
                black_box(w);
            },
            BatchSize::SmallInput,
        )
    });
    g.finish();
}

criterion_group!(benches, bench_statistics);
criterion_main!(benches);
