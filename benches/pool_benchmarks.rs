use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use elastic_pool::pool::{Config, WorkerPoolInner};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// Benchmark 1: суммирование счётчика — пул против потока-на-задачу
fn bench_counter_sum(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_sum");

    for size in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("pool", size), &size, |b, &size| {
            b.iter(|| {
                // Как в духе оригинала: 1/10 воркеров и 1/10 вместимости очереди
                let pool = WorkerPoolInner::new((size / 10).max(1), (size / 10).max(1)).unwrap();
                let n = Arc::new(AtomicUsize::new(0));
                for _ in 0..size {
                    let n = n.clone();
                    pool.submit(move || {
                        n.fetch_add(1, Ordering::Relaxed);
                    });
                }
                pool.close();
                black_box(n.load(Ordering::Relaxed))
            });
        });

        // Поток-на-задачу непомерно дорог на больших size
        if size <= 1_000 {
            group.bench_with_input(
                BenchmarkId::new("thread_per_job", size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        let n = Arc::new(AtomicUsize::new(0));
                        let handles: Vec<_> = (0..size)
                            .map(|_| {
                                let n = n.clone();
                                thread::spawn(move || {
                                    n.fetch_add(1, Ordering::Relaxed);
                                })
                            })
                            .collect();
                        for h in handles {
                            h.join().unwrap();
                        }
                        black_box(n.load(Ordering::Relaxed))
                    });
                },
            );
        }
    }

    group.finish();
}

// Benchmark 2: поглощение всплеска — прогретый floor против холодного старта
fn bench_prewarm_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("burst_absorption");

    for warm in [0usize, 4] {
        group.bench_with_input(BenchmarkId::new("min_workers", warm), &warm, |b, &warm| {
            b.iter(|| {
                let pool = WorkerPoolInner::with_config(Config {
                    max_workers: 4,
                    min_workers: warm,
                    idle_timeout: Duration::from_millis(50),
                    queue_capacity: 64,
                    ..Default::default()
                })
                .unwrap();
                for i in 0..256 {
                    pool.submit(move || {
                        black_box(i);
                    });
                }
                pool.close();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_counter_sum, bench_prewarm_burst);
criterion_main!(benches);
