use elastic_pool::pool::{Config, WorkerPoolInner};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn main() {
    let now = Instant::now();
    let pool = WorkerPoolInner::with_config(Config::cpu_bound()).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..1_000_000 {
        let counter = counter.clone();
        pool.submit(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        });
    }
    pool.close();
    println!("processed: {}", counter.load(Ordering::Relaxed));
    println!("elapsed: {:?}", now.elapsed());
}
