/// Снимок состояния пула в момент вызова `metrics()`
///
/// Счётчики читаются атомарно, но независимо друг от друга, поэтому снимок
/// приблизителен под нагрузкой.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub live_workers: usize,
    pub busy_workers: usize,
    pub queued_jobs: usize,
    pub jobs_processed: usize,
}

impl PoolMetrics {
    pub fn idle_workers(&self) -> usize {
        self.live_workers.saturating_sub(self.busy_workers)
    }

    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.busy_workers as f64 / self.live_workers as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_jobs as f64
    }
}
