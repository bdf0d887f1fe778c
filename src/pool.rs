use super::{
    errors::BuildError,
    model::PoolMetrics,
    queue::{Fetched, Job, JobQueue},
};
use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::Duration,
};

use crossbeam::sync::WaitGroup;
use log::{debug, warn};

/// Значение паники, извлечённое из упавшей задачи
pub type PanicPayload = Box<dyn Any + Send + 'static>;

/// Обработчик паник: вызывается с payload каждой упавшей задачи.
/// Если обработчик не задан, паники молча проглатываются.
pub type PanicHook = Arc<dyn Fn(PanicPayload) + Send + Sync + 'static>;

/// Конфигурация пула воркеров
#[derive(Clone)]
pub struct Config {
    /// Верхняя граница числа живых воркеров
    pub max_workers: usize,
    /// Число воркеров, которые остаются живыми даже без задач
    pub min_workers: usize,
    /// Как часто floor-воркер без работы перепроверяет, нужен ли он ещё;
    /// имеет смысл только при `min_workers > 0`
    pub idle_timeout: Duration,
    /// Вместимость буфера очереди; 0 — полностью синхронная передача
    pub queue_capacity: usize,
    pub panic_hook: Option<PanicHook>,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            max_workers: num_cpus * 2, // Для I/O-bound задач
            min_workers: 0,
            idle_timeout: Duration::from_millis(500),
            queue_capacity: num_cpus * 20,
            panic_hook: None,
        }
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            max_workers: num_cpus,
            queue_capacity: num_cpus * 10,
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            max_workers: num_cpus * 2,
            queue_capacity: num_cpus * 20,
            ..Default::default()
        }
    }

    fn validated(mut self) -> Result<Self, BuildError> {
        if self.max_workers == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        if self.min_workers > 0 && self.idle_timeout.is_zero() {
            return Err(BuildError::ZeroIdleTimeout);
        }
        if self.min_workers > self.max_workers {
            warn!(
                "min_workers {} exceeds max_workers {}, clamping",
                self.min_workers, self.max_workers
            );
            self.min_workers = self.max_workers;
        }
        Ok(self)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_workers", &self.max_workers)
            .field("min_workers", &self.min_workers)
            .field("idle_timeout", &self.idle_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .field("panic_hook", &self.panic_hook.is_some())
            .finish()
    }
}

pub type WorkerPool = Arc<WorkerPoolInner>;

/// Пул воркеров, растущий по мере поступления задач
///
/// Воркеры запускаются лениво при `submit` (не больше `max_workers`), а при
/// простое сворачиваются до `min_workers`. `close` осушает очередь и ждёт
/// выхода всех воркеров.
pub struct WorkerPoolInner {
    queue: JobQueue,
    live_workers: AtomicUsize,
    busy_workers: AtomicUsize,
    jobs_processed: AtomicUsize,
    next_worker_id: AtomicUsize,
    // Мьютекс сериализует решение о спауне в submit; WaitGroup внутри —
    // барьер, на котором close ждёт выхода воркеров. None = пул закрыт.
    waiter: Mutex<Option<WaitGroup>>,
    config: Config,
}

impl WorkerPoolInner {
    pub fn new(max_workers: usize, queue_capacity: usize) -> Result<WorkerPool, BuildError> {
        Self::with_config(Config {
            max_workers,
            queue_capacity,
            ..Default::default()
        })
    }

    pub fn with_config(config: Config) -> Result<WorkerPool, BuildError> {
        let config = config.validated()?;

        let pool = Arc::new(WorkerPoolInner {
            queue: JobQueue::with_capacity(config.queue_capacity),
            live_workers: AtomicUsize::new(0),
            busy_workers: AtomicUsize::new(0),
            jobs_processed: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(0),
            waiter: Mutex::new(Some(WaitGroup::new())),
            config,
        });

        // Прогрев: floor-воркеры стартуют до возврата из конструктора, чтобы
        // пул сразу принимал всплеск без задержки на спаун.
        {
            let waiter = pool.waiter.lock().unwrap();
            let wg = waiter.as_ref().expect("freshly built pool is open");
            for _ in 0..pool.config.min_workers {
                pool.spawn_worker(wg);
            }
        }

        Ok(pool)
    }

    /// Поставить задачу в очередь (fire-and-forget).
    ///
    /// Если воркеров меньше `max_workers` и в очереди сейчас пусто,
    /// запускается ещё один воркер. Проверка намеренно приблизительная:
    /// она лишь избегает лишних спаунов, когда имеющиеся воркеры простаивают,
    /// и не гарантирует ровно одного воркера на задачу.
    ///
    /// Блокируется при заполненном буфере очереди. Паникует после `close` —
    /// это нарушение контракта вызывающего.
    pub fn submit<F>(self: &Arc<Self>, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let waiter = self.waiter.lock().unwrap();
            let wg = waiter.as_ref().expect("submit on a closed pool");
            if self.live_workers.load(Ordering::SeqCst) < self.config.max_workers
                && self.queue.is_empty()
            {
                self.spawn_worker(wg);
            }
        }
        // Мьютекс уже отпущен: ожидание слота в буфере не должно держать
        // других сабмиттеров.
        self.queue.push(Box::new(job));
    }

    /// Закрыть пул: дождаться выполнения всех поставленных задач и выхода
    /// всех воркеров. Вызывается ровно один раз; повторный вызов паникует.
    pub fn close(&self) {
        let wg = self
            .waiter
            .lock()
            .unwrap()
            .take()
            .expect("close called twice");
        self.queue.close();
        debug!(
            "pool closing, draining queue and waiting for {} workers",
            self.live_workers.load(Ordering::SeqCst)
        );
        wg.wait();
    }

    /// Учёт живых воркеров инкрементируется синхронно, до старта потока:
    /// всплеск сабмитов видит согласованный счётчик и не может переспаунить.
    fn spawn_worker(self: &Arc<Self>, wg: &WaitGroup) {
        let wg = wg.clone();
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        self.live_workers.fetch_add(1, Ordering::SeqCst);

        let pool = Arc::clone(self);
        thread::Builder::new()
            .name(format!("elastic-pool-worker-{id}"))
            .spawn(move || {
                pool.worker_loop(id);
                drop(wg);
            })
            .expect("could not spawn worker thread");
    }

    /// Цикл воркера: Fetching -> Executing -> Fetching ... -> Exited.
    fn worker_loop(&self, id: usize) {
        debug!("worker {id} started");
        let min_workers = self.config.min_workers;
        loop {
            let fetched = if min_workers > 0 {
                self.queue.pull_timeout(self.config.idle_timeout)
            } else {
                // Без floor-воркеров таймер не нужен: ждём задачу или закрытие
                self.queue.pull()
            };
            match fetched {
                Fetched::Job(job) => self.run_job(job),
                Fetched::TimedOut => {
                    if self.try_retire() {
                        debug!("worker {id} retired: idle above the floor");
                        return;
                    }
                    // Воркер входит в защищённый floor — ждём дальше
                }
                Fetched::Closed => {
                    self.live_workers.fetch_sub(1, Ordering::SeqCst);
                    debug!("worker {id} exited: queue closed and drained");
                    return;
                }
            }
        }
    }

    /// Выполнить задачу с изоляцией паники. Счётчики восстанавливаются на
    /// любом пути выхода: `catch_unwind` не пропускает панику дальше.
    fn run_job(&self, job: Job) {
        self.busy_workers.fetch_add(1, Ordering::SeqCst);
        let outcome = panic::catch_unwind(AssertUnwindSafe(job));
        self.busy_workers.fetch_sub(1, Ordering::SeqCst);
        self.jobs_processed.fetch_add(1, Ordering::Relaxed);

        if let Err(payload) = outcome {
            if let Some(hook) = &self.config.panic_hook {
                hook(payload);
            }
        }
    }

    /// Уволить лишнего воркера: декремент проходит только пока живых больше
    /// `min_workers`, поэтому floor сохраняется, даже когда несколько idle
    /// таймеров срабатывают одновременно. Какой именно воркер уйдёт —
    /// недетерминировано.
    fn try_retire(&self) -> bool {
        self.live_workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| {
                (live > self.config.min_workers).then(|| live - 1)
            })
            .is_ok()
    }

    #[inline]
    pub fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn busy_workers(&self) -> usize {
        self.busy_workers.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn jobs_processed(&self) -> usize {
        self.jobs_processed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queued_jobs(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        // busy читается раньше live: занятый воркер всегда жив
        PoolMetrics {
            busy_workers: self.busy_workers.load(Ordering::SeqCst),
            live_workers: self.live_workers.load(Ordering::SeqCst),
            queued_jobs: self.queue.len(),
            jobs_processed: self.jobs_processed.load(Ordering::Relaxed),
        }
    }
}
