use std::sync::Mutex;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// Задача — непрозрачная единица работы без аргументов и результата
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Результат выборки задачи воркером
pub(crate) enum Fetched {
    Job(Job),
    TimedOut,
    /// Очередь закрыта и полностью опустошена
    Closed,
}

/// Ограниченная FIFO-очередь задач поверх crossbeam-канала.
///
/// Вместимость 0 даёт rendezvous-канал: задача передаётся воркеру строго
/// синхронно, без буферизации.
pub(crate) struct JobQueue {
    tx: Mutex<Option<Sender<Job>>>,
    rx: Receiver<Job>,
}

impl JobQueue {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
        }
    }

    /// Блокирующая постановка задачи: при заполненном буфере вызывающий
    /// поток ждёт освобождения слота (backpressure, задачи не теряются).
    ///
    /// Паникует, если очередь уже закрыта — нарушение контракта вызывающего.
    pub(crate) fn push(&self, job: Job) {
        let tx = self
            .tx
            .lock()
            .unwrap()
            .as_ref()
            .expect("submit on a closed pool")
            .clone();
        // Сам send выполняется вне мьютекса, иначе заблокированный на полном
        // буфере поток держал бы остальных сабмиттеров.
        tx.send(job).expect("job queue receiver disappeared");
    }

    /// Блокирующая выборка; `Fetched::Closed` после закрытия и осушения.
    pub(crate) fn pull(&self) -> Fetched {
        match self.rx.recv() {
            Ok(job) => Fetched::Job(job),
            Err(_) => Fetched::Closed,
        }
    }

    /// Выборка наперегонки с таймером: либо задача, либо таймаут, либо
    /// закрытая и осушенная очередь.
    pub(crate) fn pull_timeout(&self, timeout: Duration) -> Fetched {
        match self.rx.recv_timeout(timeout) {
            Ok(job) => Fetched::Job(job),
            Err(RecvTimeoutError::Timeout) => Fetched::TimedOut,
            Err(RecvTimeoutError::Disconnected) => Fetched::Closed,
        }
    }

    /// Одноразовый идемпотентный сигнал "задач больше не будет". Уже
    /// буферизованные задачи остаются доступными для `pull`.
    pub(crate) fn close(&self) {
        self.tx.lock().unwrap().take();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }
}
