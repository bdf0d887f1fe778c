//! Динамически масштабируемый пул воркеров с ограниченной очередью задач
//!
//! # Features
//! - Ленивый рост: воркеры стартуют по мере поступления задач, до `max_workers`
//! - Тёплый floor: `min_workers` воркеров переживают простой по idle-таймауту
//! - Backpressure: ограниченный буфер очереди блокирует сабмиттера, а не теряет задачи
//! - Изоляция паник: упавшая задача не убивает воркера и соседние задачи
//! - Метрики без блокировок: живые/занятые воркеры, счётчик выполненных задач

pub mod errors;
pub mod model;
pub mod pool;
mod queue;

pub use pool::{Config, PanicHook, PanicPayload, WorkerPool, WorkerPoolInner};
pub use queue::Job;
