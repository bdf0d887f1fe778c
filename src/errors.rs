use thiserror::Error;

/// Ошибки валидации конфигурации при построении пула
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BuildError {
    /// Пул с нулевой вместимостью никогда не выполнит ни одной задачи
    #[error("max_workers must be at least 1")]
    ZeroCapacity,
    /// Floor-воркеры с нулевым таймаутом крутились бы в busy-loop
    #[error("min_workers > 0 requires a non-zero idle_timeout")]
    ZeroIdleTimeout,
}
