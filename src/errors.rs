use std::io;
use thiserror::Error;

/// Результат одной задачи, доставляемый через `JoinHandle`.
#[derive(Error, Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub enum SpawnError {
    #[error("task panicked: {0}")]
    Panic(String),
    #[error("task was dropped before it ran")]
    Cancelled,
    #[error("timed out waiting for task result")]
    Timeout,
}

/// Ошибки уровня пула: возвращаются вызывающему синхронно.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("thread pool is stopped")]
    Stopped,
    #[error("thread pool needs at least one worker thread")]
    InvalidThreadCount,
    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawn(#[source] io::Error),
    #[error("thread pool is not initialized")]
    NotInitialized,
}
