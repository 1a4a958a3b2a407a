//! Жизненный цикл общего пула: явная инициализация, ленивое создание, остановка.
//!
//! `PoolRegistry` это обычное значение, которое можно передавать подсистемам
//! явно. Глобальные функции ниже служат тонкой обёрткой над статическим реестром
//! для кода, которому нужен один пул на процесс.

use super::{
    config::{PoolConfig, DEFAULT_THREAD_COUNT},
    errors::PoolError,
    pool::ThreadPool,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};


/// Держатель не более чем одного пула.
///
/// Состояния: не инициализирован -> инициализирован -> остановлен, из
/// остановленного снова можно перейти в инициализированный.
#[derive(Debug)]
pub struct PoolRegistry {
    pool: Mutex<Option<Arc<ThreadPool>>>,
    auto_init: bool,
    default_threads: usize,
}

impl PoolRegistry {
    /// При первом `get` без явной инициализации создаёт пул на `DEFAULT_THREAD_COUNT` потоков.
    pub const fn new() -> Self {
        Self {
            pool: Mutex::new(None),
            auto_init: true,
            default_threads: DEFAULT_THREAD_COUNT,
        }
    }

    /// `get` без предварительного `initialize` возвращает `PoolError::NotInitialized`.
    pub const fn strict() -> Self {
        Self {
            pool: Mutex::new(None),
            auto_init: false,
            default_threads: DEFAULT_THREAD_COUNT,
        }
    }

    // Блокировка реестра не удерживается ни при создании, ни при остановке пула,
    // поэтому её отравление не оставляет слот в промежуточном состоянии.
    fn slot(&self) -> MutexGuard<'_, Option<Arc<ThreadPool>>> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current(&self) -> Option<Arc<ThreadPool>> {
        self.slot().as_ref().map(Arc::clone)
    }

    /// Создаёт пул без блокировки реестра и кладёт его в слот, если тот всё ещё пуст.
    ///
    /// Проигравший гонку кандидат останавливается уже после снятия блокировки.
    /// Второй элемент результата: `true`, если установлен именно новый пул.
    fn install(&self, config: PoolConfig) -> Result<(Arc<ThreadPool>, bool), PoolError> {
        let candidate = Arc::new(ThreadPool::with_config(config)?);

        let existing = {
            let mut slot = self.slot();
            match slot.as_ref() {
                Some(pool) => Arc::clone(pool),
                None => {
                    *slot = Some(Arc::clone(&candidate));
                    return Ok((candidate, true));
                }
            }
        };

        debug!("concurrent initialization lost the race, discarding candidate pool");
        candidate.shutdown();
        Ok((existing, false))
    }

    /// Создаёт пул, если его ещё нет. Если пул уже есть, ничего не делает:
    /// размер существующего пула не меняется.
    pub fn initialize(&self, num_threads: usize) -> Result<(), PoolError> {
        self.initialize_with_config(PoolConfig::new(num_threads))
    }

    pub fn initialize_with_config(&self, config: PoolConfig) -> Result<(), PoolError> {
        if let Some(pool) = self.current() {
            debug!(
                threads = pool.thread_count(),
                requested = config.num_threads,
                "thread pool already initialized"
            );
            return Ok(());
        }

        let threads = config.num_threads;
        if self.install(config)?.1 {
            info!(threads, "global thread pool initialized");
        }
        Ok(())
    }

    /// Текущий пул; при политике по умолчанию создаёт его лениво.
    pub fn get(&self) -> Result<Arc<ThreadPool>, PoolError> {
        if let Some(pool) = self.current() {
            return Ok(pool);
        }

        if !self.auto_init {
            return Err(PoolError::NotInitialized);
        }

        let (pool, installed) = self.install(PoolConfig::new(self.default_threads))?;
        if installed {
            warn!(
                threads = self.default_threads,
                "thread pool auto-initialized, initialize it explicitly at startup"
            );
        }
        Ok(pool)
    }

    /// Останавливает пул (с дренажом очереди и join всех воркеров), если он есть.
    ///
    /// Пул извлекается под блокировкой реестра, а останавливается уже после
    /// её снятия. Остальные владельцы `Arc` после этого получают `PoolError::Stopped`.
    pub fn shutdown(&self) {
        let pool = self.slot().take();

        if let Some(pool) = pool {
            pool.shutdown();
            info!("global thread pool shutdown");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.slot().is_some()
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}


static GLOBAL_REGISTRY: PoolRegistry = PoolRegistry::new();

pub fn global_registry() -> &'static PoolRegistry {
    &GLOBAL_REGISTRY
}

/// Вызывайте один раз при старте приложения.
pub fn initialize_thread_pool(num_threads: usize) -> Result<(), PoolError> {
    GLOBAL_REGISTRY.initialize(num_threads)
}

/// Инициализирует пул с размером по умолчанию, если этого ещё не сделали.
pub fn get_thread_pool() -> Result<Arc<ThreadPool>, PoolError> {
    GLOBAL_REGISTRY.get()
}

/// Вызывайте при завершении приложения.
pub fn shutdown_thread_pool() {
    GLOBAL_REGISTRY.shutdown()
}
