//! Пул постоянных рабочих потоков для чувствительного к задержкам кода
//! на асимметричных (big.LITTLE) процессорах.
//!
//! # Features
//! - Фиксированный набор воркеров и общая FIFO-очередь, без создания потока на задачу
//! - `JoinHandle` на результат: блокирующее ожидание, опрос или `.await`
//! - Паники задач доставляются в handle и не убивают воркеры
//! - Остановка с дренажом: уже поставленные задачи всегда выполняются
//! - Привязка воркеров к производительным или энергоэффективным ядрам
//! - Реестр пула на процесс с явной и ленивой инициализацией

pub mod affinity;
pub mod config;
pub mod errors;
pub mod handle;
pub mod logging;
pub mod model;
pub mod pool;
pub mod registry;
pub mod result;

pub use affinity::{AffinityConfig, AffinityControl, CoreAffinity, CoreClass};
pub use config::{PoolConfig, DEFAULT_THREAD_COUNT};
pub use errors::{PoolError, SpawnError};
pub use handle::{join_handles, JoinHandle};
pub use model::{JoinOrdering, PoolMetrics};
pub use pool::ThreadPool;
pub use registry::{get_thread_pool, initialize_thread_pool, shutdown_thread_pool, PoolRegistry};
pub use result::SpawnResult;
