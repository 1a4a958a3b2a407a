use super::affinity::{AffinityConfig, CoreClass};


/// Размер пула по умолчанию (и для реестра при ленивой инициализации).
pub const DEFAULT_THREAD_COUNT: usize = 3;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "pool-worker";


/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub num_threads: usize,
    /// Класс ядер, к которому каждый воркер привязывается при старте.
    /// `None`: воркеры не трогают affinity.
    pub worker_affinity: Option<CoreClass>,
    pub affinity: AffinityConfig,
    pub thread_name_prefix: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        // Привязка к большим ядрам включена только там, где топология известна заранее.
        let worker_affinity = if cfg!(target_os = "android") {
            Some(CoreClass::Performance)
        } else {
            None
        };

        Self {
            num_threads: DEFAULT_THREAD_COUNT,
            worker_affinity,
            affinity: AffinityConfig::default(),
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl PoolConfig {
    pub fn new(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Default::default()
        }
    }

    /// Воркеры на производительных ("big") ядрах.
    pub fn performance(num_threads: usize) -> Self {
        Self {
            num_threads,
            worker_affinity: Some(CoreClass::Performance),
            ..Default::default()
        }
    }

    /// Воркеры на энергоэффективных ("little") ядрах, для фоновой работы.
    pub fn efficiency(num_threads: usize) -> Self {
        Self {
            num_threads,
            worker_affinity: Some(CoreClass::Efficiency),
            ..Default::default()
        }
    }

    pub fn with_worker_affinity(mut self, class: Option<CoreClass>) -> Self {
        self.worker_affinity = class;
        self
    }

    pub fn with_affinity_config(mut self, affinity: AffinityConfig) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}
