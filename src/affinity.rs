//! Привязка потоков к классам ядер на асимметричных (big.LITTLE) процессорах.
//!
//! Affinity здесь только подсказка планировщику ОС: неудача логируется
//! и никогда не превращается в ошибку для вызывающего кода.

use std::{io, sync::Arc, thread};
use tracing::{debug, warn};


/// Класс ядер, к которому привязывается поток.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreClass {
    /// Производительные ("big"/"prime") ядра.
    Performance,
    /// Энергоэффективные ("little") ядра.
    Efficiency,
    /// Все логические ядра системы.
    Unrestricted,
}


/// Индексы логических ядер для каждого класса.
///
/// Топология зависит от устройства, поэтому списки задаются снаружи.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityConfig {
    pub performance_cores: Vec<usize>,
    pub efficiency_cores: Vec<usize>,
}

impl Default for AffinityConfig {
    /// Типичная 8-ядерная мобильная SoC: 0-3 little, 4-6 big, 7 prime.
    fn default() -> Self {
        Self {
            performance_cores: (4..8).collect(),
            efficiency_cores: (0..4).collect(),
        }
    }
}

impl AffinityConfig {
    pub fn new(performance_cores: Vec<usize>, efficiency_cores: Vec<usize>) -> Self {
        Self {
            performance_cores,
            efficiency_cores,
        }
    }
}


/// Платформенный примитив: ограничить текущий поток набором логических ядер.
pub trait AffinityControl: Send + Sync {
    fn restrict_current_thread(&self, cores: &[usize]) -> io::Result<()>;

    /// Число сконфигурированных логических ядер, для `CoreClass::Unrestricted`.
    fn logical_core_count(&self) -> usize {
        num_cpus::get()
    }
}


/// `sched_setaffinity` для вызывающего потока.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct OsAffinity;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl AffinityControl for OsAffinity {
    fn restrict_current_thread(&self, cores: &[usize]) -> io::Result<()> {
        use std::mem;

        let max_cores = mem::size_of::<libc::cpu_set_t>() * 8;
        let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
        let mut any = false;

        unsafe {
            libc::CPU_ZERO(&mut set);
            for &core in cores.iter().filter(|&&core| core < max_cores) {
                libc::CPU_SET(core, &mut set);
                any = true;
            }
        }

        if !any {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no usable core indices in {:?}", cores),
            ));
        }

        // pid 0: текущий поток
        let ret = unsafe { libc::sched_setaffinity(0, mem::size_of::<libc::cpu_set_t>(), &set) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    fn logical_core_count(&self) -> usize {
        // _SC_NPROCESSORS_CONF не зависит от текущей маски, в отличие от num_cpus::get().
        let configured = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
        if configured > 0 {
            configured as usize
        } else {
            num_cpus::get()
        }
    }
}


/// Реализация для платформ без поддержки affinity: всё успешно и ничего не делает.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAffinity;

impl AffinityControl for NoopAffinity {
    fn restrict_current_thread(&self, _cores: &[usize]) -> io::Result<()> {
        Ok(())
    }
}


/// Реализация, выбранная для текущей платформы при компиляции.
pub fn platform_affinity() -> Arc<dyn AffinityControl> {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        Arc::new(OsAffinity)
    }
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    {
        Arc::new(NoopAffinity)
    }
}


/// Связка топологии и платформенного примитива.
#[derive(Clone)]
pub struct CoreAffinity {
    config: AffinityConfig,
    control: Arc<dyn AffinityControl>,
}

impl CoreAffinity {
    pub fn new(config: AffinityConfig, control: Arc<dyn AffinityControl>) -> Self {
        Self { config, control }
    }

    pub fn platform(config: AffinityConfig) -> Self {
        Self::new(config, platform_affinity())
    }

    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    pub fn cores_for(&self, class: CoreClass) -> Vec<usize> {
        match class {
            CoreClass::Performance => self.config.performance_cores.clone(),
            CoreClass::Efficiency => self.config.efficiency_cores.clone(),
            CoreClass::Unrestricted => (0..self.control.logical_core_count()).collect(),
        }
    }

    /// Привязывает вызывающий поток к классу ядер.
    ///
    /// Возвращает `false`, если ОС отказала; ошибка только логируется.
    pub fn apply(&self, class: CoreClass) -> bool {
        let cores = self.cores_for(class);
        let current = thread::current();
        let thread_name = current.name().unwrap_or("<unnamed>");

        match self.control.restrict_current_thread(&cores) {
            Ok(()) => {
                debug!(thread = thread_name, ?class, ?cores, "thread affinity set");
                true
            }
            Err(err) => {
                warn!(thread = thread_name, ?class, ?cores, error = %err, "failed to set thread affinity");
                false
            }
        }
    }
}

impl std::fmt::Debug for CoreAffinity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreAffinity")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}


fn default_affinity() -> CoreAffinity {
    CoreAffinity::platform(AffinityConfig::default())
}

pub fn set_performance_core_affinity() -> bool {
    default_affinity().apply(CoreClass::Performance)
}

pub fn set_efficiency_core_affinity() -> bool {
    default_affinity().apply(CoreClass::Efficiency)
}

pub fn reset_core_affinity() -> bool {
    default_affinity().apply(CoreClass::Unrestricted)
}
