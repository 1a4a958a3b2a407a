use super::{
    affinity::{platform_affinity, AffinityControl, CoreAffinity, CoreClass},
    config::PoolConfig,
    errors::{PoolError, SpawnError},
    handle::{JoinHandle, Task},
    model::PoolMetrics,
};
use std::{
    any::Any,
    collections::VecDeque,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, ThreadId},
    time::Duration,
};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn, Dispatch};


struct QueueState {
    tasks: VecDeque<Task>,
    /// Монотонный: false -> true, обратно не возвращается.
    stopped: bool,
}

/// Состояние, общее для пула и воркеров.
///
/// `queue` это единственная точка сериализации: очередь и флаг остановки
/// меняются только под ней, задачи под ней не выполняются.
struct Shared {
    queue: Mutex<QueueState>,
    /// Очередь непуста или пул остановлен.
    available: Condvar,
    /// Очередь опустела.
    drained: Condvar,
    active_tasks: AtomicUsize,
    total_submitted: AtomicUsize,
    completed_tasks: AtomicUsize,
    failed_tasks: AtomicUsize,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: Mutex::new(QueueState {
                tasks: VecDeque::new(),
                stopped: false,
            }),
            available: Condvar::new(),
            drained: Condvar::new(),
            active_tasks: AtomicUsize::new(0),
            total_submitted: AtomicUsize::new(0),
            completed_tasks: AtomicUsize::new(0),
            failed_tasks: AtomicUsize::new(0),
        }
    }

    // Пользовательский код под блокировкой не выполняется, так что отравление
    // мьютекса не оставляет очередь в несогласованном состоянии.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        self.lock().stopped = true;
        self.available.notify_all();
    }

    /// Забирает следующую задачу. `None`, если пул остановлен и очередь пуста.
    fn next_task(&self) -> Option<Task> {
        let mut state = self.lock();
        while state.tasks.is_empty() && !state.stopped {
            state = self.available.wait(state).unwrap_or_else(PoisonError::into_inner);
        }

        let task = state.tasks.pop_front()?;
        self.active_tasks.fetch_add(1, Ordering::Relaxed);
        if state.tasks.is_empty() {
            self.drained.notify_all();
        }
        Some(task)
    }
}


/// Пул постоянных рабочих потоков с общей FIFO-очередью.
///
/// # Гарантии
/// - каждая принятая задача выполняется ровно одним воркером, ровно один раз;
/// - задачи забираются из очереди в порядке отправки;
/// - паника в задаче доставляется в её `JoinHandle` и не убивает воркер;
/// - `shutdown` (и `Drop`) не принимает новых задач, но дожидается всех
///   уже поставленных в очередь и выполняющихся.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    worker_ids: Vec<ThreadId>,
    thread_count: usize,
    config: PoolConfig,
}

impl ThreadPool {
    /// Пул из `num_threads` воркеров с остальными настройками по умолчанию.
    pub fn new(num_threads: usize) -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::new(num_threads))
    }

    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        Self::with_affinity(config, platform_affinity())
    }

    /// Как `with_config`, но с явно заданным примитивом affinity.
    ///
    /// `num_threads == 0` даёт `PoolError::InvalidThreadCount`: такой пул никогда не разгрузит очередь.
    pub fn with_affinity(
        config: PoolConfig,
        control: Arc<dyn AffinityControl>,
    ) -> Result<Self, PoolError> {
        if config.num_threads == 0 {
            return Err(PoolError::InvalidThreadCount);
        }

        info!(
            threads = config.num_threads,
            affinity = ?config.worker_affinity,
            "creating thread pool"
        );

        let shared = Arc::new(Shared::new());
        let affinity = CoreAffinity::new(config.affinity.clone(), control);

        // Воркеры наследуют подписчика tracing потока, создающего пул.
        let dispatch = tracing::dispatcher::get_default(|current| current.clone());
        let dispatch = (!dispatch.is::<tracing::subscriber::NoSubscriber>()).then_some(dispatch);

        let mut workers = Vec::with_capacity(config.num_threads);
        for worker_id in 0..config.num_threads {
            let worker = Worker {
                id: worker_id,
                shared: Arc::clone(&shared),
                pinning: config.worker_affinity.map(|class| (affinity.clone(), class)),
            };
            let dispatch = dispatch.clone();

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", config.thread_name_prefix, worker_id))
                .spawn(move || worker.run_with(dispatch));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    error!(worker_id, error = %err, "failed to spawn worker thread");
                    shared.stop();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolError::ThreadSpawn(err));
                }
            }
        }

        let worker_ids = workers.iter().map(|handle| handle.thread().id()).collect();

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_ids,
            thread_count: config.num_threads,
            config,
        })
    }

    /// Ставит задачу в очередь и сразу возвращает handle на её результат.
    ///
    /// Аргументы передаются захватом в замыкание. После начала остановки
    /// возвращает `PoolError::Stopped`, задача при этом не создаётся.
    pub fn submit<F, T>(&self, f: F) -> Result<JoinHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        self.enqueue(Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(f))
                .map_err(|payload| SpawnError::Panic(panic_message(payload.as_ref())));
            let succeeded = result.is_ok();
            // Получатель мог уже отказаться от результата.
            let _ = tx.send(result);
            succeeded
        }))?;

        Ok(JoinHandle::new(rx))
    }

    /// Fire-and-forget: результат не нужен, паника только логируется.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Box::new(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => true,
            Err(payload) => {
                error!(panic = %panic_message(payload.as_ref()), "detached task panicked");
                false
            }
        }))
    }

    fn enqueue(&self, task: Task) -> Result<(), PoolError> {
        {
            let mut state = self.shared.lock();
            if state.stopped {
                return Err(PoolError::Stopped);
            }
            state.tasks.push_back(task);
            self.shared.total_submitted.fetch_add(1, Ordering::Relaxed);
        }
        self.shared.available.notify_one();
        Ok(())
    }

    /// Ждёт, пока очередь хотя бы раз окажется пустой.
    ///
    /// Уже забранные воркерами задачи могут ещё выполняться, а другие потоки
    /// могут тут же добавить новые. Для настоящего завершения ждите `JoinHandle`.
    pub fn wait_for_tasks(&self) {
        let state = self.shared.lock();
        let _state = self
            .shared
            .drained
            .wait_while(state, |state| !state.tasks.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// `true`, если очередь опустела до истечения таймаута.
    pub fn wait_for_tasks_timeout(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .drained
            .wait_timeout_while(state, timeout, |state| !state.tasks.is_empty())
            .unwrap_or_else(PoisonError::into_inner);
        state.tasks.is_empty()
    }

    /// Останавливает пул: новые задачи отклоняются, очередь дорабатывается,
    /// все воркеры присоединяются. Повторный вызов ничего не делает.
    ///
    /// Из задачи этого же пула только выставляет флаг: ждать самого себя нельзя.
    pub fn shutdown(&self) {
        self.shared.stop();

        if self.worker_ids.contains(&thread::current().id()) {
            warn!("thread pool shutdown requested from its own worker, workers are not joined");
            return;
        }

        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        if workers.is_empty() {
            return;
        }

        for handle in workers.drain(..) {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                warn!(worker = ?name, "worker thread terminated abnormally");
            }
        }

        info!(threads = self.thread_count, "thread pool destroyed");
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.lock().stopped
    }

    pub fn queued_tasks(&self) -> usize {
        self.shared.lock().tasks.len()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            threads: self.thread_count,
            active_tasks: self.shared.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks(),
            total_submitted: self.shared.total_submitted.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("thread_count", &self.thread_count)
            .field("queued_tasks", &self.queued_tasks())
            .field("is_shutdown", &self.is_shutdown())
            .finish()
    }
}


struct Worker {
    id: usize,
    shared: Arc<Shared>,
    pinning: Option<(CoreAffinity, CoreClass)>,
}

impl Worker {
    fn run_with(self, dispatch: Option<Dispatch>) {
        match dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(&dispatch, || self.run()),
            None => self.run(),
        }
    }

    fn run(self) {
        if let Some((affinity, class)) = &self.pinning {
            affinity.apply(*class);
        }
        debug!(worker_id = self.id, "worker started");

        while let Some(task) = self.shared.next_task() {
            // Паники перехватываются внутри задачи.
            let succeeded = task();

            if succeeded {
                self.shared.completed_tasks.fetch_add(1, Ordering::Relaxed);
            } else {
                self.shared.failed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            self.shared.active_tasks.fetch_sub(1, Ordering::Relaxed);
        }

        debug!(worker_id = self.id, "worker exiting");
    }
}


fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
