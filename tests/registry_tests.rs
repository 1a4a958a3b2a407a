#[cfg(test)]
mod tests {
    use affinity_pool::{
        config::DEFAULT_THREAD_COUNT,
        errors::PoolError,
        registry::{self, PoolRegistry},
    };
    use std::sync::Arc;

    #[test]
    fn test_initialize_is_idempotent() {
        println!("\n=== TEST: Повторная инициализация ===");
        let registry = PoolRegistry::new();
        assert!(!registry.is_initialized());

        registry.initialize(2).unwrap();
        registry.initialize(6).unwrap();

        let pool = registry.get().unwrap();
        assert_eq!(pool.thread_count(), 2, "размер первого пула должен сохраниться");
        registry.shutdown();
        println!("  ✓ Второй вызов ничего не меняет");
    }

    #[test]
    fn test_lazy_initialization() {
        let registry = PoolRegistry::new();
        let pool = registry.get().unwrap();
        assert_eq!(pool.thread_count(), DEFAULT_THREAD_COUNT);
        assert!(registry.is_initialized());

        let again = registry.get().unwrap();
        assert!(Arc::ptr_eq(&pool, &again));
        registry.shutdown();
    }

    #[test]
    fn test_get_after_shutdown_recreates() {
        println!("\n=== TEST: Пересоздание после остановки ===");
        let registry = PoolRegistry::new();
        registry.initialize(4).unwrap();

        let first = registry.get().unwrap();
        assert_eq!(first.submit(|| 1).unwrap().join(), Ok(1));

        registry.shutdown();
        assert!(!registry.is_initialized());
        assert!(first.is_shutdown());
        assert!(matches!(first.submit(|| 2), Err(PoolError::Stopped)));

        let second = registry.get().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.thread_count(), DEFAULT_THREAD_COUNT);
        assert_eq!(second.submit(|| 3).unwrap().join(), Ok(3));

        registry.shutdown();
        println!("  ✓ Новый пул создан лениво");
    }

    #[test]
    fn test_shutdown_drains_registry_pool() {
        let registry = PoolRegistry::new();
        registry.initialize(1).unwrap();
        let pool = registry.get().unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                pool.submit(move || {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    i
                })
                .unwrap()
            })
            .collect();
        drop(pool);

        registry.shutdown();
        // все задачи завершились до возврата из shutdown
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.try_join().unwrap(), Ok(i as i32));
        }
    }

    #[test]
    fn test_shutdown_without_pool_is_noop() {
        let registry = PoolRegistry::new();
        registry.shutdown();
        registry.shutdown();
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_strict_registry_fails_fast() {
        println!("\n=== TEST: Строгий реестр ===");
        let registry = PoolRegistry::strict();
        assert!(matches!(registry.get(), Err(PoolError::NotInitialized)));

        registry.initialize(2).unwrap();
        assert_eq!(registry.get().unwrap().thread_count(), 2);

        registry.shutdown();
        assert!(matches!(registry.get(), Err(PoolError::NotInitialized)));
        println!("  ✓ Без инициализации пул не создаётся");
    }

    #[test]
    fn test_initialize_zero_threads() {
        let registry = PoolRegistry::new();
        assert!(matches!(registry.initialize(0), Err(PoolError::InvalidThreadCount)));
        assert!(!registry.is_initialized());
    }

    #[test]
    fn test_concurrent_get_yields_single_pool() {
        println!("\n=== TEST: Параллельная ленивая инициализация ===");
        let registry = PoolRegistry::new();

        let pools: Vec<Arc<_>> = crossbeam::scope(|s| {
            let workers: Vec<_> = (0..8)
                .map(|_| s.spawn(|_| registry.get().unwrap()))
                .collect();
            workers.into_iter().map(|w| w.join().unwrap()).collect()
        })
        .unwrap();

        let installed = registry.get().unwrap();
        for pool in &pools {
            assert!(Arc::ptr_eq(pool, &installed), "все потоки должны получить один пул");
        }
        assert_eq!(installed.submit(|| 11).unwrap().join(), Ok(11));

        drop(pools);
        drop(installed);
        registry.shutdown();
        println!("  ✓ Проигравшие кандидаты отброшены");
    }

    #[test]
    fn test_concurrent_initialize_keeps_first_size() {
        let registry = PoolRegistry::strict();

        crossbeam::scope(|s| {
            for threads in 1..=6 {
                let registry = &registry;
                s.spawn(move |_| registry.initialize(threads).unwrap());
            }
        })
        .unwrap();

        let pool = registry.get().unwrap();
        assert!((1..=6).contains(&pool.thread_count()));
        assert!(!pool.is_shutdown());
        assert_eq!(pool.submit(|| "alive").unwrap().join(), Ok("alive"));
        drop(pool);
        registry.shutdown();
    }

    // Единственный тест, который трогает глобальный реестр.
    #[test]
    fn test_global_registry_lifecycle() {
        println!("\n=== TEST: Глобальный реестр ===");
        registry::initialize_thread_pool(2).unwrap();
        registry::initialize_thread_pool(5).unwrap();

        let pool = registry::get_thread_pool().unwrap();
        assert_eq!(pool.thread_count(), 2);
        assert_eq!(pool.submit(|| "ok").unwrap().join(), Ok("ok"));
        drop(pool);

        registry::shutdown_thread_pool();
        assert!(!registry::global_registry().is_initialized());

        let recreated = registry::get_thread_pool().unwrap();
        assert_eq!(recreated.thread_count(), DEFAULT_THREAD_COUNT);
        drop(recreated);

        registry::shutdown_thread_pool();
        println!("  ✓ Init -> Shutdown -> ленивое пересоздание");
    }
}
