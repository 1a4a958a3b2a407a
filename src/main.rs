use affinity_pool::{
    get_thread_pool, initialize_thread_pool, logging, shutdown_thread_pool, PoolError,
};
use std::time::Instant;


fn main() -> Result<(), PoolError> {
    logging::init_default();

    let now = Instant::now();
    initialize_thread_pool(3)?;
    let pool = get_thread_pool()?;

    let handles = (0..100_000u64)
        .map(|i| pool.submit(move || i * i))
        .collect::<Result<Vec<_>, _>>()?;

    let sum: u64 = handles
        .into_iter()
        .filter_map(|handle| handle.join().ok())
        .sum();

    drop(pool);
    shutdown_thread_pool();
    logging::info!(sum, elapsed = ?now.elapsed(), "demo finished");
    println!("sum: {}, elapsed: {:?}", sum, now.elapsed());
    Ok(())
}
