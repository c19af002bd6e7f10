//! Basic usage examples for ObjectPool

use std::time::Duration;

use esox_resourcepool::{ObjectPool, Params, PoolConfiguration, PoolError, Resource, ResourceError};

struct Buffer {
    data: Vec<u8>,
}

impl Resource for Buffer {
    fn initialize(&mut self, params: &Params) -> Result<(), ResourceError> {
        let size = params
            .get("buffer_size")
            .map(|s| s.parse::<usize>())
            .transpose()
            .map_err(|e| ResourceError::new(format!("bad buffer_size: {e}")))?
            .unwrap_or(1024);
        self.data = vec![0; size];
        Ok(())
    }

    fn check(&mut self, _params: &Params) -> Result<(), ResourceError> {
        if self.data.is_empty() {
            return Err(ResourceError::new("buffer was released"));
        }
        Ok(())
    }

    fn dispose(&mut self, _params: &Params) -> Result<(), ResourceError> {
        self.data = Vec::new();
        Ok(())
    }
}

fn main() {
    println!("=== Esox ResourcePool - Basic Examples ===\n");

    // Example 1: Explicit get/back
    explicit_lifecycle();

    // Example 2: RAII guard
    pooled_guard();

    // Example 3: Errors after shutdown
    after_shutdown();
}

fn new_pool() -> ObjectPool<Buffer> {
    let config = PoolConfiguration::new()
        .with_initial_pool_size(3)
        .with_min_pool_size(1)
        .with_max_pool_size(8)
        .with_test_duration(Duration::from_secs(10))
        .with_param("buffer_size", "4096");
    ObjectPool::new(|| Buffer { data: Vec::new() }, config)
}

fn explicit_lifecycle() {
    println!("1. Explicit get/back:");
    let pool = new_pool();
    pool.initial();

    let buffer = pool.get_one().unwrap();
    println!("   Got buffer of {} bytes", buffer.data.len());
    println!("   Idle while held: {}", pool.idle_count());
    pool.back_one(buffer);
    println!("   Idle after return: {}\n", pool.idle_count());
    pool.shutdown();
}

fn pooled_guard() {
    println!("2. RAII guard:");
    let pool = new_pool();
    pool.initial();

    {
        let mut buffer = pool.get().unwrap();
        buffer.data[0] = 42;
        println!("   Idle while held: {}", pool.idle_count());
    }

    println!("   Idle after drop: {}\n", pool.idle_count());
    pool.shutdown();
}

fn after_shutdown() {
    println!("3. After shutdown:");
    let pool = new_pool();
    pool.initial();
    pool.shutdown();

    match pool.get_one() {
        Err(PoolError::Shutdown) => println!("   Acquire refused: pool is shut down"),
        Err(e) => println!("   Unexpected error: {e}"),
        Ok(_) => println!("   Unexpectedly got a buffer"),
    }
}
