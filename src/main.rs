// Esox ResourcePool demo
// Usage: esox_resourcepool [config.toml]
// Set RUST_LOG=debug to watch the pool grow, sweep and shut down.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use esox_resourcepool::{ObjectPool, Params, PoolConfiguration, Resource, ResourceError};
use tracing_subscriber::EnvFilter;

struct DemoConnection {
    id: usize,
    open: bool,
}

impl Resource for DemoConnection {
    fn initialize(&mut self, params: &Params) -> Result<(), ResourceError> {
        let host = params.get("host").map_or("localhost", String::as_str);
        tracing::info!(id = self.id, host, "opening connection");
        self.open = true;
        Ok(())
    }

    fn check(&mut self, _params: &Params) -> Result<(), ResourceError> {
        if self.open {
            Ok(())
        } else {
            Err(ResourceError::new(format!("connection {} is closed", self.id)))
        }
    }

    fn dispose(&mut self, _params: &Params) -> Result<(), ResourceError> {
        tracing::info!(id = self.id, "closing connection");
        self.open = false;
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match PoolConfiguration::load_toml(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => PoolConfiguration::default().with_param("host", "127.0.0.1"),
    };

    println!("=== Esox ResourcePool ===");
    println!("{config}");

    let next_id = Arc::new(AtomicUsize::new(0));
    let pool = ObjectPool::new(
        move || DemoConnection {
            id: next_id.fetch_add(1, Ordering::Relaxed),
            open: false,
        },
        config,
    );
    pool.initial();
    println!("Idle after initial: {}", pool.idle_count());

    match pool.get_one() {
        Ok(conn) => {
            println!("Got connection {}", conn.id);
            pool.back_one(conn);
        }
        Err(e) => println!("Acquire failed: {e}"),
    }

    pool.shutdown();
    println!("Idle after shutdown: {}", pool.idle_count());
    for (name, value) in pool.export_metrics() {
        println!("  {name}: {value}");
    }
}
