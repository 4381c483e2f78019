use appcache::{AppCache, CacheConfig};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

// Dashboard-style soak run: many workers hammering a handful of feature
// namespaces while writers flush them.

const ROUNDS_PER_WORKER: usize = 500;
const FEATURES: [&str; 4] = [
    "freelancer:operations-hq",
    "finance:overview",
    "catalog:insights",
    "support:desk",
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("appcache soak starting...");

    let config = match CacheConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let cache: AppCache = match AppCache::new(config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to initialize cache: {}", e);
            std::process::exit(1);
        }
    };

    let num_workers = (num_cpus::get() * 4).clamp(4, 64);
    info!("Running {} workers x {} rounds", num_workers, ROUNDS_PER_WORKER);

    let aggregations = Arc::new(AtomicUsize::new(0));
    let mut workers = JoinSet::new();

    for worker_id in 0..num_workers {
        let cache = cache.clone();
        let aggregations = Arc::clone(&aggregations);
        workers.spawn(async move { run_worker(worker_id, cache, aggregations).await });
    }

    let mut failures = 0;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                failures += 1;
                error!("Worker failed: {}", e);
            }
            Err(e) => {
                failures += 1;
                error!("Worker panicked: {}", e);
            }
        }
    }

    let stats = cache.stats();
    info!(
        "Done: {} aggregations for {} lookups (hit ratio {:.2})",
        aggregations.load(Ordering::Relaxed),
        stats.hits + stats.misses,
        stats.hit_ratio()
    );

    match serde_json::to_string(&stats) {
        Ok(line) => info!("Stats: {}", line),
        Err(e) => error!("Failed to encode stats: {}", e),
    }

    if failures > 0 {
        std::process::exit(1);
    }
}

async fn run_worker(
    worker_id: usize,
    cache: AppCache,
    aggregations: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    for round in 0..ROUNDS_PER_WORKER {
        let feature = FEATURES[(worker_id + round) % FEATURES.len()];
        let scope = cache.namespace(feature)?;
        let payload = json!({ "entity_id": round % 16, "range": "30d" });

        match round % 10 {
            // Writer: a mutation invalidates the whole feature
            0 => {
                scope.flush();
            }
            1 => {
                scope.get(&payload)?;
            }
            // Writer: a fresh aggregate pushed straight into the cache
            2 => {
                let entity_id = round % 16;
                let total = json!({ "entity_id": entity_id, "total": entity_id * 100 });
                cache.set(scope.key(&payload)?, total, cache.config().default_ttl_secs);
            }
            _ => {
                let aggregations = Arc::clone(&aggregations);
                let entity_id = round % 16;
                scope
                    .remember(&payload, move || aggregate(entity_id, aggregations))
                    .await?;
            }
        }
    }
    Ok(())
}

/// Stand-in for a slow database aggregation
async fn aggregate(entity_id: usize, aggregations: Arc<AtomicUsize>) -> anyhow::Result<Value> {
    aggregations.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(5)).await;
    Ok(json!({ "entity_id": entity_id, "total": entity_id * 100 }))
}
