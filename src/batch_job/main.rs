// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::useless_asref,
    clippy::let_and_return,
    clippy::useless_vec
)]

use clap::Parser;
use route_graph::postgres_tools::make_async_pool;
use route_graph::store::PgRouteGraphStore;
use route_graph::{BatchOptions, BatchRunner, RouteGraphBuilder, RouteGraphConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Rebuilds the route graph links of every active route
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    #[arg(long, env = "ROUTE_GRAPH_PROXIMITY_M", default_value_t = route_graph::config::DEFAULT_PROXIMITY_THRESHOLD_M)]
    proximity_threshold_m: f64,
    #[arg(long, env = "ROUTE_GRAPH_POOL_SIZE", default_value_t = 8)]
    pool_size: u32,
    #[arg(long, default_value_t = route_graph::config::DEFAULT_INSERT_CHUNK_SIZE)]
    insert_chunk_size: usize,
    /// Compute link counts without writing
    #[arg(long)]
    dry_run: bool,
    /// Only rebuild these routes
    #[arg(long = "route-id")]
    route_ids: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = RouteGraphConfig {
        proximity_threshold_m: args.proximity_threshold_m,
        insert_chunk_size: args.insert_chunk_size,
    };

    let pool = make_async_pool(&args.database_url, args.pool_size)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let store = PgRouteGraphStore::new(Arc::new(pool), &config);

    let runner = BatchRunner::new(Arc::new(RouteGraphBuilder::new(Arc::new(store), config)));

    let summary = runner
        .run(&BatchOptions {
            dry_run: args.dry_run,
            route_ids: args.route_ids,
        })
        .await?;

    println!("{}", serde_json::to_string(&summary)?);

    if summary.failed > 0 {
        anyhow::bail!("{} routes failed to link", summary.failed);
    }

    Ok(())
}
