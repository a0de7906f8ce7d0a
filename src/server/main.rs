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

use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpResponse, HttpServer, Responder, middleware, web};
use clap::Parser;
use route_graph::postgres_tools::make_async_pool;
use route_graph::store::PgRouteGraphStore;
use route_graph::{RouteGraphBuilder, RouteGraphConfig, SingleRouteHandler};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Rebuilds a route's graph links on request
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
    #[arg(long, env = "ROUTE_GRAPH_BIND", default_value = "127.0.0.1:17420")]
    bind: String,
    #[arg(long, env = "ROUTE_GRAPH_PROXIMITY_M", default_value_t = route_graph::config::DEFAULT_PROXIMITY_THRESHOLD_M)]
    proximity_threshold_m: f64,
    #[arg(long, env = "ROUTE_GRAPH_POOL_SIZE", default_value_t = 8)]
    pool_size: u32,
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

async fn index() -> impl Responder {
    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/plain"))
        .body("Hello World from the route graph builder!")
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = RouteGraphConfig {
        proximity_threshold_m: args.proximity_threshold_m,
        ..RouteGraphConfig::default()
    };

    let pool = make_async_pool(&args.database_url, args.pool_size)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let store = PgRouteGraphStore::new(Arc::new(pool), &config);

    // one handler, and so one set of per-route locks, shared by every worker
    let handler = web::Data::new(SingleRouteHandler::new(Arc::new(RouteGraphBuilder::new(
        Arc::new(store),
        config,
    ))));

    info!(bind = %args.bind, "starting route graph server");

    HttpServer::new(move || {
        App::new()
            .wrap(DefaultHeaders::new().add(("Server", "Catenary")))
            .wrap(middleware::Compress::default())
            .app_data(handler.clone())
            .route("/", web::get().to(index))
            .configure(route_graph::http_api::configure::<PgRouteGraphStore>)
    })
    .workers(args.workers)
    .bind(args.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
