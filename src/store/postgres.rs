// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::config::RouteGraphConfig;
use crate::error::StoreError;
use crate::models::{DEPRECATED_STATUS, GraphNode, Route, RouteGraphLink};
use crate::postgres_tools::RouteGraphPostgresPool;
use crate::store::RouteGraphStore;
use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::SelectableHelper;
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel_async::AsyncConnection;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde_json::Value;
use std::sync::Arc;

/// Transaction-scoped advisory lock keyed by the route id. Every writer of a
/// route, in any process, queues here until the holder commits or rolls back.
pub fn route_write_lock(route_id: &str) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .into_boxed::<Pg>()
        .bind::<diesel::sql_types::Text, _>(route_id.to_string())
}

/// Route graph store backed by the Postgres pool.
#[derive(Clone)]
pub struct PgRouteGraphStore {
    pool: Arc<RouteGraphPostgresPool>,
    insert_chunk_size: usize,
}

impl PgRouteGraphStore {
    pub fn new(pool: Arc<RouteGraphPostgresPool>, config: &RouteGraphConfig) -> Self {
        Self {
            pool,
            insert_chunk_size: config.insert_chunk_size.max(1),
        }
    }
}

impl RouteGraphStore for PgRouteGraphStore {
    async fn fetch_active_routes(&self) -> Result<Vec<Route>, StoreError> {
        let conn_pool = self.pool.as_ref();
        let conn_pre = conn_pool.get().await;
        let conn = &mut conn_pre.map_err(|e| StoreError::Pool(e.to_string()))?;

        let routes: Vec<Route> = crate::schema::routes::dsl::routes
            .filter(crate::schema::routes::dsl::deleted_at.is_null())
            .filter(crate::schema::routes::dsl::status.ne(DEPRECATED_STATUS))
            .filter(crate::schema::routes::dsl::geometry.is_not_null())
            .order(crate::schema::routes::dsl::id.asc())
            .select(Route::as_select())
            .load(conn)
            .await?;

        // status comparison in sql is case sensitive
        Ok(routes.into_iter().filter(Route::is_eligible).collect())
    }

    async fn fetch_route(&self, route_id: &str) -> Result<Option<Route>, StoreError> {
        let conn_pool = self.pool.as_ref();
        let conn_pre = conn_pool.get().await;
        let conn = &mut conn_pre.map_err(|e| StoreError::Pool(e.to_string()))?;

        let mut routes: Vec<Route> = crate::schema::routes::dsl::routes
            .filter(crate::schema::routes::dsl::id.eq(route_id))
            .select(Route::as_select())
            .load(conn)
            .await?;

        Ok(routes.pop())
    }

    async fn fetch_nodes(&self) -> Result<Vec<GraphNode>, StoreError> {
        let conn_pool = self.pool.as_ref();
        let conn_pre = conn_pool.get().await;
        let conn = &mut conn_pre.map_err(|e| StoreError::Pool(e.to_string()))?;

        let nodes: Vec<GraphNode> = crate::schema::graph_nodes::dsl::graph_nodes
            .order(crate::schema::graph_nodes::dsl::id.asc())
            .select(GraphNode::as_select())
            .load(conn)
            .await?;

        Ok(nodes)
    }

    async fn replace_links(
        &self,
        route_id: &str,
        source_geometry: Option<&Value>,
        links: Vec<RouteGraphLink>,
    ) -> Result<(), StoreError> {
        let conn_pool = self.pool.as_ref();
        let conn_pre = conn_pool.get().await;
        let conn = &mut conn_pre.map_err(|e| StoreError::Pool(e.to_string()))?;

        let route_id = route_id.to_string();
        let source_geometry = source_geometry.cloned();
        let insert_chunk_size = self.insert_chunk_size;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                route_write_lock(&route_id).execute(conn).await?;

                // the geometry may have been edited while the links were computed
                let current_geometry: Option<Option<Value>> = crate::schema::routes::dsl::routes
                    .filter(crate::schema::routes::dsl::id.eq(&route_id))
                    .select(crate::schema::routes::dsl::geometry)
                    .first(conn)
                    .await
                    .optional()?;

                if current_geometry != Some(source_geometry) {
                    return Err(StoreError::GeometryChanged(route_id));
                }

                diesel::delete(
                    crate::schema::route_graph_links::dsl::route_graph_links
                        .filter(crate::schema::route_graph_links::dsl::route_id.eq(&route_id)),
                )
                .execute(conn)
                .await?;

                for chunk in links.chunks(insert_chunk_size) {
                    diesel::insert_into(crate::schema::route_graph_links::dsl::route_graph_links)
                        .values(chunk)
                        .execute(conn)
                        .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        Ok(())
    }

    async fn fetch_links(&self, route_id: &str) -> Result<Vec<RouteGraphLink>, StoreError> {
        let conn_pool = self.pool.as_ref();
        let conn_pre = conn_pool.get().await;
        let conn = &mut conn_pre.map_err(|e| StoreError::Pool(e.to_string()))?;

        let links: Vec<RouteGraphLink> = crate::schema::route_graph_links::dsl::route_graph_links
            .filter(crate::schema::route_graph_links::dsl::route_id.eq(route_id))
            .order(crate::schema::route_graph_links::dsl::order_index.asc())
            .select(RouteGraphLink::as_select())
            .load(conn)
            .await?;

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::debug_query;

    #[test]
    fn write_lock_is_a_transaction_advisory_lock_on_the_route() {
        let query = route_write_lock("route-9");
        let sql = debug_query::<Pg, _>(&query).to_string();

        assert!(sql.contains("pg_advisory_xact_lock(hashtext($1))"));
        assert!(sql.contains("route-9"));
    }
}
