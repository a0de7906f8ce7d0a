// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::error::RouteGraphError;
use crate::models::RouteGraphLink;
use crate::single_route::SingleRouteHandler;
use crate::store::RouteGraphStore;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BuildRouteGraphRequest {
    route_id: Option<Value>,
}

#[derive(Serialize)]
struct BuildRouteGraphResponse {
    success: bool,
    count: usize,
}

#[derive(Serialize)]
struct RouteGraphLinksResponse {
    route_id: String,
    links: Vec<RouteGraphLink>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn status_for(err: &RouteGraphError) -> StatusCode {
    match err {
        RouteGraphError::MissingRouteId => StatusCode::BAD_REQUEST,
        RouteGraphError::RouteNotFound(_) => StatusCode::NOT_FOUND,
        RouteGraphError::RouteNotEligible(_) | RouteGraphError::InvalidGeometry { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RouteGraphError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, error: String) -> HttpResponse {
    HttpResponse::build(status)
        .insert_header(("Cache-Control", "no-cache"))
        .json(ErrorResponse { error })
}

/// `POST /route-graph/build` with `{ "routeId": ... }`
pub async fn build_route_graph<S: RouteGraphStore + 'static>(
    handler: web::Data<SingleRouteHandler<S>>,
    body: web::Bytes,
) -> HttpResponse {
    let request: BuildRouteGraphRequest = if body.is_empty() {
        BuildRouteGraphRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(err) => {
                return error_response(StatusCode::BAD_REQUEST, format!("invalid JSON body: {}", err));
            }
        }
    };

    // numeric ids are accepted and used as text
    let route_id = match request.route_id {
        Some(Value::String(id)) => Some(id),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    };

    match handler.handle(route_id.as_deref()).await {
        Ok(count) => HttpResponse::Ok()
            .insert_header(("Cache-Control", "no-cache"))
            .json(BuildRouteGraphResponse {
                success: true,
                count,
            }),
        Err(err) => {
            let status = status_for(&err);

            if status.is_server_error() {
                error!(route_id = ?route_id, error = %err, "route graph build failed");
            } else {
                warn!(route_id = ?route_id, error = %err, "route graph build rejected");
            }

            error_response(status, err.to_string())
        }
    }
}

/// `GET /route-graph/{route_id}`
pub async fn route_graph_links<S: RouteGraphStore + 'static>(
    handler: web::Data<SingleRouteHandler<S>>,
    path: web::Path<String>,
) -> HttpResponse {
    let route_id = path.into_inner();

    match handler.builder().store().fetch_links(&route_id).await {
        Ok(links) => HttpResponse::Ok()
            .insert_header(("Cache-Control", "no-cache"))
            .json(RouteGraphLinksResponse { route_id, links }),
        Err(err) => {
            error!(route_id = %route_id, error = %err, "could not read route graph links");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

pub fn configure<S: RouteGraphStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.route("/route-graph/build", web::post().to(build_route_graph::<S>))
        .route("/route-graph/{route_id}", web::get().to(route_graph_links::<S>));
}
