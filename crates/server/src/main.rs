use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shared::protocol::{DependentRecord, ErrorBody, ParentRecord};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{ApiContext, LookupRejection};
use app_state::AppState;
use config::{load_catalog, load_settings};

#[derive(Debug, Deserialize)]
struct DependentsQuery {
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParentQuery {
    dependent_id: Option<String>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings();
    let catalog = load_catalog(&settings.catalog_path).map_err(|error| {
        error!(
            catalog_path = %settings.catalog_path,
            %error,
            "failed to load catalog; set APP__CATALOG_PATH or catalog_path in lookup.toml"
        );
        error
    })?;
    info!(
        parents = catalog.parents.len(),
        dependents = catalog.dependents.len(),
        "catalog loaded"
    );

    let state = AppState {
        api: ApiContext {
            catalog: Arc::new(catalog),
        },
    };
    let app = build_router(Arc::new(state), &settings.alias_prefixes);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, aliases = ?settings.alias_prefixes, "lookup server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, alias_prefixes: &[String]) -> Router {
    let lookups: Router<Arc<AppState>> = Router::new()
        .route("/lookup-dependents", get(http_lookup_dependents))
        .route("/lookup-parent", get(http_lookup_parent));

    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .merge(lookups.clone());
    for prefix in alias_prefixes {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            continue;
        }
        router = router.nest(&format!("/{prefix}"), lookups.clone());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_lookup_dependents(
    State(state): State<Arc<AppState>>,
    Query(q): Query<DependentsQuery>,
) -> ApiResult<Vec<DependentRecord>> {
    let records = api::lookup_dependents(&state.api, q.parent_id.as_deref()).map_err(reject)?;
    debug!(parent_id = ?q.parent_id, count = records.len(), "dependents lookup served");
    Ok(Json(records))
}

async fn http_lookup_parent(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ParentQuery>,
) -> ApiResult<ParentRecord> {
    let record = api::lookup_parent(&state.api, q.dependent_id.as_deref()).map_err(reject)?;
    debug!(dependent_id = ?q.dependent_id, parent = ?record.id, "parent lookup served");
    Ok(Json(record))
}

fn reject(rejection: LookupRejection) -> (StatusCode, Json<ErrorBody>) {
    let status = match rejection {
        LookupRejection::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        LookupRejection::UnknownDependent(_) => StatusCode::NOT_FOUND,
    };
    (status, Json(rejection.body()))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
