use crate::error::AppResult;
use crate::models::AppConfig;
use crate::proxy::engine::{self, InboundRequest};
use crate::proxy::routes::{self, Endpoint};
use crate::proxy::upstream::UpstreamClient;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Json, Response},
    routing::{get, on, post, MethodFilter, MethodRouter},
    Router,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Axum application state. Read-only once the server has started.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let upstream = UpstreamClient::new(
            config.proxy.request_timeout,
            Some(config.proxy.upstream_proxy.clone()),
        )?;
        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
        })
    }
}

fn method_filter(method: &Method) -> MethodFilter {
    match *method {
        Method::POST => MethodFilter::POST,
        Method::PUT => MethodFilter::PUT,
        Method::PATCH => MethodFilter::PATCH,
        Method::DELETE => MethodFilter::DELETE,
        _ => MethodFilter::GET,
    }
}

/// Axum handler for one endpoint row
fn endpoint_route(endpoint: &'static Endpoint, router: Option<MethodRouter<AppState>>) -> MethodRouter<AppState> {
    let handler = move |State(state): State<AppState>,
                        params: Option<Path<HashMap<String, String>>>,
                        Query(query): Query<HashMap<String, String>>,
                        headers: HeaderMap,
                        body: Bytes| async move {
        let inbound = InboundRequest {
            params: params.map(|Path(p)| p).unwrap_or_default(),
            query,
            headers,
            body,
        };
        engine::dispatch(&state, endpoint, inbound).await
    };

    let filter = method_filter(&endpoint.method);
    match router {
        Some(existing) => existing.on(filter, handler),
        None => on(filter, handler),
    }
}

/// Build the full router: table endpoints, local handlers and layers
pub fn build_router(state: AppState) -> Router {
    use crate::proxy::handlers;

    // Rows sharing an inbound path are merged into one method router
    let mut table: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for endpoint in routes::endpoints() {
        let existing = table.remove(endpoint.path);
        table.insert(endpoint.path, endpoint_route(endpoint, existing));
    }

    let body_limit = state.config.proxy.body_limit;
    let mut app = Router::new()
        .route("/api/auth/logout", post(handlers::auth::handle_logout))
        .route("/api/auth/session", get(handlers::auth::handle_session_status))
        .route("/api/upload", post(handlers::upload::handle_upload))
        .route("/healthz", get(health_check_handler));
    for (path, method_router) in table {
        app = app.route(path, method_router);
    }

    app.fallback(handlers::auth::handle_not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            crate::proxy::middleware::request_log_middleware,
        ))
        .layer(crate::proxy::middleware::cors_layer())
        .with_state(state)
}

/// Axum server instance
pub struct AxumServer {
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl AxumServer {
    /// Start Axum server
    pub async fn start(
        host: String,
        port: u16,
        state: AppState,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), String> {
        if state.config.backend.url.is_none() {
            tracing::warn!("MAIN_BACKEND_URL is not set; proxied routes will answer 500");
        }

        let app = build_router(state);

        // Bind address
        let addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| format!("Failed to bind address {}: {}", addr, e))?;

        tracing::info!(
            "Gateway started at http://{} ({} proxied routes)",
            addr,
            routes::endpoints().len()
        );

        // Create shutdown channel
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let server_instance = Self {
            shutdown_tx: Some(shutdown_tx),
        };

        // Start server in new task
        let handle = tokio::spawn(async move {
            use hyper::server::conn::http1;
            use hyper_util::rt::TokioIo;
            use hyper_util::service::TowerToHyperService;

            loop {
                tokio::select! {
                    res = listener.accept() => {
                        match res {
                            Ok((stream, _)) => {
                                let io = TokioIo::new(stream);
                                let service = TowerToHyperService::new(app.clone());

                                tokio::task::spawn(async move {
                                    if let Err(err) = http1::Builder::new()
                                        .serve_connection(io, service)
                                        .await
                                    {
                                        debug!("Connection handling finished or errored: {:?}", err);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Failed to accept connection: {:?}", e);
                            }
                        }
                    }
                    _ = &mut shutdown_rx => {
                        tracing::info!("Gateway stopped listening");
                        break;
                    }
                }
            }
        });

        Ok((server_instance, handle))
    }

    /// Stop server
    pub fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Health check handler
async fn health_check_handler() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
