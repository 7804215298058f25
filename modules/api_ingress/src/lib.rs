//! HTTP host: mounts module routers under `/api`, serves the health probe
//! and the OpenAPI document, and wraps everything in the shared middleware
//! stack.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::header,
    middleware::from_fn,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use modkit::RestfulModule;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod openapi;
pub mod request_id;
pub mod web;

pub use config::ApiIngressConfig;

/// Collects REST modules and turns them into one router.
pub struct ApiIngress {
    config: ApiIngressConfig,
    modules: Vec<Arc<dyn RestfulModule>>,
}

impl ApiIngress {
    pub const NAME: &'static str = "api_ingress";

    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            modules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: Arc<dyn RestfulModule>) -> Self {
        self.modules.push(module);
        self
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    pub fn build_openapi(&self) -> utoipa::openapi::OpenApi {
        openapi::build_openapi(&self.modules)
    }

    /// Build the HTTP router from the registered modules.
    pub fn build_router(&self) -> Result<Router> {
        let mut api = Router::new().route("/health", get(web::health_check));

        for module in &self.modules {
            tracing::debug!(module = module.name(), "registering REST routes");
            api = module
                .register_rest(api)
                .with_context(|| format!("module '{}' failed to register routes", module.name()))?;
        }

        // Built once, served as a static value.
        let doc = Arc::new(
            serde_json::to_value(self.build_openapi()).context("failed to render OpenAPI")?,
        );
        api = api.route(
            "/openapi.json",
            get(move || {
                let doc = doc.clone();
                async move { ([(header::CACHE_CONTROL, "no-store")], Json((*doc).clone())).into_response() }
            }),
        );

        let router = Router::new()
            .nest("/api", api)
            .fallback(web::not_found);

        Ok(self.apply_layers(router))
    }

    /// Middleware order, outermost first:
    /// SetRequestId -> PropagateRequestId -> Trace -> request id into extensions/span
    /// -> problem request id -> CORS -> Timeout -> BodyLimit
    fn apply_layers(&self, router: Router) -> Router {
        let x_request_id = request_id::header();
        let cors = self.config.cors_enabled.then(CorsLayer::permissive);

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    request_id::MakeReqId,
                ))
                .layer(PropagateRequestIdLayer::new(x_request_id))
                .layer(request_id::create_trace_layer())
                .layer(from_fn(request_id::push_req_id_to_extensions))
                .layer(from_fn(request_id::stamp_problem_request_id))
                .option_layer(cors)
                .layer(TimeoutLayer::new(Duration::from_secs(
                    self.config.request_timeout_secs,
                )))
                .map_response(IntoResponse::into_response)
                .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes)),
        )
    }

    /// Bind `addr` and serve until `cancel` fires.
    pub async fn serve(&self, addr: SocketAddr, cancel: CancellationToken) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        self.serve_on(listener, cancel).await
    }

    /// Serve on an already-bound listener until `cancel` fires.
    pub async fn serve_on(&self, listener: TcpListener, cancel: CancellationToken) -> Result<()> {
        let router = self.build_router()?;
        let addr = listener.local_addr()?;
        tracing::info!("HTTP server bound on {}", addr);

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
