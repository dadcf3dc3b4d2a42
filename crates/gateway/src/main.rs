//! ReasonForge API Gateway
//!
//! The HTTP entry point for the orchestration engine.
//! Handles:
//! - Request validation
//! - Rate limiting
//! - Request routing
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use middleware::{rate_limit_middleware, RateLimit};
use reasonforge_common::{
    config::AppConfig,
    engine::Engine,
    llm::HttpModelProvider,
    metrics,
    retrieval::{ChunkingConfig, InMemoryRetriever},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<Engine>,
    pub documents: Arc<InMemoryRetriever>,
}

impl AppState {
    fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let documents = Arc::new(InMemoryRetriever::new(ChunkingConfig {
            chunk_size: config.retrieval.chunk_size,
            chunk_overlap: config.retrieval.chunk_overlap,
        }));
        let provider = Arc::new(HttpModelProvider::new(config.llm.clone())?);
        let engine = Engine::new(provider, documents.clone(), config.orchestration.clone());

        Ok(Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            documents,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    init_tracing(&config);

    info!("Starting ReasonForge API Gateway v{}", reasonforge_common::VERSION);

    if let Err(problems) = config.validate() {
        for problem in problems {
            warn!(problem = %problem, "Configuration problem");
        }
    }

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState::new(config)?;
    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let mut api_routes = Router::new()
        .route("/health", get(handlers::health::health))

        // Conversation and structured reasoning
        .route("/chat", post(handlers::chat::chat))
        .route("/reasoning", post(handlers::reasoning::reason))
        .route("/reasoning/decision", post(handlers::reasoning::decide))
        .route("/reasoning/analysis", post(handlers::reasoning::analyze))
        .route("/code/generate", post(handlers::code::generate))

        // Retrieval-augmented answering
        .route("/rag/query", post(handlers::rag::query))
        .route("/rag/multi-hop", post(handlers::rag::multi_hop))

        // Tool-using agent
        .route("/agent/execute", post(handlers::agent::execute))

        // Document index
        .route(
            "/documents",
            post(handlers::documents::upload).get(handlers::documents::list),
        )
        .route(
            "/documents/{id}",
            axum::routing::delete(handlers::documents::delete),
        );

    if state.config.rate_limit.enabled {
        let limit = RateLimit::new(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        api_routes = api_routes.layer(from_fn_with_state(limit, rate_limit_middleware));
    }

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .fallback(handlers::not_found)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use reasonforge_common::llm::{ScriptedModel, ScriptedProvider};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(replies: Vec<Value>, rate_limit_enabled: bool) -> AppState {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = rate_limit_enabled;
        config.rate_limit.requests_per_second = 1;
        config.rate_limit.burst = 1;

        let documents = Arc::new(InMemoryRetriever::new(ChunkingConfig::default()));
        let provider = Arc::new(ScriptedProvider::new(Arc::new(ScriptedModel::new(replies))));
        let engine = Engine::new(provider, documents.clone(), config.orchestration.clone());

        AppState {
            config: Arc::new(config),
            engine: Arc::new(engine),
            documents,
        }
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state(vec![], false));
        let response = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["documents_indexed"], 0);
    }

    #[tokio::test]
    async fn test_chat_roundtrip() {
        let app = create_router(test_state(
            vec![json!({"answer": "Hello there", "rationale": "Greeting"})],
            false,
        ));
        let response = app
            .oneshot(post_json("/v1/chat", json!({"message": "Hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Hello there");
        assert_eq!(body["model"], "scripted/default");
    }

    #[tokio::test]
    async fn test_validation_rejected() {
        let app = create_router(test_state(vec![], false));
        let response = app
            .oneshot(post_json("/v1/chat", json!({"message": ""})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let state = test_state(vec![], false);
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json(
                "/v1/documents",
                json!({"title": "Notes", "content": "Rust ownership rules keep memory safe."}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let uploaded = body_json(response).await;
        let id = uploaded["document_id"].as_str().unwrap().to_string();
        assert_eq!(uploaded["chunks_created"], 1);

        let response = app
            .clone()
            .oneshot(Request::get("/v1/documents").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed["total_count"], 1);

        let response = app
            .clone()
            .oneshot(
                Request::delete(format!("/v1/documents/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Deleted 1 chunks");

        let response = app
            .oneshot(
                Request::delete(format!("/v1/documents/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_structured_404() {
        let app = create_router(test_state(vec![], false));
        let response = app
            .oneshot(Request::get("/v1/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(
            body["error"]["message"],
            "Resource not found: route with id /v1/missing"
        );
    }

    #[tokio::test]
    async fn test_rate_limit_applies() {
        let app = create_router(test_state(vec![], true));

        let first = app
            .clone()
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(Request::get("/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
