//! Application startup and lifecycle management.

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lexia_core::error::AppError;
use lexia_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{
        create_ip_rate_limiter, create_unkeyed_rate_limiter, ip_rate_limit_middleware,
        rate_limit_middleware,
    },
    tracing::request_id_middleware,
};

use crate::config::LexiaConfig;
use crate::handlers::{admin, chat, conversations, health, quotas};
use crate::middleware::admin::admin_middleware;
use crate::services::providers::CompletionProvider;
use crate::services::providers::groq::{GroqConfig, GroqProvider};
use crate::services::{
    AdminAuthService, Database, QuotaService, RetrievalService, UserTokenVerifier, create_pool,
    run_migrations,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: LexiaConfig,
    pub db: Database,
    pub provider: Arc<dyn CompletionProvider>,
    pub quota: QuotaService,
    pub retrieval: RetrievalService,
    pub admin_auth: AdminAuthService,
    pub user_tokens: UserTokenVerifier,
    pub metrics_handle: PrometheusHandle,
}

/// Assemble the full router for the given state.
pub fn build_router(state: AppState) -> Router {
    let chat_ip_limiter = create_ip_rate_limiter(
        state.config.rate_limit.chat_ip_limit,
        state.config.rate_limit.chat_ip_window_seconds,
    );
    let admin_login_limiter = create_unkeyed_rate_limiter(
        state.config.rate_limit.admin_login_attempts,
        state.config.rate_limit.admin_login_window_seconds,
    );

    let chat_routes = Router::new()
        .route(
            "/api/chat",
            post(chat::submit_message).get(chat::service_status),
        )
        .route_layer(from_fn_with_state(
            chat_ip_limiter,
            ip_rate_limit_middleware,
        ));

    let admin_protected = Router::new()
        .route("/stats/overview", get(admin::stats_overview))
        .route("/stats/analytics", get(admin::stats_analytics))
        .route("/system/status", get(admin::system_status))
        .route_layer(from_fn_with_state(state.clone(), admin_middleware));

    let admin_public = Router::new()
        .route("/auth", post(admin::login).delete(admin::logout))
        .route_layer(from_fn_with_state(
            admin_login_limiter,
            rate_limit_middleware,
        ));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .merge(chat_routes)
        .route("/api/quotas", get(quotas::get_quotas))
        .route("/api/conversations", get(conversations::list_conversations))
        .route(
            "/api/conversations/:id",
            delete(conversations::delete_conversation),
        )
        .nest("/api/admin", admin_protected.merge(admin_public))
        .layer(cors_layer(&state.config))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

fn cors_layer(config: &LexiaConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: LexiaConfig) -> Result<Self, AppError> {
        let pool = create_pool(&config.database).await.map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e))
        })?;

        run_migrations(&pool).await.map_err(|e| {
            tracing::error!("Failed to run database migrations: {}", e);
            AppError::from(e)
        })?;

        let db = Database::new(pool);

        let provider: Arc<dyn CompletionProvider> = Arc::new(GroqProvider::new(GroqConfig {
            api_key: config.groq.api_key.clone(),
            model: config.groq.model.clone(),
            temperature: config.groq.temperature,
            max_tokens: config.groq.max_tokens,
            base_url: config.groq.base_url.clone(),
        }));

        if provider.is_configured() {
            tracing::info!(model = %config.groq.model, "Initialized Groq completion provider");
        } else {
            tracing::warn!("GROQ_API_KEY not set, chat will answer with setup instructions");
        }

        let quota = QuotaService::new(db.clone(), config.quotas.clone());
        let retrieval = RetrievalService::new(db.clone());
        let admin_auth = AdminAuthService::new(
            &config.security.admin_access_key,
            &config.security.admin_secret_key,
            config.security.admin_session_hours,
        );
        let user_tokens = UserTokenVerifier::new(&config.security.user_jwt_secret);

        let metrics_handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to install metrics recorder: {}", e))
        })?;

        let state = AppState {
            config: config.clone(),
            db,
            provider,
            quota,
            retrieval,
            admin_auth,
            user_tokens,
            metrics_handle,
        };

        // Bind listener (port 0 = random port for testing)
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("LexIA service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        spawn_retention_sweep(self.state.quota.clone());

        let router = build_router(self.state);
        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}

/// Daily retention sweep deleting conversations past the configured age.
fn spawn_retention_sweep(quota: QuotaService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(24 * 60 * 60));
        loop {
            interval.tick().await;
            if let Err(e) = quota.clean_old_conversations().await {
                tracing::warn!(error = %e, "Retention sweep failed");
            }
        }
    });
}
