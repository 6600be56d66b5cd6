//! # Server Configuration
//!
//! Router assembly, shared state and the serve loop for the Rental
//! Management service.

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::get,
};
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::signal;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::antiforgery::{AntiforgeryKey, antiforgery_middleware};
use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers::{self, maintenance_requests as requests, order_details};
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub antiforgery: AntiforgeryKey,
}

impl FromRef<AppState> for AntiforgeryKey {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.antiforgery.clone()
    }
}

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid server address: {0}")]
    InvalidBindAddr(#[from] std::net::AddrParseError),
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Layers run bottom-up: auth establishes the caller before anti-forgery checks it
    let protected = Router::new()
        .route("/maintenance-requests", get(requests::list_requests))
        .route(
            "/maintenance-requests/create",
            get(requests::create_form).post(requests::create_request),
        )
        .route("/maintenance-requests/{id}", get(requests::request_details))
        .route(
            "/maintenance-requests/{id}/edit",
            get(requests::edit_form).post(requests::edit_request),
        )
        .route(
            "/maintenance-requests/{id}/delete",
            get(requests::delete_form).post(requests::delete_request),
        )
        .route("/order-details", get(order_details::order_details))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            antiforgery_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Serves the application until Ctrl+C or SIGTERM
pub async fn run_server(config: Arc<AppConfig>, db: DatabaseConnection) -> anyhow::Result<()> {
    let antiforgery = AntiforgeryKey::from_config(&config)?;
    let addr = config.bind_addr().map_err(ServerError::from)?;

    let state = AppState {
        config: Arc::clone(&config),
        db,
        antiforgery,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServerError::from)?;
    tracing::info!(%addr, profile = %config.profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::from)?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("ctrl_c signal received"),
        _ = terminate => tracing::info!("terminate signal received"),
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::maintenance_requests::list_requests,
        crate::handlers::maintenance_requests::request_details,
        crate::handlers::maintenance_requests::create_form,
        crate::handlers::maintenance_requests::create_request,
        crate::handlers::maintenance_requests::edit_form,
        crate::handlers::maintenance_requests::edit_request,
        crate::handlers::maintenance_requests::delete_form,
        crate::handlers::maintenance_requests::delete_request,
        crate::handlers::order_details::order_details,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::handlers::HealthStatus,
            crate::error::ApiError,
            crate::workflow::Redirect,
            crate::workflow::FieldErrors,
            crate::workflow::maintenance::RequestView,
            crate::workflow::maintenance::IndexModel,
            crate::workflow::maintenance::AssetRequestTally,
            crate::workflow::maintenance::SelectOption,
            crate::workflow::maintenance::CreateRequestForm,
            crate::workflow::maintenance::CreateFormModel,
            crate::workflow::maintenance::EditRequestForm,
            crate::handlers::order_details::OrderDetailsModel,
            crate::roles::Role,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "maintenance-requests", description = "Maintenance request workflow"),
        (name = "order-details", description = "Tenant order details"),
    ),
    info(
        title = "Rental Management API",
        description = "Maintenance request workflow for rental properties",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
