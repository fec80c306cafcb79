use crate::api::handlers::{bi, health, tools, workflow, workflows};
use crate::api::middleware::require_api_key;
use crate::AppState;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Routes mounted under the API prefix
pub fn create_router(api_key: Option<Arc<str>>) -> Router<AppState> {
    let routes = Router::new()
        // Coaching sessions
        .route("/workflow/start", post(workflow::start_session))
        .route("/workflow/respond", post(workflow::respond))
        .route("/workflow/confirm", post(workflow::confirm))
        .route(
            "/workflow/status/{session_id}",
            get(workflow::session_status),
        )
        .route(
            "/workflow/analyze/{session_id}",
            get(workflow::analyze_session),
        )
        .route(
            "/workflow/sessions/{session_id}",
            delete(workflow::clear_session),
        )
        // Workflow registry
        .route("/workflows", get(workflows::list_workflows))
        .route(
            "/workflows/{workflow_id}",
            post(workflows::execute_workflow),
        )
        // Business intelligence
        .route("/bi/analyze", post(bi::analyze))
        .route("/bi/health", get(bi::health))
        // Tools
        .route("/tools", get(tools::list_tools))
        .route("/tools/{name}", post(tools::execute_tool));

    match api_key {
        Some(key) => routes.layer(middleware::from_fn_with_state(key, require_api_key)),
        None => routes,
    }
}

/// The complete application: root routes, the API under `prefix`, CORS,
/// request tracing and a body size limit.
pub fn build_router(state: AppState) -> Router {
    let prefix = state.config_manager.config().api.prefix.clone();
    let api = create_router(state.api_key.clone());

    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health));

    let trimmed = prefix.trim_end_matches('/');
    let app = if trimmed.is_empty() {
        app.merge(api)
    } else {
        app.nest(trimmed, api)
    };

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
        )
    };

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
