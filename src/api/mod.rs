//! HTTP API Handlers and Routes
//!
//! The REST API layer for Insight, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::middleware`](crate::api::middleware) - API key check
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! Paths below use the default `/api/v1` prefix (`[api] prefix` in insight.toml).
//!
//! ## Coaching sessions (`/api/v1/workflow`)
//! - `POST /api/v1/workflow/start` - Start a session with a problem statement
//! - `POST /api/v1/workflow/respond` - Answer the coach
//! - `POST /api/v1/workflow/confirm` - Confirm the summary and generate a plan
//! - `GET /api/v1/workflow/status/{session_id}` - Session status
//! - `GET /api/v1/workflow/analyze/{session_id}` - Interaction summary
//! - `DELETE /api/v1/workflow/sessions/{session_id}` - Clear a session
//!
//! ## Workflows (`/api/v1/workflows`)
//! - `GET /api/v1/workflows` - List registered workflows
//! - `POST /api/v1/workflows/{workflow_id}` - Run a workflow
//!
//! ## Business intelligence (`/api/v1/bi`)
//! - `POST /api/v1/bi/analyze` - Analyst interpretation of a dataset
//! - `GET /api/v1/bi/health` - Analyst availability
//!
//! ## Tools (`/api/v1/tools`)
//! - `GET /api/v1/tools` - List enabled tools
//! - `POST /api/v1/tools/{name}` - Run a tool
//!
//! ## Health
//! - `GET /` - Welcome message
//! - `GET /health` - Health check endpoint
//!
//! # Authentication
//!
//! When `[api] api_key_env` is set, every prefixed endpoint requires the key
//! in the `x-api-key` header. `/` and `/health` stay open.
//!
//! # OpenAPI Documentation
//!
//! When the `swagger-ui` feature is enabled, interactive API documentation
//! is available at `/swagger-ui/`.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// API key middleware.
pub mod middleware;
/// Router configuration and route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI description of the HTTP surface
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::workflow::start_session,
        handlers::workflow::respond,
        handlers::workflow::confirm,
        handlers::workflow::session_status,
        handlers::workflow::analyze_session,
        handlers::workflow::clear_session,
        handlers::workflows::list_workflows,
        handlers::workflows::execute_workflow,
        handlers::bi::analyze,
        handlers::bi::health,
        handlers::tools::list_tools,
        handlers::tools::execute_tool,
        handlers::health::health,
    ),
    components(schemas(
        crate::types::StartSessionRequest,
        crate::types::RespondRequest,
        crate::types::ConfirmRequest,
        crate::types::SessionReply,
        crate::types::ConfirmResponse,
        crate::types::RunWorkflowRequest,
        crate::types::AnalysisRequest,
        crate::types::AnalysisResponse,
        crate::types::ReplyStatus,
        crate::types::ToolDefinition,
        crate::workflows::WorkflowInfo,
        crate::workflows::WorkflowState,
        crate::workflows::WorkflowStep,
    )),
    tags(
        (name = "workflow", description = "Coaching sessions"),
        (name = "workflows", description = "Registered workflows"),
        (name = "business-intelligence", description = "Data analysis by the BI analyst"),
        (name = "tools", description = "Analysis tools"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
