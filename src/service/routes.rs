//! Axum routes for the element registry service.

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::policy::RegistryConfig;
use crate::predicate::HashPredicate;
use crate::registry::RegistryError;
use crate::snapshot::RegistrySnapshot;
use crate::types::{Element, ElementId, MaintenanceReport, Page, UpkeepCheck};
use crate::REGISTRY_SCHEMA_VERSION;

use super::state::ServiceState;

/// Type alias for the service state with the hash oracle.
pub type AppState = ServiceState<HashPredicate>;

/// `count` used when a paginated request omits it.
pub const DEFAULT_PAGE_COUNT: usize = 50;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Cursor query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CursorQuery {
    /// Slot offset to start from (default 0).
    pub cursor: Option<usize>,
    /// Number of elements requested.
    pub count: Option<usize>,
}

/// Request to perform maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformRequest {
    /// Candidate ids, usually from a prior check.
    pub ids: Vec<ElementId>,
}

/// All elements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementsResponse {
    /// Number of elements.
    pub length: usize,
    /// Elements in order.
    pub elements: Vec<Element>,
}

/// Element count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthResponse {
    /// Number of elements.
    pub length: usize,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub schema_version: String,
    pub length: usize,
    pub target_size: usize,
    pub within_tolerance: bool,
    pub snapshot_id: String,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Structured error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code.
    pub code: String,
    /// Additional error details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response with code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Add details to the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: ErrorResponse) -> ApiError {
    tracing::warn!(
        status = status.as_u16(),
        code = %error.code,
        error = %error.error,
        "Request error"
    );
    (status, Json(error))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Every element, unpaginated.
async fn all_elements_handler(State(state): State<Arc<AppState>>) -> Json<ElementsResponse> {
    let elements = state.registry.get_all_elements();
    Json(ElementsResponse {
        length: elements.len(),
        elements,
    })
}

/// Number of elements.
async fn length_handler(State(state): State<Arc<AppState>>) -> Json<LengthResponse> {
    Json(LengthResponse {
        length: state.registry.get_all_elements_length(),
    })
}

/// One page of elements.
async fn page_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CursorQuery>,
) -> Json<Page> {
    let cursor = query.cursor.unwrap_or(0);
    let count = query.count.unwrap_or(DEFAULT_PAGE_COUNT);
    Json(state.registry.get_elements_page(cursor, count))
}

/// One element by id.
async fn element_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ElementId>,
) -> Result<Json<Element>, ApiError> {
    state.registry.get_element(id).map(Json).map_err(|e| match e {
        RegistryError::NotFound(id) => api_error(
            StatusCode::NOT_FOUND,
            ErrorResponse::new("ELEMENT_NOT_FOUND", format!("Element not found: {}", id)),
        ),
    })
}

/// Scan one window for closable elements.
async fn check_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CursorQuery>,
) -> Json<UpkeepCheck> {
    let cursor = query.cursor.unwrap_or(0);
    let count = query.count.unwrap_or_else(|| state.registry.config().batch_limit);
    Json(state.registry.check_maintenance(cursor, count))
}

/// Close and replenish.
async fn perform_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PerformRequest>,
) -> Result<Json<MaintenanceReport>, ApiError> {
    if request.ids.len() > state.max_perform_ids() {
        return Err(api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new(
                "BATCH_TOO_LARGE",
                format!(
                    "Request carries {} ids, limit is {}",
                    request.ids.len(),
                    state.max_perform_ids()
                ),
            )
            .with_details("Submit the candidate_ids of a single check"),
        ));
    }

    Ok(Json(state.registry.perform_maintenance(&request.ids)))
}

/// Registry configuration.
async fn config_handler(State(state): State<Arc<AppState>>) -> Json<RegistryConfig> {
    Json(state.registry.config())
}

/// Registry snapshot.
async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<RegistrySnapshot> {
    Json(state.registry.snapshot())
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.registry.config();
    let snapshot = state.registry.snapshot();
    let within_tolerance = config.within_tolerance(snapshot.length);

    Json(HealthResponse {
        status: if within_tolerance { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: REGISTRY_SCHEMA_VERSION.to_string(),
        length: snapshot.length,
        target_size: config.target_size,
        within_tolerance,
        snapshot_id: snapshot.snapshot_id,
    })
}

/// Liveness probe endpoint.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the element registry service.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Reads
        .route("/api/elements", get(all_elements_handler))
        .route("/api/elements/length", get(length_handler))
        .route("/api/elements/page", get(page_handler))
        .route("/api/elements/:id", get(element_handler))
        // Maintenance
        .route("/api/maintenance/check", get(check_handler))
        .route("/api/maintenance/perform", post(perform_handler))
        // Introspection
        .route("/api/config", get(config_handler))
        .route("/api/snapshot", get(snapshot_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(health_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ElementRegistry, SharedRegistry};
    use axum::body::Body;
    use axum::http::Request;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app(probability: f64, max_perform_ids: usize) -> Router {
        let predicate = HashPredicate::new(7, probability).unwrap();
        let registry = ElementRegistry::new(RegistryConfig::default(), predicate).unwrap();
        create_router(ServiceState::with_max_perform_ids(
            SharedRegistry::new(registry),
            max_perform_ids,
        ))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_length_and_page() {
        let (status, length): (_, LengthResponse) = get_json(app(0.5, 100), "/api/elements/length").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(length.length, 100);

        let (_, page): (_, Page) = get_json(app(0.5, 100), "/api/elements/page?cursor=98&count=5").await;
        assert_eq!(page.elements.len(), 2);
        assert_eq!(page.next_cursor, 0);
    }

    #[tokio::test]
    async fn test_element_not_found() {
        let (status, error): (_, ErrorResponse) = get_json(app(0.5, 100), "/api/elements/1000").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error.code, "ELEMENT_NOT_FOUND");

        let (status, element): (_, Element) = get_json(app(0.5, 100), "/api/elements/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(element.id, ElementId::new(3));
    }

    #[tokio::test]
    async fn test_check_then_perform() {
        let app = app(1.0, 100);

        let (_, check): (_, UpkeepCheck) = get_json(app.clone(), "/api/maintenance/check?cursor=0&count=100").await;
        assert_eq!(check.candidate_ids.len(), 10);
        assert_eq!(check.next_cursor, 10);

        let body = serde_json::to_vec(&PerformRequest { ids: check.candidate_ids.clone() }).unwrap();
        let request = Request::post("/api/maintenance/perform")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        let report: MaintenanceReport = serde_json::from_slice(&body).unwrap();
        assert_eq!(report.closed, check.candidate_ids);
        assert_eq!(report.length_after, 100);

        let (status, _): (_, ErrorResponse) = get_json(app, "/api/elements/0").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_perform_rejects_oversized_request() {
        let ids: Vec<ElementId> = (0..5).map(ElementId::new).collect();
        let body = serde_json::to_vec(&PerformRequest { ids }).unwrap();
        let request = Request::post("/api/maintenance/perform")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(app(1.0, 4), request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.code, "BATCH_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, health): (_, HealthResponse) = get_json(app(0.0, 100), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "healthy");
        assert!(health.within_tolerance);
        assert_eq!(health.length, 100);
    }
}
