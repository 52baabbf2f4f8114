//! Element Registry REST Service
//!
//! ## Endpoints
//!
//! - `GET /api/elements` - All elements
//! - `GET /api/elements/length` - Element count
//! - `GET /api/elements/page?cursor&count` - One page of elements
//! - `GET /api/elements/:id` - One element
//! - `GET /api/maintenance/check?cursor&count` - Scan one window for closable elements
//! - `POST /api/maintenance/perform` - Close and replenish
//! - `GET /api/config` - Registry parameters
//! - `GET /api/snapshot` - Registry state fingerprint
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{metrics_middleware, normalize_path};
pub use routes::{create_router, AppState};
pub use state::ServiceState;
