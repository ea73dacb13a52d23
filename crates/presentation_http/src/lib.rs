//! CallTurn HTTP presentation layer
//!
//! Voice webhooks for the telephony provider, the synthesized clip route,
//! call inspection, health and metrics.

pub mod error;
pub mod handlers;
pub mod markup;
pub mod routes;
pub mod shutdown;
pub mod state;

pub use error::ApiError;
pub use handlers::metrics::MetricsCollector;
pub use routes::create_router;
pub use state::AppState;
