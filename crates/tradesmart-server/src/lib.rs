//! Webhook ingress, analysis orchestration and HTTP API for TradeSmart.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod routes;

pub use config::AppConfig;
pub use error::{AnalysisError, AppError, AppResult};
pub use orchestrator::AnalysisOrchestrator;
pub use routes::{build_router, AppState};
