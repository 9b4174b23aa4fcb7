pub mod advisor;
pub mod data_health;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use data_health::{DataHealthResponse, HealthStatus, SourceHealth};
pub use error::ApiError;
pub use server::ApiServer;
pub use state::{AppState, WindowQuery};
