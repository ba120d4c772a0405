pub mod error;
pub mod models;
pub mod modules;
pub mod proxy; // Gateway service

pub use error::{AppError, AppResult};
pub use models::AppConfig;
pub use proxy::{build_router, AppState, AxumServer};
