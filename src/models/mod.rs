pub mod config;
pub mod grade;
pub mod plan;
pub mod theme;

pub use config::{AppConfig, BackendConfig, BlobStorageConfig, SessionConfig};
pub use grade::{grade_for, Grade};
pub use plan::{quote, BillingCycle, Plan};
pub use theme::normalize_hex_color;
