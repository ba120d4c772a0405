pub mod config;
pub mod logger;
pub mod session;

// Re-export commonly used functions at the modules namespace level
pub use config::*;
pub use logger::*;
