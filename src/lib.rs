pub mod error;
pub mod models;
pub mod sources;
pub mod merge;
pub mod interpolate;
pub mod loader;
pub mod configuration;
pub mod reporting;

// Re-export commonly used items
pub use error::ConfigError;
pub use models::*;
pub use sources::*;
pub use loader::ConfigLoader;
pub use configuration::ZapConfiguration;
pub use reporting::*;
