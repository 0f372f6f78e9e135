mod config;
pub mod error;

pub use config::ClientConfig;
pub use config::ProviderSettings;
pub use config::StreamEndPolicy;
pub use error::ChatError;
