pub mod config;
pub mod error;
pub mod sampling;
pub mod service;

pub use config::GeneratorConfig;
pub use service::generate_to_file;
