//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MuxConfig (validated, immutable)
//!     → consumed by the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; routes never change while serving
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{DispatchConfig, ListenerConfig, MuxConfig, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ValidationError};
