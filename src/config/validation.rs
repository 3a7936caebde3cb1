//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse and limits are non-zero
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MuxConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::MuxConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &MuxConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.max_sessions == 0 {
        errors.push(ValidationError::new("listener.max_sessions", "must be greater than 0"));
    }
    if config.listener.max_message_bytes == 0 {
        errors.push(ValidationError::new("listener.max_message_bytes", "must be greater than 0"));
    }
    if config.dispatch.max_in_flight_per_session == Some(0) {
        errors.push(ValidationError::new(
            "dispatch.max_in_flight_per_session",
            "must be greater than 0 (omit for unbounded)",
        ));
    }
    if config.shutdown.drain_in_flight && config.shutdown.drain_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "shutdown.drain_timeout_secs",
            "must be greater than 0 when drain_in_flight is enabled",
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&MuxConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = MuxConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.max_sessions = 0;
        config.dispatch.max_in_flight_per_session = Some(0);
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "listener.max_sessions",
                "dispatch.max_in_flight_per_session",
                "observability.metrics_address",
            ]
        );
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = MuxConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());
    }
}
