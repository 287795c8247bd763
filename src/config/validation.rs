//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that every rewrite pattern compiles
//! - Validate addresses and value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use regex::bytes::Regex;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: expected host:port, got {value:?}")]
    InvalidAuthority { field: &'static str, value: String },

    #[error("rewrite.rewrites[{index}]: invalid regex {pattern:?}: {reason}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        reason: String,
    },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_authority(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.upstream.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "upstream.request_timeout_secs",
        });
    }

    for (index, spec) in config.rewrite.rewrites.iter().enumerate() {
        if let Err(e) = Regex::new(&spec.regex) {
            errors.push(ValidationError::InvalidPattern {
                index,
                pattern: spec.regex.clone(),
                reason: e.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

/// Upstreams may be named hosts; the proxy client resolves them.
fn check_authority(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let has_port = value
        .parse::<Authority>()
        .is_ok_and(|authority| authority.port_u16().is_some());
    if !has_port {
        errors.push(ValidationError::InvalidAuthority {
            field,
            value: value.to_string(),
        });
    }
}
