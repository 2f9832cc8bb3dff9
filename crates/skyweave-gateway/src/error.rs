//! Gateway composition errors

use crate::config::HttpMethod;
use skyweave_cloud::CloudError;
use thiserror::Error;

/// Errors raised while composing an API front-end
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("invalid configuration for API '{name}': {source}")]
    InvalidConfig {
        name: String,
        #[source]
        source: ConfigError,
    },

    #[error("failed to register API component '{name}': {source}")]
    Registration {
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("failed to create {step} '{name}': {source}")]
    Declaration {
        step: &'static str,
        name: String,
        #[source]
        source: CloudError,
    },

    #[error("failed to wire endpoint {method} {path}: {source}")]
    Endpoint {
        method: HttpMethod,
        path: String,
        #[source]
        source: Box<GatewayError>,
    },
}

impl GatewayError {
    pub(crate) fn declaration(
        step: &'static str,
        name: impl Into<String>,
    ) -> impl FnOnce(CloudError) -> Self {
        let name = name.into();
        move |source| GatewayError::Declaration { step, name, source }
    }
}

/// Configuration-shape errors, detected before anything is declared
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("malformed path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("duplicate endpoint {method} {path}")]
    DuplicateEndpoint { method: HttpMethod, path: String },

    #[error("api_key_required is set but no usage_plan is configured")]
    ApiKeyWithoutUsagePlan,

    #[error("usage_plan is configured but api_key_required is not set")]
    UsagePlanWithoutApiKey,

    #[error("OPTIONS {path} conflicts with the CORS preflight method")]
    CorsConflict { path: String },

    #[error("usage plan quota limit must be greater than zero")]
    InvalidQuota,

    #[error("usage plan throttle rate must be a non-negative number, got {0}")]
    InvalidThrottle(f64),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
