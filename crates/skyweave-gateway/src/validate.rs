//! Configuration-shape checks
//!
//! Everything here runs before the first declaration so that a bad
//! configuration never leaves a half-built graph behind.

use crate::config::{CompositionConfig, HttpMethod};
use crate::error::ConfigError;
use crate::path_tree::{normalize_path, split_path};
use std::collections::HashSet;

const SEGMENT_PUNCTUATION: &str = "-._~:@";

pub fn validate(config: &CompositionConfig) -> Result<(), ConfigError> {
    require("name", &config.name)?;
    require("stage_name", &config.stage_name)?;
    require("environment", &config.environment)?;

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        check_path(&endpoint.path)?;

        let path = normalize_path(&endpoint.path);
        if config.enable_cors && endpoint.method == HttpMethod::Options {
            return Err(ConfigError::CorsConflict { path });
        }
        if !seen.insert((path.clone(), endpoint.method)) {
            return Err(ConfigError::DuplicateEndpoint {
                method: endpoint.method,
                path,
            });
        }
    }

    match (config.api_key_required, &config.usage_plan) {
        (true, None) => return Err(ConfigError::ApiKeyWithoutUsagePlan),
        (false, Some(_)) => return Err(ConfigError::UsagePlanWithoutApiKey),
        _ => {}
    }

    if let Some(plan) = &config.usage_plan {
        if let Some(quota) = &plan.quota {
            if quota.limit == 0 {
                return Err(ConfigError::InvalidQuota);
            }
        }
        if let Some(throttle) = &plan.throttle {
            if !throttle.rate_limit.is_finite() || throttle.rate_limit < 0.0 {
                return Err(ConfigError::InvalidThrottle(throttle.rate_limit));
            }
        }
    }

    if let Some(domain) = &config.custom_domain {
        require("custom_domain.domain_name", &domain.domain_name)?;
        require("custom_domain.certificate_arn", &domain.certificate_arn)?;
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField(field));
    }
    Ok(())
}

/// Paths are `""` or start with `/`; segments are plain names or a single
/// `{param}` / trailing `{param+}` placeholder.
pub fn check_path(path: &str) -> Result<(), ConfigError> {
    let malformed = |reason: &str| ConfigError::MalformedPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if !path.is_empty() && !path.starts_with('/') {
        return Err(malformed("must start with '/'"));
    }

    let segments = split_path(path);
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let (name, greedy) = match inner.strip_suffix('+') {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(malformed(&format!("invalid parameter segment '{}'", segment)));
            }
            if greedy && i != last {
                return Err(malformed("greedy parameter must be the last segment"));
            }
        } else if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SEGMENT_PUNCTUATION.contains(c))
        {
            return Err(malformed(&format!("invalid segment '{}'", segment)));
        }
    }

    Ok(())
}
