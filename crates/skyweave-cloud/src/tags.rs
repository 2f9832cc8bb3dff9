//! Tag defaults shared by every builder

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value of the `ManagedBy` tag unless a builder overrides it
pub const MANAGED_BY: &str = "skyweave";

pub const ENVIRONMENT_TAG: &str = "Environment";
pub const MANAGED_BY_TAG: &str = "ManagedBy";

/// Resource tags, ordered so that serialized declarations are deterministic
pub type Tags = BTreeMap<String, String>;

/// Tags every resource receives before user overrides are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDefaults {
    pub environment: String,
    pub managed_by: String,
}

impl TagDefaults {
    pub fn for_environment(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            managed_by: MANAGED_BY.to_string(),
        }
    }
}

/// Merge user-supplied tags over the defaults.
///
/// Overrides win on every key collision, `Environment` and `ManagedBy`
/// included.
pub fn merge_tags(defaults: &TagDefaults, overrides: &Tags) -> Tags {
    let mut tags = Tags::new();
    tags.insert(ENVIRONMENT_TAG.to_string(), defaults.environment.clone());
    tags.insert(MANAGED_BY_TAG.to_string(), defaults.managed_by.clone());
    for (key, value) in overrides {
        tags.insert(key.clone(), value.clone());
    }
    tags
}
