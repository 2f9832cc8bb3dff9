//! Deployment target shared by every composition in a run

use serde::{Deserialize, Serialize};

/// Region and account the apply engine deploys into.
///
/// Builders only interpolate these into ARNs and URLs; nothing here is
/// validated against the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContext {
    pub region: String,
    pub account: String,
}

impl ProviderContext {
    pub fn new(region: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: account.into(),
        }
    }
}
