//! Component builder errors

use skyweave_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("invalid {component} configuration for '{name}': {reason}")]
    InvalidConfig {
        component: &'static str,
        name: String,
        reason: String,
    },

    #[error("failed to register component '{name}': {source}")]
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
}

impl ComponentError {
    pub(crate) fn invalid(
        component: &'static str,
        name: &str,
        reason: impl Into<String>,
    ) -> Self {
        ComponentError::InvalidConfig {
            component,
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn registration(name: &str) -> impl FnOnce(CloudError) -> Self {
        let name = name.to_string();
        move |source| ComponentError::Registration { name, source }
    }

    pub(crate) fn declaration(
        step: &'static str,
        name: impl Into<String>,
    ) -> impl FnOnce(CloudError) -> Self {
        let name = name.into();
        move |source| ComponentError::Declaration { step, name, source }
    }
}

pub type Result<T> = std::result::Result<T, ComponentError>;
