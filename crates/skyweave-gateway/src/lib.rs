//! Skyweave Gateway
//!
//! Composes a REST API front-end out of an endpoint list: a shared resource
//! tree, one method/integration/permission set per endpoint, the optional
//! authorizer, API key, usage plan and custom domain, and a deployment that
//! is replaced whenever the endpoint set changes.
//!
//! ```text
//! CompositionConfig
//!   → validate          (configuration errors, nothing declared yet)
//!   → merge_tags
//!   → PathTree          (one node per cumulative path)
//!   → wiring::wire      (method, integration, permission, CORS pair)
//!   → features          (authorizer, usage plan, custom domain)
//!   → deployment        (fingerprint trigger, stage)
//!   → outputs
//! ```

pub mod config;
pub mod deployment;
pub mod error;
pub mod features;
pub mod gateway;
pub mod outputs;
pub mod path_tree;
pub mod validate;
pub mod wiring;

// Re-exports
pub use config::{
    AuthMode, CompositionConfig, CustomDomainConfig, EndpointConfig, HandlerRef, HttpMethod,
    QuotaConfig, QuotaPeriod, ThrottleConfig, UsagePlanConfig,
};
pub use deployment::DeploymentFingerprint;
pub use error::{ConfigError, GatewayError, Result};
pub use features::{DomainBinding, UsagePlanBinding};
pub use gateway::ApiGateway;
pub use outputs::GatewayOutputs;
pub use path_tree::{PathNode, PathTree, normalize_path, split_path};
pub use wiring::{CorsPair, WiredEndpoint};
