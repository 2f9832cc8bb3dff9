//! Deployment trigger and stage

use crate::config::EndpointConfig;
use crate::error::{GatewayError, Result};
use crate::path_tree::normalize_path;
use serde_json::json;
use sha2::{Digest, Sha256};
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, Tags, kinds};
use std::fmt;

/// Change fingerprint of an endpoint set.
///
/// Every endpoint is reduced to a normalized tuple and serialized on its own;
/// the serialized tuples are sorted before hashing, so input order and path
/// spelling (`/users/` vs `/users`) do not affect the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentFingerprint(String);

fn endpoint_tuple(endpoint: &EndpointConfig) -> String {
    json!({
        "path": normalize_path(&endpoint.path),
        "method": endpoint.method.as_str(),
        "authorization": endpoint.authorization.as_str(),
        "api_key_required": endpoint.api_key_required,
        "function_name": endpoint.handler.function_name(),
        "invoke_arn": endpoint.handler.invoke_arn(),
        "request_parameters": endpoint.request_parameters,
        "request_models": endpoint.request_models,
    })
    .to_string()
}

impl DeploymentFingerprint {
    pub fn compute(endpoints: &[EndpointConfig], enable_cors: bool) -> Self {
        let mut tuples: Vec<String> = endpoints.iter().map(endpoint_tuple).collect();
        tuples.sort_unstable();

        let mut hasher = Sha256::new();
        for tuple in &tuples {
            hasher.update(tuple.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(format!("cors={}", enable_cors).as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeploymentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declare the deployment after every endpoint node it publishes.
///
/// `inputs` must hold every method and integration of the endpoint set;
/// each one becomes a direct dependency.
pub fn declare_deployment(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    api: &NodeRef,
    api_name: &str,
    fingerprint: &DeploymentFingerprint,
    inputs: &[&NodeRef],
) -> Result<NodeRef> {
    let name = format!("{}-deployment", api_name);
    let mut declaration = Declaration::new(kinds::DEPLOYMENT, &name)
        .parent(component)
        .reference("rest_api", api, "id")
        .property("triggers", json!({ "redeployment": fingerprint.as_str() }));
    for input in inputs {
        declaration = declaration.depends_on(input);
    }

    let deployment = graph
        .declare(declaration)
        .map_err(GatewayError::declaration("deployment", &name))?;
    tracing::debug!(%fingerprint, inputs = inputs.len(), "declared deployment");
    Ok(deployment)
}

/// Bind `deployment` to the named stage
pub fn declare_stage(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    api: &NodeRef,
    deployment: &NodeRef,
    api_name: &str,
    stage_name: &str,
    tags: &Tags,
) -> Result<NodeRef> {
    let name = format!("{}-stage", api_name);
    graph
        .declare(
            Declaration::new(kinds::STAGE, &name)
                .parent(component)
                .reference("rest_api", api, "id")
                .reference("deployment", deployment, "id")
                .property("stage_name", stage_name)
                .tags(tags),
        )
        .map_err(GatewayError::declaration("stage", &name))
}
