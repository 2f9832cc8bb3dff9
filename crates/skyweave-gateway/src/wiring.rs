//! Endpoint wiring
//!
//! Attaches a method, a proxy integration, an invoke permission and, with
//! CORS enabled, an `OPTIONS` preflight pair to an endpoint's leaf node.

use crate::config::{AuthMode, EndpointConfig, HttpMethod};
use crate::error::{GatewayError, Result};
use crate::path_tree::{PathNode, normalize_path};
use serde_json::json;
use skyweave_cloud::{Declaration, NodeRef, ProviderContext, ResourceGraph, kinds};

const INVOKE_ACTION: &str = "lambda:InvokeFunction";
const INVOKE_PRINCIPAL: &str = "apigateway.amazonaws.com";
const PREFLIGHT_TEMPLATE: &str = r#"{"statusCode": 200}"#;

/// Shared inputs for every endpoint of one API
#[derive(Debug, Clone, Copy)]
pub struct WiringContext<'a> {
    pub api_name: &'a str,
    pub component: &'a NodeRef,
    pub api: &'a NodeRef,
    pub provider: &'a ProviderContext,
    pub authorizer: Option<&'a NodeRef>,
    pub enable_cors: bool,
}

/// Preflight method and its mock integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPair {
    pub method: NodeRef,
    pub integration: NodeRef,
}

/// Nodes declared for one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiredEndpoint {
    pub method: NodeRef,
    pub integration: NodeRef,
    pub permission: NodeRef,
    pub cors: Option<CorsPair>,
}

impl WiredEndpoint {
    /// Methods and integrations a deployment has to wait for
    pub fn deployment_inputs(&self) -> Vec<&NodeRef> {
        let mut inputs = vec![&self.method, &self.integration];
        if let Some(cors) = &self.cors {
            inputs.push(&cors.method);
            inputs.push(&cors.integration);
        }
        inputs
    }
}

/// Wire one endpoint onto its leaf.
///
/// Any failure is reported against the endpoint's method and path.
pub fn wire(
    graph: &mut ResourceGraph,
    ctx: &WiringContext<'_>,
    leaf: &PathNode,
    endpoint: &EndpointConfig,
) -> Result<WiredEndpoint> {
    wire_endpoint(graph, ctx, leaf, endpoint).map_err(|source| GatewayError::Endpoint {
        method: endpoint.method,
        path: endpoint.path.clone(),
        source: Box::new(source),
    })
}

fn wire_endpoint(
    graph: &mut ResourceGraph,
    ctx: &WiringContext<'_>,
    leaf: &PathNode,
    endpoint: &EndpointConfig,
) -> Result<WiredEndpoint> {
    let path = normalize_path(&endpoint.path);
    // Derived names hang off `#`, which no valid path contains, so a suffix can
    // never spell another endpoint's base name.
    let base_name = format!("{}-{}-{}", ctx.api_name, endpoint.method, path);

    let handler = endpoint
        .handler
        .resolve(graph)
        .map_err(GatewayError::declaration("handler", &base_name))?;

    let mut method = resource_declaration(kinds::METHOD, &base_name, ctx, leaf)
        .property("http_method", endpoint.method.as_str())
        .property("authorization", endpoint.authorization.as_str())
        .property("api_key_required", endpoint.api_key_required);
    if endpoint.authorization == AuthMode::Custom {
        if let Some(authorizer) = ctx.authorizer {
            method = method.reference("authorizer_id", authorizer, "id");
        }
    }
    if !endpoint.request_parameters.is_empty() {
        method = method.property("request_parameters", json!(endpoint.request_parameters));
    }
    if !endpoint.request_models.is_empty() {
        method = method.property("request_models", json!(endpoint.request_models));
    }
    let method = graph
        .declare(method)
        .map_err(GatewayError::declaration("method", &base_name))?;

    let integration_name = format!("{}#integration", base_name);
    let mut integration = resource_declaration(kinds::INTEGRATION, &integration_name, ctx, leaf)
        .reference("http_method", &method, "http_method")
        .property("integration_type", "AWS_PROXY")
        .property("integration_http_method", "POST")
        .property("uri", endpoint.handler.invoke_arn());
    if let Some(handler) = &handler {
        integration = integration.depends_on(handler);
    }
    let integration = graph
        .declare(integration)
        .map_err(GatewayError::declaration("integration", &integration_name))?;

    let permission_name = format!("{}#permission", base_name);
    let source_arn = format!(
        "arn:aws:execute-api:{}:{}:{}/*/{}{}",
        ctx.provider.region,
        ctx.provider.account,
        ctx.api.output("id"),
        endpoint.method.arn_segment(),
        path
    );
    let mut permission = Declaration::new(kinds::LAMBDA_PERMISSION, &permission_name)
        .parent(ctx.component)
        .depends_on(ctx.api)
        .property("action", INVOKE_ACTION)
        .property("function", endpoint.handler.function_name())
        .property("principal", INVOKE_PRINCIPAL)
        .property("source_arn", source_arn);
    if let Some(handler) = &handler {
        permission = permission.depends_on(handler);
    }
    let permission = graph
        .declare(permission)
        .map_err(GatewayError::declaration("permission", &permission_name))?;

    let cors = if ctx.enable_cors {
        Some(wire_preflight(graph, ctx, leaf, &base_name)?)
    } else {
        None
    };

    Ok(WiredEndpoint {
        method,
        integration,
        permission,
        cors,
    })
}

/// One preflight pair per endpoint, even when endpoints share a leaf
fn wire_preflight(
    graph: &mut ResourceGraph,
    ctx: &WiringContext<'_>,
    leaf: &PathNode,
    base_name: &str,
) -> Result<CorsPair> {
    let method_name = format!("{}#options", base_name);
    let method = graph
        .declare(
            resource_declaration(kinds::METHOD, &method_name, ctx, leaf)
                .property("http_method", HttpMethod::Options.as_str())
                .property("authorization", AuthMode::None.as_str())
                .property("api_key_required", false),
        )
        .map_err(GatewayError::declaration("OPTIONS method", &method_name))?;

    let integration_name = format!("{}#options-integration", base_name);
    let integration = graph
        .declare(
            resource_declaration(kinds::INTEGRATION, &integration_name, ctx, leaf)
                .property("http_method", HttpMethod::Options.as_str())
                .depends_on(&method)
                .property("integration_type", "MOCK")
                .property(
                    "request_templates",
                    json!({ "application/json": PREFLIGHT_TEMPLATE }),
                ),
        )
        .map_err(GatewayError::declaration("OPTIONS integration", &integration_name))?;

    Ok(CorsPair {
        method,
        integration,
    })
}

fn resource_declaration(
    resource_type: &str,
    name: &str,
    ctx: &WiringContext<'_>,
    leaf: &PathNode,
) -> Declaration {
    Declaration::new(resource_type, name)
        .parent(ctx.component)
        .reference("rest_api", ctx.api, "id")
        .reference("resource_id", leaf.node(), leaf.resource_id_attribute())
}
