//! API front-end composition

use crate::config::CompositionConfig;
use crate::deployment::{DeploymentFingerprint, declare_deployment, declare_stage};
use crate::error::{GatewayError, Result};
use crate::features::{
    DomainBinding, UsagePlanBinding, declare_authorizer, declare_custom_domain, declare_usage_plan,
};
use crate::outputs::{GatewayOutputs, aggregate};
use crate::path_tree::PathTree;
use crate::validate::validate;
use crate::wiring::{WiredEndpoint, WiringContext, wire};
use serde_json::json;
use skyweave_cloud::{
    Declaration, NodeRef, ProviderContext, ResourceGraph, TagDefaults, Tags, kinds, merge_tags,
};
use tracing::{debug, info, instrument};

const ENDPOINT_TYPE: &str = "EDGE";

/// Handles to everything one composition declared
#[derive(Debug, Clone)]
pub struct ApiGateway {
    pub name: String,
    pub component: NodeRef,
    pub api: NodeRef,
    pub authorizer: Option<NodeRef>,
    pub tree: PathTree,
    pub endpoints: Vec<WiredEndpoint>,
    pub fingerprint: DeploymentFingerprint,
    pub deployment: NodeRef,
    pub stage: NodeRef,
    pub usage_plan: Option<UsagePlanBinding>,
    pub domain: Option<DomainBinding>,
    pub tags: Tags,
    pub outputs: GatewayOutputs,
}

impl ApiGateway {
    /// Compose a REST API front-end into `graph`.
    ///
    /// The configuration is validated first, so a configuration error leaves
    /// the graph untouched. A failure after that point aborts the whole
    /// composition.
    #[instrument(skip(graph, config, provider), fields(stage = %config.stage_name))]
    pub fn compose(
        graph: &mut ResourceGraph,
        name: &str,
        config: &CompositionConfig,
        provider: &ProviderContext,
    ) -> Result<Self> {
        validate(config).map_err(|source| GatewayError::InvalidConfig {
            name: name.to_string(),
            source,
        })?;

        let component = graph
            .register_component(kinds::API_GATEWAY_COMPONENT, name, None)
            .map_err(|source| GatewayError::Registration {
                name: name.to_string(),
                source,
            })?;

        let tags = merge_tags(&TagDefaults::for_environment(&config.environment), &config.tags);

        let api = graph
            .declare(
                Declaration::new(kinds::REST_API, name)
                    .parent(&component)
                    .property("name", config.name.as_str())
                    .property("description", config.description.as_str())
                    .property("endpoint_configuration", json!({ "types": [ENDPOINT_TYPE] }))
                    .tags(&tags),
            )
            .map_err(GatewayError::declaration("REST API", name))?;

        let authorizer = config
            .authorizer
            .as_ref()
            .map(|handler| declare_authorizer(graph, &component, &api, name, handler))
            .transpose()?;

        let ctx = WiringContext {
            api_name: name,
            component: &component,
            api: &api,
            provider,
            authorizer: authorizer.as_ref(),
            enable_cors: config.enable_cors,
        };
        let mut tree = PathTree::new(name, &api, &component);
        let mut endpoints = Vec::with_capacity(config.endpoints.len());
        for endpoint in &config.endpoints {
            let leaf = tree
                .build_or_reuse(graph, &endpoint.path)
                .map_err(|source| GatewayError::Endpoint {
                    method: endpoint.method,
                    path: endpoint.path.clone(),
                    source: Box::new(source),
                })?;
            endpoints.push(wire(graph, &ctx, &leaf, endpoint)?);
        }
        debug!(resources = tree.len(), endpoints = endpoints.len(), "wired endpoints");

        // Every endpoint is wired at this point; the deployment must come after.
        let fingerprint = DeploymentFingerprint::compute(&config.endpoints, config.enable_cors);
        let inputs: Vec<&NodeRef> = endpoints
            .iter()
            .flat_map(WiredEndpoint::deployment_inputs)
            .collect();
        let deployment = declare_deployment(graph, &component, &api, name, &fingerprint, &inputs)?;
        let stage = declare_stage(
            graph,
            &component,
            &api,
            &deployment,
            name,
            &config.stage_name,
            &tags,
        )?;

        let usage_plan = match (&config.usage_plan, config.api_key_required) {
            (Some(plan), true) => Some(declare_usage_plan(
                graph, &component, &api, &stage, name, plan, &tags,
            )?),
            _ => None,
        };

        let domain = config
            .custom_domain
            .as_ref()
            .map(|domain| {
                declare_custom_domain(graph, &component, &api, &stage, name, domain, &tags)
            })
            .transpose()?;

        let outputs = aggregate(
            graph,
            &api,
            &stage,
            domain.as_ref().map(|d| &d.domain),
            usage_plan.as_ref().map(|p| &p.api_key),
            provider,
        )?;

        info!(
            api = %name,
            endpoints = endpoints.len(),
            %fingerprint,
            "composed API"
        );

        Ok(Self {
            name: name.to_string(),
            component,
            api,
            authorizer,
            tree,
            endpoints,
            fingerprint,
            deployment,
            stage,
            usage_plan,
            domain,
            tags,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthMode, EndpointConfig, HandlerRef, HttpMethod};
    use crate::error::ConfigError;

    fn provider() -> ProviderContext {
        ProviderContext::new("us-east-1", "123456789012")
    }

    fn handler() -> HandlerRef {
        HandlerRef::new("users-fn", "arn:users-fn")
    }

    #[test]
    fn test_invalid_config_leaves_graph_empty() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "production").require_api_key();

        let err = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::InvalidConfig {
                source: ConfigError::ApiKeyWithoutUsagePlan,
                ..
            }
        ));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_second_registration_fails() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "production");
        ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

        let err = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap_err();
        assert!(matches!(err, GatewayError::Registration { .. }));
    }

    #[test]
    fn test_tags_reach_api_and_stage() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "staging").tag("Team", "web");
        let gateway = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

        for node in [&gateway.api, &gateway.stage] {
            let tags = graph
                .node(node.id())
                .unwrap()
                .get_property::<Tags>("tags")
                .unwrap();
            assert_eq!(tags["Environment"], "staging");
            assert_eq!(tags["ManagedBy"], "skyweave");
            assert_eq!(tags["Team"], "web");
        }
    }

    #[test]
    fn test_authorizer_only_on_custom_methods() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "production")
            .with_authorizer(HandlerRef::new("auth-fn", "arn:auth-fn"))
            .endpoint(
                EndpointConfig::new("/admin", HttpMethod::Get, handler())
                    .authorization(AuthMode::Custom),
            )
            .endpoint(EndpointConfig::new("/public", HttpMethod::Get, handler()));
        let gateway = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

        let authorizer = gateway.authorizer.unwrap();
        assert!(graph.depends_on(gateway.endpoints[0].method.id(), authorizer.id()));
        assert!(!graph.depends_on(gateway.endpoints[1].method.id(), authorizer.id()));
    }

    #[test]
    fn test_usage_plan_needs_composition_flag() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "production")
            .endpoint(EndpointConfig::new("/users", HttpMethod::Get, handler()).require_api_key());
        let gateway = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

        assert!(gateway.usage_plan.is_none());
        assert!(gateway.outputs.api_key_id.is_none());
        assert!(graph.by_type(kinds::API_KEY).is_empty());
    }

    #[test]
    fn test_empty_endpoint_set_still_deploys() {
        let mut graph = ResourceGraph::new();
        let config = CompositionConfig::new("shop", "prod", "production");
        let gateway = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

        assert!(gateway.tree.is_empty());
        assert!(graph.depends_on(gateway.stage.id(), gateway.deployment.id()));
        assert!(gateway.outputs.base_url.ends_with("/prod"));
    }
}
