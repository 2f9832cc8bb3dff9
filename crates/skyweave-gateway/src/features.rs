//! Cross-cutting features: authorizer, API key + usage plan, custom domain

use crate::config::{CustomDomainConfig, HandlerRef, UsagePlanConfig};
use crate::error::{GatewayError, Result};
use serde_json::json;
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, Tags, kinds};

pub const AUTHORIZER_RESULT_TTL_SECONDS: u32 = 300;
pub const AUTHORIZER_IDENTITY_SOURCE: &str = "method.request.header.Authorization";
const DOMAIN_SECURITY_POLICY: &str = "TLS_1_2";

/// Declare the token authorizer shared by every `CUSTOM` method
pub fn declare_authorizer(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    api: &NodeRef,
    api_name: &str,
    handler: &HandlerRef,
) -> Result<NodeRef> {
    let name = format!("{}-authorizer", api_name);
    let function = handler
        .resolve(graph)
        .map_err(GatewayError::declaration("authorizer", &name))?;

    let mut declaration = Declaration::new(kinds::AUTHORIZER, &name)
        .parent(component)
        .reference("rest_api", api, "id")
        .property("name", name.as_str())
        .property("type", "TOKEN")
        .property("authorizer_uri", handler.invoke_arn())
        .property("identity_source", AUTHORIZER_IDENTITY_SOURCE)
        .property(
            "authorizer_result_ttl_in_seconds",
            AUTHORIZER_RESULT_TTL_SECONDS,
        );
    if let Some(function) = &function {
        declaration = declaration.depends_on(function);
    }

    graph
        .declare(declaration)
        .map_err(GatewayError::declaration("authorizer", &name))
}

/// API key, usage plan and the key binding them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsagePlanBinding {
    pub api_key: NodeRef,
    pub usage_plan: NodeRef,
    pub usage_plan_key: NodeRef,
}

/// Declare an API key metered by a usage plan attached to `stage`
pub fn declare_usage_plan(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    api: &NodeRef,
    stage: &NodeRef,
    api_name: &str,
    config: &UsagePlanConfig,
    tags: &Tags,
) -> Result<UsagePlanBinding> {
    let key_name = format!("{}-key", api_name);
    let api_key = graph
        .declare(
            Declaration::new(kinds::API_KEY, &key_name)
                .parent(component)
                .property("name", key_name.as_str())
                .tags(tags),
        )
        .map_err(GatewayError::declaration("API key", &key_name))?;

    let plan_name = format!("{}-usage-plan", api_name);
    let mut plan = Declaration::new(kinds::USAGE_PLAN, &plan_name)
        .parent(component)
        .depends_on(api)
        .depends_on(stage)
        .property("name", plan_name.as_str())
        .property(
            "api_stages",
            json!([{
                "api_id": api.output("id"),
                "stage": stage.output("stage_name"),
            }]),
        )
        .tags(tags);
    if let Some(quota) = &config.quota {
        plan = plan.property(
            "quota",
            json!({ "limit": quota.limit, "period": quota.period.as_str() }),
        );
    }
    if let Some(throttle) = &config.throttle {
        plan = plan.property(
            "throttle",
            json!({
                "burst_limit": throttle.burst_limit,
                "rate_limit": throttle.rate_limit,
            }),
        );
    }
    let usage_plan = graph
        .declare(plan)
        .map_err(GatewayError::declaration("usage plan", &plan_name))?;

    let binding_name = format!("{}-usage-plan-key", api_name);
    let usage_plan_key = graph
        .declare(
            Declaration::new(kinds::USAGE_PLAN_KEY, &binding_name)
                .parent(component)
                .reference("key_id", &api_key, "id")
                .property("key_type", "API_KEY")
                .reference("usage_plan_id", &usage_plan, "id"),
        )
        .map_err(GatewayError::declaration("usage plan key", &binding_name))?;

    Ok(UsagePlanBinding {
        api_key,
        usage_plan,
        usage_plan_key,
    })
}

/// Custom domain and the mapping that routes it to the stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainBinding {
    pub domain: NodeRef,
    pub mapping: NodeRef,
}

/// Declare a custom domain mapped onto `stage`.
///
/// A zone id is accepted but no DNS record is declared for it.
pub fn declare_custom_domain(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    api: &NodeRef,
    stage: &NodeRef,
    api_name: &str,
    config: &CustomDomainConfig,
    tags: &Tags,
) -> Result<DomainBinding> {
    if let Some(zone_id) = &config.zone_id {
        tracing::warn!(
            domain = %config.domain_name,
            %zone_id,
            "DNS zone given; records for custom domains are not managed here"
        );
    }

    let domain_name = format!("{}-domain", api_name);
    let domain = graph
        .declare(
            Declaration::new(kinds::DOMAIN_NAME, &domain_name)
                .parent(component)
                .property("domain_name", config.domain_name.as_str())
                .property("certificate_arn", config.certificate_arn.as_str())
                .property("security_policy", DOMAIN_SECURITY_POLICY)
                .tags(tags),
        )
        .map_err(GatewayError::declaration("custom domain", &domain_name))?;

    let mapping_name = format!("{}-domain-mapping", api_name);
    let mapping = graph
        .declare(
            Declaration::new(kinds::BASE_PATH_MAPPING, &mapping_name)
                .parent(component)
                .reference("rest_api", api, "id")
                .reference("stage", stage, "stage_name")
                .reference("domain_name", &domain, "domain_name"),
        )
        .map_err(GatewayError::declaration("base path mapping", &mapping_name))?;

    Ok(DomainBinding { domain, mapping })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{QuotaConfig, QuotaPeriod, ThrottleConfig};

    fn setup() -> (ResourceGraph, NodeRef, NodeRef, NodeRef) {
        let mut graph = ResourceGraph::new();
        let component = graph
            .register_component(kinds::API_GATEWAY_COMPONENT, "shop", None)
            .unwrap();
        let api = graph
            .declare(Declaration::new(kinds::REST_API, "shop").parent(&component))
            .unwrap();
        let stage = graph
            .declare(
                Declaration::new(kinds::STAGE, "shop-stage")
                    .reference("rest_api", &api, "id")
                    .property("stage_name", "prod"),
            )
            .unwrap();
        (graph, component, api, stage)
    }

    #[test]
    fn test_authorizer_settings() {
        let (mut graph, component, api, _) = setup();
        let handler = HandlerRef::new("auth-fn", "arn:auth");
        let authorizer = declare_authorizer(&mut graph, &component, &api, "shop", &handler).unwrap();

        let node = graph.node(authorizer.id()).unwrap();
        assert_eq!(node.name, "shop-authorizer");
        assert_eq!(node.property("type"), Some(&json!("TOKEN")));
        assert_eq!(
            node.property("authorizer_result_ttl_in_seconds"),
            Some(&json!(300))
        );
        assert_eq!(
            node.property("identity_source"),
            Some(&json!("method.request.header.Authorization"))
        );
        assert_eq!(node.property("authorizer_uri"), Some(&json!("arn:auth")));
    }

    #[test]
    fn test_usage_plan_follows_stage() {
        let (mut graph, component, api, stage) = setup();
        let config = UsagePlanConfig {
            quota: Some(QuotaConfig {
                limit: 1000,
                period: QuotaPeriod::Day,
            }),
            throttle: Some(ThrottleConfig {
                burst_limit: 10,
                rate_limit: 5.0,
            }),
        };
        let binding = declare_usage_plan(
            &mut graph,
            &component,
            &api,
            &stage,
            "shop",
            &config,
            &Tags::new(),
        )
        .unwrap();

        assert!(graph.depends_on(binding.usage_plan.id(), stage.id()));
        assert!(binding.usage_plan.id() > stage.id());

        let plan = graph.node(binding.usage_plan.id()).unwrap();
        assert_eq!(
            plan.property("quota"),
            Some(&json!({"limit": 1000, "period": "DAY"}))
        );
        assert_eq!(
            plan.property("throttle"),
            Some(&json!({"burst_limit": 10, "rate_limit": 5.0}))
        );
        assert_eq!(
            plan.property("api_stages"),
            Some(&json!([{
                "api_id": "${aws:apigateway/RestApi:shop.id}",
                "stage": "${aws:apigateway/Stage:shop-stage.stage_name}",
            }]))
        );

        assert!(graph.depends_on(binding.usage_plan_key.id(), binding.api_key.id()));
        assert!(graph.depends_on(binding.usage_plan_key.id(), binding.usage_plan.id()));
    }

    #[test]
    fn test_usage_plan_without_limits() {
        let (mut graph, component, api, stage) = setup();
        let binding = declare_usage_plan(
            &mut graph,
            &component,
            &api,
            &stage,
            "shop",
            &UsagePlanConfig::default(),
            &Tags::new(),
        )
        .unwrap();
        let plan = graph.node(binding.usage_plan.id()).unwrap();
        assert!(plan.property("quota").is_none());
        assert!(plan.property("throttle").is_none());
    }

    #[test]
    fn test_custom_domain_mapping() {
        let (mut graph, component, api, stage) = setup();
        let config = CustomDomainConfig {
            domain_name: "api.example.com".to_string(),
            certificate_arn: "arn:aws:acm:us-east-1:1:certificate/abc".to_string(),
            zone_id: Some("Z123".to_string()),
        };
        let before = graph.len();
        let binding =
            declare_custom_domain(&mut graph, &component, &api, &stage, "shop", &config, &Tags::new())
                .unwrap();

        // domain + mapping only; the zone id never becomes a record
        assert_eq!(graph.len(), before + 2);
        let domain = graph.node(binding.domain.id()).unwrap();
        assert_eq!(domain.property("security_policy"), Some(&json!("TLS_1_2")));
        assert!(graph.depends_on(binding.mapping.id(), stage.id()));
        assert!(graph.depends_on(binding.mapping.id(), binding.domain.id()));
    }
}
