//! End-to-end composition scenarios

use serde_json::json;
use skyweave_cloud::{Plan, ProviderContext, ResourceGraph, kinds};
use skyweave_gateway::{
    ApiGateway, AuthMode, CompositionConfig, ConfigError, CustomDomainConfig, EndpointConfig,
    GatewayError, HandlerRef, HttpMethod, QuotaConfig, QuotaPeriod, ThrottleConfig,
    UsagePlanConfig,
};

fn provider() -> ProviderContext {
    ProviderContext::new("us-east-1", "123456789012")
}

fn users_handler() -> HandlerRef {
    HandlerRef::new(
        "users-fn",
        "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/users-fn/invocations",
    )
}

fn users_config() -> CompositionConfig {
    CompositionConfig::new("users-api", "prod", "production")
        .endpoint(EndpointConfig::new("/users", HttpMethod::Get, users_handler()))
        .endpoint(
            EndpointConfig::new("/users", HttpMethod::Post, users_handler()).require_api_key(),
        )
        .require_api_key()
        .with_usage_plan(UsagePlanConfig {
            quota: Some(QuotaConfig {
                limit: 1000,
                period: QuotaPeriod::Day,
            }),
            throttle: Some(ThrottleConfig {
                burst_limit: 10,
                rate_limit: 5.0,
            }),
        })
}

#[test]
fn test_users_get_post_with_usage_plan() {
    let mut graph = ResourceGraph::new();
    let gateway =
        ApiGateway::compose(&mut graph, "users-api", &users_config(), &provider()).unwrap();

    let resources = graph.by_type(kinds::API_RESOURCE);
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].property("path_part"), Some(&json!("users")));

    assert_eq!(graph.by_type(kinds::METHOD).len(), 2);
    assert_eq!(graph.by_type(kinds::INTEGRATION).len(), 2);
    assert_eq!(graph.by_type(kinds::LAMBDA_PERMISSION).len(), 2);
    assert_eq!(graph.by_type(kinds::API_KEY).len(), 1);
    assert_eq!(graph.by_type(kinds::USAGE_PLAN).len(), 1);

    let binding = gateway.usage_plan.as_ref().unwrap();
    assert!(graph.depends_on(binding.usage_plan.id(), gateway.stage.id()));

    assert_eq!(
        gateway.outputs.base_url,
        "https://${aws:apigateway/RestApi:users-api.id}.execute-api.us-east-1.amazonaws.com/prod"
    );
    assert_eq!(
        gateway.outputs.api_key_id.as_deref(),
        Some("${aws:apigateway/ApiKey:users-api-key.id}")
    );
    assert_eq!(gateway.outputs.custom_domain_url, None);
}

#[test]
fn test_deployment_follows_every_method_and_integration() {
    let mut graph = ResourceGraph::new();
    let config = users_config()
        .with_cors()
        .endpoint(EndpointConfig::new("/users/{id}", HttpMethod::Delete, users_handler()));
    let gateway = ApiGateway::compose(&mut graph, "users-api", &config, &provider()).unwrap();

    for kind in [kinds::METHOD, kinds::INTEGRATION] {
        for node in graph.by_type(kind) {
            assert!(
                graph.depends_on(gateway.deployment.id(), node.id),
                "deployment does not wait for {}",
                node.key()
            );
        }
    }
    // three endpoints, each with a preflight pair
    assert_eq!(graph.by_type(kinds::METHOD).len(), 6);
    assert!(graph.depends_on(gateway.stage.id(), gateway.deployment.id()));
}

#[test]
fn test_cors_with_suffix_like_sibling_path() {
    let mut graph = ResourceGraph::new();
    let config = CompositionConfig::new("shop", "prod", "production")
        .with_cors()
        .endpoint(EndpointConfig::new("/users", HttpMethod::Get, users_handler()))
        .endpoint(EndpointConfig::new("/users-options", HttpMethod::Get, users_handler()));

    let gateway = ApiGateway::compose(&mut graph, "shop", &config, &provider()).unwrap();

    assert_eq!(gateway.endpoints.len(), 2);
    assert_eq!(graph.by_type(kinds::API_RESOURCE).len(), 2);
    assert_eq!(graph.by_type(kinds::METHOD).len(), 4);
    assert_eq!(graph.by_type(kinds::INTEGRATION).len(), 4);
    assert!(graph.get(kinds::METHOD, "shop-GET-/users-options").is_some());
    assert!(graph.get(kinds::METHOD, "shop-GET-/users#options").is_some());
}

#[test]
fn test_duplicate_endpoint_rejected_before_declaration() {
    let mut graph = ResourceGraph::new();
    let config = CompositionConfig::new("users-api", "prod", "production")
        .endpoint(EndpointConfig::new("/users", HttpMethod::Get, users_handler()))
        .endpoint(EndpointConfig::new("/users/", HttpMethod::Get, users_handler()));

    let err = ApiGateway::compose(&mut graph, "users-api", &config, &provider()).unwrap_err();
    assert!(matches!(
        err,
        GatewayError::InvalidConfig {
            source: ConfigError::DuplicateEndpoint { .. },
            ..
        }
    ));
    assert!(graph.is_empty());
}

#[test]
fn test_malformed_path_rejected_before_declaration() {
    let mut graph = ResourceGraph::new();
    let config = CompositionConfig::new("users-api", "prod", "production")
        .endpoint(EndpointConfig::new("users", HttpMethod::Get, users_handler()));

    let err = ApiGateway::compose(&mut graph, "users-api", &config, &provider()).unwrap_err();
    assert!(err.to_string().contains("malformed path"));
    assert!(graph.is_empty());
}

#[test]
fn test_fingerprint_stable_across_runs() {
    let first = ApiGateway::compose(
        &mut ResourceGraph::new(),
        "users-api",
        &users_config(),
        &provider(),
    )
    .unwrap();
    let second = ApiGateway::compose(
        &mut ResourceGraph::new(),
        "users-api",
        &users_config(),
        &provider(),
    )
    .unwrap();
    assert_eq!(first.fingerprint, second.fingerprint);

    let mut changed = users_config();
    changed.endpoints[0].authorization = AuthMode::AwsIam;
    let third =
        ApiGateway::compose(&mut ResourceGraph::new(), "users-api", &changed, &provider())
            .unwrap();
    assert_ne!(first.fingerprint, third.fingerprint);
}

#[test]
fn test_custom_domain_output() {
    let mut graph = ResourceGraph::new();
    let config = users_config().with_custom_domain(CustomDomainConfig {
        domain_name: "api.example.com".to_string(),
        certificate_arn: "arn:aws:acm:us-east-1:123456789012:certificate/abc".to_string(),
        zone_id: None,
    });
    let gateway = ApiGateway::compose(&mut graph, "users-api", &config, &provider()).unwrap();

    assert_eq!(
        gateway.outputs.custom_domain_url.as_deref(),
        Some("https://api.example.com")
    );
    let domain = gateway.domain.unwrap();
    assert!(graph.depends_on(domain.mapping.id(), gateway.stage.id()));
}

#[test]
fn test_plan_orders_dependencies_first() {
    let mut graph = ResourceGraph::new();
    let gateway =
        ApiGateway::compose(&mut graph, "users-api", &users_config(), &provider()).unwrap();
    let plan = Plan::from_graph(&graph);

    let position = |key: &str| {
        plan.actions
            .iter()
            .position(|a| a.resource_id == key)
            .unwrap()
    };
    assert!(position(gateway.api.key()) < position(gateway.deployment.key()));
    assert!(position(gateway.deployment.key()) < position(gateway.stage.key()));
    assert!(
        position(gateway.stage.key())
            < position(gateway.usage_plan.as_ref().unwrap().usage_plan.key())
    );
}
