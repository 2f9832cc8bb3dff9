//! Output aggregation

use crate::error::{GatewayError, Result};
use serde::Serialize;
use skyweave_cloud::{CloudError, NodeRef, ProviderContext, ResourceGraph};

/// Externally consumable values of a composed API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOutputs {
    pub base_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
}

/// Project the outputs from nodes that already exist in `graph`.
///
/// `domain` and `api_key` are present only when those features were composed.
pub fn aggregate(
    graph: &ResourceGraph,
    api: &NodeRef,
    stage: &NodeRef,
    domain: Option<&NodeRef>,
    api_key: Option<&NodeRef>,
    provider: &ProviderContext,
) -> Result<GatewayOutputs> {
    let stage_name = string_property(graph, stage, "stage_name")?;
    let base_url = format!(
        "https://{}.execute-api.{}.amazonaws.com/{}",
        api.output("id"),
        provider.region,
        stage_name
    );

    let custom_domain_url = domain
        .map(|domain| string_property(graph, domain, "domain_name"))
        .transpose()?
        .map(|name| format!("https://{}", name));

    Ok(GatewayOutputs {
        base_url,
        custom_domain_url,
        api_key_id: api_key.map(|key| key.output("id")),
    })
}

fn string_property(graph: &ResourceGraph, node: &NodeRef, key: &str) -> Result<String> {
    graph
        .node(node.id())
        .and_then(|n| n.get_property::<String>(key))
        .ok_or_else(|| {
            GatewayError::declaration("outputs", node.key())(CloudError::UnknownNode(format!(
                "{}.{}",
                node.key(),
                key
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyweave_cloud::{Declaration, kinds};

    #[test]
    fn test_base_url_only() {
        let mut graph = ResourceGraph::new();
        let api = graph.declare(Declaration::new(kinds::REST_API, "shop")).unwrap();
        let stage = graph
            .declare(Declaration::new(kinds::STAGE, "shop-stage").property("stage_name", "prod"))
            .unwrap();

        let outputs = aggregate(
            &graph,
            &api,
            &stage,
            None,
            None,
            &ProviderContext::new("eu-west-1", "1"),
        )
        .unwrap();
        assert_eq!(
            outputs.base_url,
            "https://${aws:apigateway/RestApi:shop.id}.execute-api.eu-west-1.amazonaws.com/prod"
        );
        assert_eq!(outputs.custom_domain_url, None);
        assert_eq!(outputs.api_key_id, None);

        let json = serde_json::to_value(&outputs).unwrap();
        assert!(json.get("api_key_id").is_none());
    }

    #[test]
    fn test_optional_outputs() {
        let mut graph = ResourceGraph::new();
        let api = graph.declare(Declaration::new(kinds::REST_API, "shop")).unwrap();
        let stage = graph
            .declare(Declaration::new(kinds::STAGE, "shop-stage").property("stage_name", "dev"))
            .unwrap();
        let domain = graph
            .declare(
                Declaration::new(kinds::DOMAIN_NAME, "shop-domain")
                    .property("domain_name", "api.example.com"),
            )
            .unwrap();
        let key = graph.declare(Declaration::new(kinds::API_KEY, "shop-key")).unwrap();

        let outputs = aggregate(
            &graph,
            &api,
            &stage,
            Some(&domain),
            Some(&key),
            &ProviderContext::new("us-east-1", "1"),
        )
        .unwrap();
        assert_eq!(
            outputs.custom_domain_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(
            outputs.api_key_id.as_deref(),
            Some("${aws:apigateway/ApiKey:shop-key.id}")
        );
    }

    #[test]
    fn test_stage_without_name_is_an_error() {
        let mut graph = ResourceGraph::new();
        let api = graph.declare(Declaration::new(kinds::REST_API, "shop")).unwrap();
        let stage = graph.declare(Declaration::new(kinds::STAGE, "shop-stage")).unwrap();

        let err = aggregate(
            &graph,
            &api,
            &stage,
            None,
            None,
            &ProviderContext::new("us-east-1", "1"),
        )
        .unwrap_err();
        assert!(matches!(err, GatewayError::Declaration { step: "outputs", .. }));
    }
}
