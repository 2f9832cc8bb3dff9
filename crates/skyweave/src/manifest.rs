//! Project manifest: every unit composed into one graph

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use skyweave_cloud::{ProviderContext, ResourceGraph};
use skyweave_components::{
    BucketConfig, BucketOutputs, Distribution, DistributionConfig, DistributionOutputs, Function,
    FunctionConfig, FunctionOutputs, SecureBucket,
};
use skyweave_gateway::{ApiGateway, CompositionConfig, GatewayOutputs, HandlerRef};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub provider: ProviderContext,

    #[serde(default)]
    pub buckets: BTreeMap<String, BucketConfig>,

    #[serde(default)]
    pub functions: BTreeMap<String, FunctionConfig>,

    #[serde(default)]
    pub apis: BTreeMap<String, CompositionConfig>,

    #[serde(default)]
    pub distributions: BTreeMap<String, DistributionConfig>,
}

/// Everything a manifest declared, keyed by unit name
#[derive(Debug)]
pub struct Composed {
    pub graph: ResourceGraph,
    pub buckets: BTreeMap<String, SecureBucket>,
    pub functions: BTreeMap<String, Function>,
    pub apis: BTreeMap<String, ApiGateway>,
    pub distributions: BTreeMap<String, Distribution>,
}

#[derive(Debug, Serialize)]
pub struct ManifestOutputs {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub buckets: BTreeMap<String, BucketOutputs>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, FunctionOutputs>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub apis: BTreeMap<String, GatewayOutputs>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub distributions: BTreeMap<String, DistributionOutputs>,
}

impl Manifest {
    /// Resolve the manifest path (explicit or discovered) and load it
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<(PathBuf, Self)> {
        let path = skyweave_config::resolve_manifest(explicit)?;
        let manifest = skyweave_config::load_manifest(&path)
            .with_context(|| format!("failed to load manifest {}", path.display()))?;
        Ok((path, manifest))
    }

    /// Every handler must name a function declared in the same manifest
    pub fn check_handlers(&self) -> anyhow::Result<()> {
        for (api_name, api) in &self.apis {
            let handlers = api
                .endpoints
                .iter()
                .map(|e| (format!("endpoint {} {}", e.method, e.path), &e.handler))
                .chain(
                    api.authorizer
                        .iter()
                        .map(|h| ("authorizer".to_string(), h)),
                );
            for (what, handler) in handlers {
                self.check_handler(api_name, &what, handler)?;
            }
        }
        Ok(())
    }

    fn check_handler(&self, api_name: &str, what: &str, handler: &HandlerRef) -> anyhow::Result<()> {
        if let Some(function) = handler.function_ref() {
            if !self.functions.contains_key(function) {
                bail!(
                    "API '{}' {} references unknown function '{}'",
                    api_name,
                    what,
                    function
                );
            }
        }
        Ok(())
    }

    /// Compose buckets, functions, APIs and distributions, in that order.
    ///
    /// Functions come before APIs so that endpoint handlers resolve to nodes
    /// already in the graph.
    pub fn compose(&self) -> anyhow::Result<Composed> {
        self.check_handlers()?;

        let mut graph = ResourceGraph::new();

        let mut buckets = BTreeMap::new();
        for (name, config) in &self.buckets {
            let bucket = SecureBucket::compose(&mut graph, name, config)
                .with_context(|| format!("bucket '{}'", name))?;
            buckets.insert(name.clone(), bucket);
        }

        let mut functions = BTreeMap::new();
        for (name, config) in &self.functions {
            let function = Function::compose(&mut graph, name, config)
                .with_context(|| format!("function '{}'", name))?;
            functions.insert(name.clone(), function);
        }

        let mut apis = BTreeMap::new();
        for (name, config) in &self.apis {
            let api = ApiGateway::compose(&mut graph, name, config, &self.provider)
                .with_context(|| format!("API '{}'", name))?;
            apis.insert(name.clone(), api);
        }

        let mut distributions = BTreeMap::new();
        for (name, config) in &self.distributions {
            let distribution = Distribution::compose(&mut graph, name, config)
                .with_context(|| format!("distribution '{}'", name))?;
            distributions.insert(name.clone(), distribution);
        }

        tracing::info!(resources = graph.len(), "composed manifest");

        Ok(Composed {
            graph,
            buckets,
            functions,
            apis,
            distributions,
        })
    }
}

impl Composed {
    pub fn outputs(&self) -> ManifestOutputs {
        ManifestOutputs {
            buckets: self
                .buckets
                .iter()
                .map(|(name, b)| (name.clone(), b.outputs.clone()))
                .collect(),
            functions: self
                .functions
                .iter()
                .map(|(name, f)| (name.clone(), f.outputs.clone()))
                .collect(),
            apis: self
                .apis
                .iter()
                .map(|(name, a)| (name.clone(), a.outputs.clone()))
                .collect(),
            distributions: self
                .distributions
                .iter()
                .map(|(name, d)| (name.clone(), d.outputs.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyweave_cloud::kinds;

    const MANIFEST: &str = r#"
provider:
  region: us-east-1
  account: "123456789012"
functions:
  users:
    runtime: python3.12
    handler: app.handler
    code: dist/users.zip
    environment: production
apis:
  shop:
    name: shop
    stage_name: prod
    environment: production
    endpoints:
      - path: /users
        method: GET
        handler: users
"#;

    fn parse(yaml: &str) -> Manifest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_compose_links_handler_to_function() {
        let composed = parse(MANIFEST).compose().unwrap();
        let api = &composed.apis["shop"];
        let function = &composed.functions["users"];

        let integration = api.endpoints[0].integration.id();
        assert!(composed.graph.depends_on(integration, function.function.id()));
        assert_eq!(
            composed
                .graph
                .node(integration)
                .unwrap()
                .get_property::<String>("uri")
                .as_deref(),
            Some("${aws:lambda/Function:users.invoke_arn}")
        );
        assert_eq!(composed.graph.by_type(kinds::LAMBDA_PERMISSION).len(), 1);
    }

    #[test]
    fn test_unknown_handler_rejected() {
        let yaml = MANIFEST.replace("handler: users", "handler: orders");
        let err = parse(&yaml).compose().unwrap_err();
        assert!(err.to_string().contains("unknown function 'orders'"));
    }

    #[test]
    fn test_outputs_skip_empty_sections() {
        let composed = parse(MANIFEST).compose().unwrap();
        let json = serde_json::to_value(composed.outputs()).unwrap();
        assert!(json.get("apis").is_some());
        assert!(json.get("functions").is_some());
        assert!(json.get("buckets").is_none());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let yaml = format!("{}\nqueues: {{}}\n", MANIFEST);
        assert!(serde_yaml::from_str::<Manifest>(&yaml).is_err());
    }

    #[test]
    fn test_misspelled_nested_keys_rejected() {
        let api = MANIFEST.replace(
            "stage_name: prod",
            "stage_name: prod\n    enable_cor: true",
        );
        let err = serde_yaml::from_str::<Manifest>(&api).unwrap_err();
        assert!(err.to_string().contains("unknown field `enable_cor`"));

        let function = MANIFEST.replace(
            "code: dist/users.zip",
            "code: dist/users.zip\n    memory: 256",
        );
        let err = serde_yaml::from_str::<Manifest>(&function).unwrap_err();
        assert!(err.to_string().contains("unknown field `memory`"));
    }
}
