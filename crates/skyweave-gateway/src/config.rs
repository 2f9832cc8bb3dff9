//! Composition input types

use serde::Deserialize;
use skyweave_cloud::{NodeRef, ResourceGraph, Tags, kinds, placeholder, resource_key};
use std::collections::BTreeMap;
use std::fmt;

/// Everything needed to compose one API front-end
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositionConfig {
    /// Name of the REST API as the provider shows it
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Stage the deployment is published under (e.g., "prod", "dev")
    pub stage_name: String,

    /// Deployment environment, used for the `Environment` tag
    pub environment: String,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    #[serde(default)]
    pub enable_cors: bool,

    /// Handler backing a token authorizer
    #[serde(default)]
    pub authorizer: Option<HandlerRef>,

    /// Create an API key and usage plan (requires `usage_plan`)
    #[serde(default)]
    pub api_key_required: bool,

    #[serde(default)]
    pub usage_plan: Option<UsagePlanConfig>,

    #[serde(default)]
    pub custom_domain: Option<CustomDomainConfig>,

    /// Overrides merged over the default tags
    #[serde(default)]
    pub tags: Tags,
}

impl CompositionConfig {
    pub fn new(
        name: impl Into<String>,
        stage_name: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            stage_name: stage_name.into(),
            environment: environment.into(),
            endpoints: Vec::new(),
            enable_cors: false,
            authorizer: None,
            api_key_required: false,
            usage_plan: None,
            custom_domain: None,
            tags: Tags::new(),
        }
    }

    pub fn endpoint(mut self, endpoint: EndpointConfig) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    pub fn with_cors(mut self) -> Self {
        self.enable_cors = true;
        self
    }

    pub fn with_authorizer(mut self, handler: HandlerRef) -> Self {
        self.authorizer = Some(handler);
        self
    }

    pub fn require_api_key(mut self) -> Self {
        self.api_key_required = true;
        self
    }

    pub fn with_usage_plan(mut self, usage_plan: UsagePlanConfig) -> Self {
        self.usage_plan = Some(usage_plan);
        self
    }

    pub fn with_custom_domain(mut self, domain: CustomDomainConfig) -> Self {
        self.custom_domain = Some(domain);
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// One (path, method) pair and the handler behind it
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// URL path, e.g. "/users/{id}"
    pub path: String,

    pub method: HttpMethod,

    pub handler: HandlerRef,

    #[serde(default)]
    pub authorization: AuthMode,

    #[serde(default)]
    pub api_key_required: bool,

    /// Request parameter name → required
    #[serde(default)]
    pub request_parameters: BTreeMap<String, bool>,

    /// Content type → model name
    #[serde(default)]
    pub request_models: BTreeMap<String, String>,
}

impl EndpointConfig {
    pub fn new(path: impl Into<String>, method: HttpMethod, handler: HandlerRef) -> Self {
        Self {
            path: path.into(),
            method,
            handler,
            authorization: AuthMode::None,
            api_key_required: false,
            request_parameters: BTreeMap::new(),
            request_models: BTreeMap::new(),
        }
    }

    pub fn authorization(mut self, mode: AuthMode) -> Self {
        self.authorization = mode;
        self
    }

    pub fn require_api_key(mut self) -> Self {
        self.api_key_required = true;
        self
    }

    pub fn request_parameter(mut self, name: impl Into<String>, required: bool) -> Self {
        self.request_parameters.insert(name.into(), required);
        self
    }

    pub fn request_model(
        mut self,
        content_type: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.request_models.insert(content_type.into(), model.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Any,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Any => "ANY",
        }
    }

    /// Method segment of an execute-api source ARN
    pub fn arn_segment(self) -> &'static str {
        match self {
            HttpMethod::Any => "*",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method authorization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum AuthMode {
    #[default]
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "AWS_IAM", alias = "IAM")]
    AwsIam,
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::None => "NONE",
            AuthMode::AwsIam => "AWS_IAM",
            AuthMode::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an already-provisioned invocable handler.
///
/// In a manifest the handler is written as the name of a function composed in
/// the same graph; the reference then carries that function's output
/// placeholders and lets wiring declare the dependency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct HandlerRef {
    function_name: String,
    invoke_arn: String,
    function: Option<String>,
}

impl HandlerRef {
    /// Handler provisioned outside the graph
    pub fn new(function_name: impl Into<String>, invoke_arn: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            invoke_arn: invoke_arn.into(),
            function: None,
        }
    }

    /// Handler provided by the function component `name` in the same graph
    pub fn function(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = resource_key(kinds::LAMBDA_FUNCTION, &name);
        Self {
            function_name: placeholder(&key, "name"),
            invoke_arn: placeholder(&key, "invoke_arn"),
            function: Some(name),
        }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn invoke_arn(&self) -> &str {
        &self.invoke_arn
    }

    /// Name of the in-graph function this handler points at, if any
    pub fn function_ref(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Node providing this handler; `Ok(None)` for handlers outside the graph
    pub fn resolve(&self, graph: &ResourceGraph) -> skyweave_cloud::Result<Option<NodeRef>> {
        match &self.function {
            None => Ok(None),
            Some(name) => {
                let key = resource_key(kinds::LAMBDA_FUNCTION, name);
                graph
                    .find(&key)
                    .map(Some)
                    .ok_or(skyweave_cloud::CloudError::UnknownNode(key))
            }
        }
    }
}

impl From<String> for HandlerRef {
    fn from(name: String) -> Self {
        Self::function(name)
    }
}

/// API key limits
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsagePlanConfig {
    #[serde(default)]
    pub quota: Option<QuotaConfig>,

    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    pub limit: u32,
    pub period: QuotaPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotaPeriod {
    Day,
    Week,
    Month,
}

impl QuotaPeriod {
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaPeriod::Day => "DAY",
            QuotaPeriod::Week => "WEEK",
            QuotaPeriod::Month => "MONTH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThrottleConfig {
    pub burst_limit: u32,
    pub rate_limit: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomDomainConfig {
    pub domain_name: String,
    pub certificate_arn: String,

    /// DNS zone; informational only, no record is declared for it
    #[serde(default)]
    pub zone_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_composition() {
        let yaml = r#"
name: shop
stage_name: prod
environment: production
enable_cors: true
api_key_required: true
usage_plan:
  quota: { limit: 1000, period: DAY }
  throttle: { burst_limit: 10, rate_limit: 5.0 }
endpoints:
  - path: /users
    method: GET
    handler: users
  - path: /users/{id}
    method: DELETE
    handler: users
    authorization: AWS_IAM
    request_parameters:
      method.request.path.id: true
    request_models:
      application/json: UserPatch
"#;
        let config: CompositionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "shop");
        assert!(config.enable_cors);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].authorization, AuthMode::None);
        assert_eq!(config.endpoints[1].method, HttpMethod::Delete);
        assert_eq!(config.endpoints[1].authorization, AuthMode::AwsIam);
        assert_eq!(config.endpoints[1].handler.function_ref(), Some("users"));
        assert_eq!(
            config.endpoints[1].request_models["application/json"],
            "UserPatch"
        );
        assert!(config.endpoints[0].request_models.is_empty());

        let plan = config.usage_plan.unwrap();
        assert_eq!(plan.quota.unwrap().period, QuotaPeriod::Day);
        assert_eq!(plan.throttle.unwrap().burst_limit, 10);
    }

    #[test]
    fn test_misspelled_keys_rejected() {
        let top_level = r#"
name: shop
stage_name: prod
environment: production
enable_cor: true
"#;
        let err = serde_yaml::from_str::<CompositionConfig>(top_level).unwrap_err();
        assert!(err.to_string().contains("enable_cor"));

        let endpoint = r#"
path: /users
method: GET
handler: users
request_parameter:
  method.request.querystring.page: false
"#;
        let err = serde_yaml::from_str::<EndpointConfig>(endpoint).unwrap_err();
        assert!(err.to_string().contains("request_parameter"));

        let quota = "{ limit: 10, period: DAY, burst: 2 }";
        assert!(serde_yaml::from_str::<QuotaConfig>(quota).is_err());
    }

    #[test]
    fn test_iam_alias() {
        let mode: AuthMode = serde_yaml::from_str("IAM").unwrap();
        assert_eq!(mode, AuthMode::AwsIam);
    }

    #[test]
    fn test_handler_from_function_name() {
        let handler = HandlerRef::function("orders");
        assert_eq!(handler.function_name(), "${aws:lambda/Function:orders.name}");
        assert_eq!(
            handler.invoke_arn(),
            "${aws:lambda/Function:orders.invoke_arn}"
        );
    }

    #[test]
    fn test_external_handler_resolves_to_nothing() {
        let handler = HandlerRef::new("legacy", "arn:aws:lambda:us-east-1:1:function:legacy");
        assert_eq!(handler.resolve(&ResourceGraph::new()).unwrap(), None);
        assert!(HandlerRef::function("missing")
            .resolve(&ResourceGraph::new())
            .is_err());
    }

    #[test]
    fn test_any_method_arn_segment() {
        assert_eq!(HttpMethod::Any.arn_segment(), "*");
        assert_eq!(HttpMethod::Get.arn_segment(), "GET");
    }
}
