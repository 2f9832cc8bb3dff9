//! Serverless function builder
//!
//! A function comes with its execution role, policy attachments, a log group
//! with bounded retention, optional CloudWatch alarms and a `prod` alias.

use crate::error::{ComponentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, TagDefaults, Tags, kinds, merge_tags};
use std::collections::BTreeMap;
use tracing::{info, instrument};

pub const DEFAULT_MEMORY_SIZE: u32 = 128;
pub const DEFAULT_TIMEOUT: u32 = 3;
pub const DEFAULT_LOG_RETENTION_DAYS: u32 = 14;

const MAX_MEMORY_SIZE: u32 = 10240;
const MAX_TIMEOUT: u32 = 900;
const ALARM_PERIOD_SECONDS: u32 = 300;
const ALIAS_NAME: &str = "prod";

const ASSUME_ROLE_POLICY: &str = r#"{
    "Version": "2012-10-17",
    "Statement": [{
        "Action": "sts:AssumeRole",
        "Principal": {
            "Service": "lambda.amazonaws.com"
        },
        "Effect": "Allow"
    }]
}"#;
const BASIC_EXECUTION_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";
const XRAY_POLICY: &str = "arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess";
const VPC_ACCESS_POLICY: &str =
    "arn:aws:iam::aws:policy/service-role/AWSLambdaVPCAccessExecutionRole";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionConfig {
    /// Runtime identifier, e.g. "python3.12" or "provided.al2023"
    pub runtime: String,

    /// Entry point inside the code archive
    pub handler: String,

    /// Code archive reference (local path or object URI); passed through as-is
    pub code: String,

    #[serde(default)]
    pub description: String,

    /// Megabytes; 0 means [`DEFAULT_MEMORY_SIZE`]
    #[serde(default)]
    pub memory_size: u32,

    /// Seconds; 0 means [`DEFAULT_TIMEOUT`]
    #[serde(default)]
    pub timeout: u32,

    /// Environment variables of the function process
    #[serde(default)]
    pub variables: BTreeMap<String, String>,

    #[serde(default)]
    pub vpc: Option<VpcConfig>,

    #[serde(default = "default_true")]
    pub enable_xray: bool,

    #[serde(default)]
    pub layers: Vec<String>,

    /// 0 means [`DEFAULT_LOG_RETENTION_DAYS`]
    #[serde(default)]
    pub log_retention_days: u32,

    #[serde(default)]
    pub alerts: Option<AlertConfig>,

    #[serde(default)]
    pub tags: Tags,

    /// Deployment environment, used for the `Environment` tag
    pub environment: String,
}

impl FunctionConfig {
    pub fn new(
        runtime: impl Into<String>,
        handler: impl Into<String>,
        code: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            runtime: runtime.into(),
            handler: handler.into(),
            code: code.into(),
            description: String::new(),
            memory_size: 0,
            timeout: 0,
            variables: BTreeMap::new(),
            vpc: None,
            enable_xray: true,
            layers: Vec::new(),
            log_retention_days: 0,
            alerts: None,
            tags: Tags::new(),
            environment: environment.into(),
        }
    }

    /// Fill unset (zero) sizing and retention fields
    pub fn with_defaults(mut self) -> Self {
        if self.memory_size == 0 {
            self.memory_size = DEFAULT_MEMORY_SIZE;
        }
        if self.timeout == 0 {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.log_retention_days == 0 {
            self.log_retention_days = DEFAULT_LOG_RETENTION_DAYS;
        }
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_vpc(mut self, vpc: VpcConfig) -> Self {
        self.vpc = Some(vpc);
        self
    }

    pub fn with_alerts(mut self, alerts: AlertConfig) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn without_xray(mut self) -> Self {
        self.enable_xray = false;
        self
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: &str| ComponentError::invalid("function", name, reason);
        for (field, value) in [
            ("runtime", &self.runtime),
            ("handler", &self.handler),
            ("code", &self.code),
            ("environment", &self.environment),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(&format!("{} must not be empty", field)));
            }
        }
        if !(DEFAULT_MEMORY_SIZE..=MAX_MEMORY_SIZE).contains(&self.memory_size) {
            return Err(invalid(&format!(
                "memory_size must be between {} and {} MB",
                DEFAULT_MEMORY_SIZE, MAX_MEMORY_SIZE
            )));
        }
        if self.timeout > MAX_TIMEOUT {
            return Err(invalid(&format!(
                "timeout must be at most {} seconds",
                MAX_TIMEOUT
            )));
        }
        if let Some(vpc) = &self.vpc {
            if vpc.subnet_ids.is_empty() {
                return Err(invalid("vpc.subnet_ids must not be empty"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpcConfig {
    pub subnet_ids: Vec<String>,

    #[serde(default)]
    pub security_group_ids: Vec<String>,
}

/// Alarm thresholds; every alarm notifies `notification_arn`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertConfig {
    pub error_threshold: f64,
    pub throttles_threshold: f64,

    /// Average duration in milliseconds
    pub duration_threshold: f64,

    pub notification_arn: String,
}

/// Values other compositions consume; unresolved until apply time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionOutputs {
    pub function_name: String,
    pub function_arn: String,
    pub invoke_arn: String,
    pub log_group_name: String,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub component: NodeRef,
    pub role: NodeRef,
    pub attachments: Vec<NodeRef>,
    pub function: NodeRef,
    pub log_group: NodeRef,
    pub alarms: Vec<NodeRef>,
    pub alias: NodeRef,
    pub outputs: FunctionOutputs,
}

impl Function {
    #[instrument(skip(graph, config), fields(runtime = %config.runtime))]
    pub fn compose(graph: &mut ResourceGraph, name: &str, config: &FunctionConfig) -> Result<Self> {
        let config = config.clone().with_defaults();
        config.validate(name)?;

        let component = graph
            .register_component(kinds::FUNCTION_COMPONENT, name, None)
            .map_err(ComponentError::registration(name))?;
        let tags = merge_tags(&TagDefaults::for_environment(&config.environment), &config.tags);

        let role_name = format!("{}-role", name);
        let role = graph
            .declare(
                Declaration::new(kinds::IAM_ROLE, &role_name)
                    .parent(&component)
                    .property("assume_role_policy", ASSUME_ROLE_POLICY)
                    .tags(&tags),
            )
            .map_err(ComponentError::declaration("role", &role_name))?;

        let mut policies = vec![("basic", BASIC_EXECUTION_POLICY)];
        if config.enable_xray {
            policies.push(("xray", XRAY_POLICY));
        }
        if config.vpc.is_some() {
            policies.push(("vpc", VPC_ACCESS_POLICY));
        }
        let mut attachments = Vec::with_capacity(policies.len());
        for (suffix, policy_arn) in policies {
            let attachment_name = format!("{}-{}", name, suffix);
            let attachment = graph
                .declare(
                    Declaration::new(kinds::IAM_ROLE_POLICY_ATTACHMENT, &attachment_name)
                        .parent(&component)
                        .reference("role", &role, "name")
                        .property("policy_arn", policy_arn),
                )
                .map_err(ComponentError::declaration("policy attachment", &attachment_name))?;
            attachments.push(attachment);
        }

        let tracing_mode = if config.enable_xray {
            "Active"
        } else {
            "PassThrough"
        };
        let mut declaration = Declaration::new(kinds::LAMBDA_FUNCTION, name)
            .parent(&component)
            .reference("role", &role, "arn")
            .property("runtime", config.runtime.as_str())
            .property("handler", config.handler.as_str())
            .property("code", config.code.as_str())
            .property("description", config.description.as_str())
            .property("memory_size", config.memory_size)
            .property("timeout", config.timeout)
            .property("environment", json!({ "variables": config.variables }))
            .property("layers", json!(config.layers))
            .property("tracing_config", json!({ "mode": tracing_mode }))
            .tags(&tags);
        if let Some(vpc) = &config.vpc {
            declaration = declaration.property(
                "vpc_config",
                json!({
                    "subnet_ids": vpc.subnet_ids,
                    "security_group_ids": vpc.security_group_ids,
                }),
            );
        }
        // Attachments must exist before the first invocation
        for attachment in &attachments {
            declaration = declaration.depends_on(attachment);
        }
        let function = graph
            .declare(declaration)
            .map_err(ComponentError::declaration("function", name))?;

        let log_group_name = format!("/aws/lambda/{}", function.output("name"));
        let log_group_resource = format!("{}-logs", name);
        let log_group = graph
            .declare(
                Declaration::new(kinds::LOG_GROUP, &log_group_resource)
                    .parent(&component)
                    .depends_on(&function)
                    .property("name", log_group_name.as_str())
                    .property("retention_in_days", config.log_retention_days)
                    .tags(&tags),
            )
            .map_err(ComponentError::declaration("log group", &log_group_resource))?;

        let alarms = match &config.alerts {
            Some(alerts) => declare_alarms(graph, &component, &function, name, alerts, &tags)?,
            None => Vec::new(),
        };

        let alias_name = format!("{}-{}", name, ALIAS_NAME);
        let alias = graph
            .declare(
                Declaration::new(kinds::LAMBDA_ALIAS, &alias_name)
                    .parent(&component)
                    .property("name", ALIAS_NAME)
                    .reference("function_name", &function, "name")
                    .property("function_version", "$LATEST"),
            )
            .map_err(ComponentError::declaration("alias", &alias_name))?;

        info!(function = %name, alarms = alarms.len(), "composed function");

        let outputs = FunctionOutputs {
            function_name: function.output("name"),
            function_arn: function.output("arn"),
            invoke_arn: function.output("invoke_arn"),
            log_group_name,
        };
        Ok(Self {
            name: name.to_string(),
            component,
            role,
            attachments,
            function,
            log_group,
            alarms,
            alias,
            outputs,
        })
    }
}

fn declare_alarms(
    graph: &mut ResourceGraph,
    component: &NodeRef,
    function: &NodeRef,
    name: &str,
    alerts: &AlertConfig,
    tags: &Tags,
) -> Result<Vec<NodeRef>> {
    let specs = [
        ("errors", "Errors", "Sum", alerts.error_threshold, "error count"),
        ("throttles", "Throttles", "Sum", alerts.throttles_threshold, "throttles"),
        ("duration", "Duration", "Average", alerts.duration_threshold, "duration"),
    ];

    let mut alarms = Vec::with_capacity(specs.len());
    for (suffix, metric, statistic, threshold, label) in specs {
        let alarm_name = format!("{}-{}", name, suffix);
        let alarm = graph
            .declare(
                Declaration::new(kinds::METRIC_ALARM, &alarm_name)
                    .parent(component)
                    .property("comparison_operator", "GreaterThanThreshold")
                    .property("evaluation_periods", 1)
                    .property("metric_name", metric)
                    .property("namespace", "AWS/Lambda")
                    .property("period", ALARM_PERIOD_SECONDS)
                    .property("statistic", statistic)
                    .property("threshold", threshold)
                    .property(
                        "alarm_description",
                        format!("Lambda function {} {}", name, label),
                    )
                    .property("alarm_actions", json!([alerts.notification_arn]))
                    .property(
                        "dimensions",
                        json!({ "FunctionName": function.output("name") }),
                    )
                    .depends_on(function)
                    .tags(tags),
            )
            .map_err(ComponentError::declaration("alarm", &alarm_name))?;
        alarms.push(alarm);
    }
    Ok(alarms)
}
