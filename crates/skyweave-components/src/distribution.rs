//! CDN distribution in front of a single custom origin

use crate::error::{ComponentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, TagDefaults, Tags, kinds, merge_tags};
use tracing::{info, instrument};

pub const DEFAULT_TTL: u32 = 86_400;
pub const DEFAULT_MAX_TTL: u32 = 31_536_000;
pub const DEFAULT_PRICE_CLASS: &str = "PriceClass_100";
pub const DEFAULT_VIEWER_PROTOCOL_POLICY: &str = "redirect-to-https";
pub const DEFAULT_ORIGIN_PROTOCOL_POLICY: &str = "https-only";

const ORIGIN_ID: &str = "primary";
const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2021";

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionConfig {
    /// Alternate domain names served by the distribution
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Certificate for `aliases`; required whenever aliases are set
    #[serde(default)]
    pub certificate_arn: Option<String>,

    pub origin_domain: String,

    #[serde(default)]
    pub origin_path: String,

    /// Empty means [`DEFAULT_ORIGIN_PROTOCOL_POLICY`]
    #[serde(default)]
    pub origin_protocol_policy: String,

    /// Seconds; 0 means [`DEFAULT_TTL`]
    #[serde(default)]
    pub default_ttl: u32,

    /// Seconds; 0 means [`DEFAULT_MAX_TTL`]
    #[serde(default)]
    pub max_ttl: u32,

    #[serde(default)]
    pub min_ttl: u32,

    /// Empty means [`DEFAULT_PRICE_CLASS`]
    #[serde(default)]
    pub price_class: String,

    /// Empty means [`DEFAULT_VIEWER_PROTOCOL_POLICY`]
    #[serde(default)]
    pub viewer_protocol_policy: String,

    #[serde(default)]
    pub waf_web_acl_id: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub ipv6_enabled: bool,

    #[serde(default)]
    pub tags: Tags,

    pub environment: String,
}

impl DistributionConfig {
    pub fn new(origin_domain: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            aliases: Vec::new(),
            certificate_arn: None,
            origin_domain: origin_domain.into(),
            origin_path: String::new(),
            origin_protocol_policy: String::new(),
            default_ttl: 0,
            max_ttl: 0,
            min_ttl: 0,
            price_class: String::new(),
            viewer_protocol_policy: String::new(),
            waf_web_acl_id: None,
            enabled: true,
            ipv6_enabled: true,
            tags: Tags::new(),
            environment: environment.into(),
        }
    }

    pub fn alias(mut self, domain: impl Into<String>) -> Self {
        self.aliases.push(domain.into());
        self
    }

    pub fn with_certificate(mut self, certificate_arn: impl Into<String>) -> Self {
        self.certificate_arn = Some(certificate_arn.into());
        self
    }

    /// Fill unset TTLs and policies
    pub fn with_defaults(mut self) -> Self {
        if self.default_ttl == 0 {
            self.default_ttl = DEFAULT_TTL;
        }
        if self.max_ttl == 0 {
            self.max_ttl = DEFAULT_MAX_TTL;
        }
        if self.price_class.is_empty() {
            self.price_class = DEFAULT_PRICE_CLASS.to_string();
        }
        if self.viewer_protocol_policy.is_empty() {
            self.viewer_protocol_policy = DEFAULT_VIEWER_PROTOCOL_POLICY.to_string();
        }
        if self.origin_protocol_policy.is_empty() {
            self.origin_protocol_policy = DEFAULT_ORIGIN_PROTOCOL_POLICY.to_string();
        }
        self
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| ComponentError::invalid("distribution", name, reason);
        if self.origin_domain.trim().is_empty() {
            return Err(invalid("origin_domain must not be empty".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(invalid("environment must not be empty".to_string()));
        }
        if !self.aliases.is_empty() && self.certificate_arn.is_none() {
            return Err(invalid("aliases require a certificate_arn".to_string()));
        }
        if self.min_ttl > self.default_ttl || self.default_ttl > self.max_ttl {
            return Err(invalid(format!(
                "TTLs must satisfy min <= default <= max (got {} / {} / {})",
                self.min_ttl, self.default_ttl, self.max_ttl
            )));
        }
        Ok(())
    }

    fn viewer_certificate(&self) -> Value {
        match &self.certificate_arn {
            Some(arn) => json!({
                "acm_certificate_arn": arn,
                "minimum_protocol_version": MINIMUM_PROTOCOL_VERSION,
                "ssl_support_method": "sni-only",
            }),
            None => json!({ "cloudfront_default_certificate": true }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionOutputs {
    pub domain_name: String,
    pub distribution_id: String,
    pub distribution_arn: String,
}

#[derive(Debug, Clone)]
pub struct Distribution {
    pub name: String,
    pub component: NodeRef,
    pub distribution: NodeRef,
    pub outputs: DistributionOutputs,
}

impl Distribution {
    #[instrument(skip(graph, config), fields(origin = %config.origin_domain))]
    pub fn compose(
        graph: &mut ResourceGraph,
        name: &str,
        config: &DistributionConfig,
    ) -> Result<Self> {
        let config = config.clone().with_defaults();
        config.validate(name)?;

        let component = graph
            .register_component(kinds::DISTRIBUTION_COMPONENT, name, None)
            .map_err(ComponentError::registration(name))?;
        let tags = merge_tags(&TagDefaults::for_environment(&config.environment), &config.tags);

        let origin = json!({
            "origin_id": ORIGIN_ID,
            "domain_name": config.origin_domain,
            "origin_path": config.origin_path,
            "custom_origin_config": {
                "origin_protocol_policy": config.origin_protocol_policy,
                "http_port": 80,
                "https_port": 443,
                "origin_ssl_protocols": ["TLSv1.2"],
            },
        });
        let cache_behavior = json!({
            "target_origin_id": ORIGIN_ID,
            "viewer_protocol_policy": config.viewer_protocol_policy,
            "allowed_methods": ["GET", "HEAD", "OPTIONS"],
            "cached_methods": ["GET", "HEAD"],
            "forwarded_values": {
                "query_string": true,
                "cookies": { "forward": "none" },
            },
            "min_ttl": config.min_ttl,
            "default_ttl": config.default_ttl,
            "max_ttl": config.max_ttl,
            "compress": true,
        });

        let distribution = graph
            .declare(
                Declaration::new(kinds::CLOUDFRONT_DISTRIBUTION, name)
                    .parent(&component)
                    .property("enabled", config.enabled)
                    .property("is_ipv6_enabled", config.ipv6_enabled)
                    .property("price_class", config.price_class.as_str())
                    .property("aliases", json!(config.aliases))
                    .optional_property("web_acl_id", config.waf_web_acl_id.clone())
                    .property("origins", json!([origin]))
                    .property("default_cache_behavior", cache_behavior)
                    .property(
                        "restrictions",
                        json!({ "geo_restriction": { "restriction_type": "none" } }),
                    )
                    .property("viewer_certificate", config.viewer_certificate())
                    .tags(&tags),
            )
            .map_err(ComponentError::declaration("distribution", name))?;

        info!(distribution = %name, aliases = config.aliases.len(), "composed distribution");

        let outputs = DistributionOutputs {
            domain_name: distribution.output("domain_name"),
            distribution_id: distribution.output("id"),
            distribution_arn: distribution.output("arn"),
        };
        Ok(Self {
            name: name.to_string(),
            component,
            distribution,
            outputs,
        })
    }
}
