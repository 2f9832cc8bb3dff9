//! Private, encrypted, versioned storage bucket

use crate::error::{ComponentError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, TagDefaults, Tags, kinds, merge_tags};
use tracing::info;

const SSE_ALGORITHM: &str = "AES256";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    /// Globally unique bucket name
    pub bucket_name: String,

    pub environment: String,

    #[serde(default)]
    pub tags: Tags,
}

impl BucketConfig {
    pub fn new(bucket_name: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            environment: environment.into(),
            tags: Tags::new(),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.environment.trim().is_empty() {
            return Err(ComponentError::invalid(
                "bucket",
                name,
                "environment must not be empty",
            ));
        }
        check_bucket_name(&self.bucket_name)
            .map_err(|reason| ComponentError::invalid("bucket", name, reason))
    }
}

/// 3-63 characters of lowercase letters, digits, `-` and `.`, starting and
/// ending with a letter or digit
fn check_bucket_name(bucket_name: &str) -> std::result::Result<(), String> {
    if !(3..=63).contains(&bucket_name.len()) {
        return Err(format!(
            "bucket_name '{}' must be 3 to 63 characters long",
            bucket_name
        ));
    }
    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !bucket_name
        .chars()
        .all(|c| valid_char(c) || c == '-' || c == '.')
    {
        return Err(format!(
            "bucket_name '{}' may only contain lowercase letters, digits, '-' and '.'",
            bucket_name
        ));
    }
    let edges_ok = bucket_name.chars().next().is_some_and(valid_char)
        && bucket_name.chars().last().is_some_and(valid_char);
    if !edges_ok {
        return Err(format!(
            "bucket_name '{}' must start and end with a letter or digit",
            bucket_name
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketOutputs {
    pub bucket_arn: String,
}

#[derive(Debug, Clone)]
pub struct SecureBucket {
    pub name: String,
    pub component: NodeRef,
    pub bucket: NodeRef,
    pub outputs: BucketOutputs,
}

impl SecureBucket {
    pub fn compose(graph: &mut ResourceGraph, name: &str, config: &BucketConfig) -> Result<Self> {
        config.validate(name)?;

        let component = graph
            .register_component(kinds::BUCKET_COMPONENT, name, None)
            .map_err(ComponentError::registration(name))?;
        let tags = merge_tags(&TagDefaults::for_environment(&config.environment), &config.tags);

        let bucket = graph
            .declare(
                Declaration::new(kinds::S3_BUCKET, name)
                    .parent(&component)
                    .property("bucket", config.bucket_name.as_str())
                    .property(
                        "server_side_encryption_configuration",
                        json!({
                            "rule": {
                                "apply_server_side_encryption_by_default": {
                                    "sse_algorithm": SSE_ALGORITHM
                                }
                            }
                        }),
                    )
                    .property("versioning", json!({ "enabled": true }))
                    .property("block_public_acls", true)
                    .property("block_public_policy", true)
                    .property("ignore_public_acls", true)
                    .property("restrict_public_buckets", true)
                    .tags(&tags),
            )
            .map_err(ComponentError::declaration("bucket", name))?;

        info!(bucket = %config.bucket_name, "composed bucket");

        let outputs = BucketOutputs {
            bucket_arn: bucket.output("arn"),
        };
        Ok(Self {
            name: name.to_string(),
            component,
            bucket,
            outputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_defaults() {
        let mut graph = ResourceGraph::new();
        let bucket = SecureBucket::compose(
            &mut graph,
            "assets",
            &BucketConfig::new("shop-assets-prod", "production"),
        )
        .unwrap();

        let node = graph.node(bucket.bucket.id()).unwrap();
        for flag in [
            "block_public_acls",
            "block_public_policy",
            "ignore_public_acls",
            "restrict_public_buckets",
        ] {
            assert_eq!(node.property(flag), Some(&json!(true)), "{flag}");
        }
        assert_eq!(node.property("versioning"), Some(&json!({ "enabled": true })));
        assert_eq!(
            node.property("server_side_encryption_configuration")
                .and_then(|v| v.pointer("/rule/apply_server_side_encryption_by_default/sse_algorithm")),
            Some(&json!("AES256"))
        );
        assert_eq!(bucket.outputs.bucket_arn, "${aws:s3/Bucket:assets.arn}");
    }

    #[test]
    fn test_tag_overrides() {
        let mut graph = ResourceGraph::new();
        let mut config = BucketConfig::new("shop-assets", "dev");
        config.tags.insert("ManagedBy".to_string(), "platform".to_string());
        let bucket = SecureBucket::compose(&mut graph, "assets", &config).unwrap();

        let tags = graph
            .node(bucket.bucket.id())
            .unwrap()
            .get_property::<Tags>("tags")
            .unwrap();
        assert_eq!(tags["ManagedBy"], "platform");
        assert_eq!(tags["Environment"], "dev");
    }

    #[test]
    fn test_bucket_names() {
        assert!(check_bucket_name("my.bucket-1").is_ok());
        assert!(check_bucket_name("ab").is_err());
        assert!(check_bucket_name("Upper").is_err());
        assert!(check_bucket_name("-leading").is_err());
        assert!(check_bucket_name("trailing.").is_err());
    }
}
