//! Path tree builder
//!
//! Turns independently specified endpoint paths into one shared tree of API
//! resources. Nodes are memoized by cumulative path, so `/users/{id}` and
//! `/users/{id}/profile` share the `/users` and `/users/{id}` nodes no matter
//! which endpoint is wired first.

use crate::error::{GatewayError, Result};
use skyweave_cloud::{Declaration, NodeRef, ResourceGraph, kinds};
use std::collections::HashMap;

/// Non-empty segments of a path. Leading, trailing and doubled separators are
/// ignored, so `/users/`, `/users` and `//users` are the same path.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a path: `/` followed by its segments, or `/` for the root
pub fn normalize_path(path: &str) -> String {
    let segments = split_path(path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// A node of the tree; the root stands for the API's own root resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    segment: String,
    cumulative_path: String,
    parent: Option<String>,
    node: NodeRef,
}

impl PathNode {
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn cumulative_path(&self) -> &str {
        &self.cumulative_path
    }

    /// Cumulative path of the parent node; `None` for the root
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Graph node that provides this node's resource id
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Output of [`PathNode::node`] holding the resource id
    pub fn resource_id_attribute(&self) -> &'static str {
        if self.is_root() {
            "root_resource_id"
        } else {
            "id"
        }
    }
}

/// Memoized resource tree of one REST API
#[derive(Debug, Clone)]
pub struct PathTree {
    api_name: String,
    api: NodeRef,
    component: NodeRef,
    root: PathNode,
    nodes: HashMap<String, PathNode>,
}

impl PathTree {
    /// Empty tree rooted at `api`; created nodes are owned by `component`
    pub fn new(api_name: impl Into<String>, api: &NodeRef, component: &NodeRef) -> Self {
        let root = PathNode {
            segment: String::new(),
            cumulative_path: "/".to_string(),
            parent: None,
            node: api.clone(),
        };
        Self {
            api_name: api_name.into(),
            api: api.clone(),
            component: component.clone(),
            root,
            nodes: HashMap::new(),
        }
    }

    pub fn root(&self) -> &PathNode {
        &self.root
    }

    /// Number of created nodes; the root is not counted
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&PathNode> {
        let path = normalize_path(path);
        if path == "/" {
            Some(&self.root)
        } else {
            self.nodes.get(&path)
        }
    }

    /// Cumulative paths of every created node, sorted
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Return the leaf for `full_path`, declaring every missing ancestor.
    ///
    /// A bare root path returns the root and declares nothing.
    pub fn build_or_reuse(
        &mut self,
        graph: &mut ResourceGraph,
        full_path: &str,
    ) -> Result<PathNode> {
        let mut current = self.root.clone();
        let mut cumulative = String::new();

        for segment in split_path(full_path) {
            cumulative.push('/');
            cumulative.push_str(segment);

            if let Some(existing) = self.nodes.get(&cumulative) {
                tracing::trace!(path = %cumulative, "reusing resource");
                current = existing.clone();
                continue;
            }

            let name = format!("{}-resource{}", self.api_name, cumulative);
            let node = graph
                .declare(
                    Declaration::new(kinds::API_RESOURCE, &name)
                        .parent(&self.component)
                        .reference("rest_api", &self.api, "id")
                        .reference(
                            "parent_id",
                            current.node(),
                            current.resource_id_attribute(),
                        )
                        .property("path_part", segment),
                )
                .map_err(GatewayError::declaration("resource", &cumulative))?;

            let created = PathNode {
                segment: segment.to_string(),
                cumulative_path: cumulative.clone(),
                parent: Some(current.cumulative_path.clone()),
                node,
            };
            tracing::debug!(path = %cumulative, "created resource");
            self.nodes.insert(cumulative.clone(), created.clone());
            current = created;
        }

        Ok(current)
    }
}
