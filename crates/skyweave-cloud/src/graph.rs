//! Resource graph
//!
//! Builders never talk to a provider. They declare resources into a
//! [`ResourceGraph`]: an arena of nodes plus an explicit edge list that the
//! apply engine later walks. A node may only reference nodes declared before
//! it, so declaration order is always a valid creation order and the graph
//! cannot contain cycles.

use crate::error::{CloudError, Result};
use crate::tags::Tags;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Index of a node in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique key of a resource: `type:name`
pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}:{}", resource_type, name)
}

/// Placeholder for an attribute that only exists once the resource is created
pub fn placeholder(key: &str, attribute: &str) -> String {
    format!("${{{}.{}}}", key, attribute)
}

/// Handle to a declared node, threaded into later declarations
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    id: NodeId,
    key: String,
}

impl NodeRef {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Placeholder string for one of this resource's outputs
    pub fn output(&self, attribute: &str) -> String {
        placeholder(&self.key, attribute)
    }

    /// [`NodeRef::output`] as a JSON value
    pub fn attr(&self, attribute: &str) -> Value {
        Value::String(self.output(attribute))
    }
}

/// Why one node points at another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// `from` is owned by the component `to`
    Parent,
    /// `from` must be created after `to`
    DependsOn,
}

/// Directed edge; `from` is the dependent node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// A declared resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceNode {
    pub id: NodeId,

    /// Resource type token (see [`crate::kinds`])
    pub resource_type: String,

    /// Logical name, unique per resource type
    pub name: String,

    /// Owning component, if any
    pub parent: Option<NodeId>,

    /// Logical grouping rather than a provider resource
    pub component: bool,

    /// Resource-specific arguments
    pub properties: Map<String, Value>,
}

impl ResourceNode {
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Get a property as a specific type
    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A resource waiting to be declared
#[derive(Debug, Clone)]
pub struct Declaration {
    resource_type: String,
    name: String,
    parent: Option<NodeId>,
    depends_on: Vec<NodeId>,
    properties: Map<String, Value>,
}

impl Declaration {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            parent: None,
            depends_on: Vec::new(),
            properties: Map::new(),
        }
    }

    pub fn parent(mut self, component: &NodeRef) -> Self {
        self.parent = Some(component.id());
        self
    }

    pub fn depends_on(mut self, node: &NodeRef) -> Self {
        self.depends_on.push(node.id());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a property only when a value is present
    pub fn optional_property<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.property(key, value),
            None => self,
        }
    }

    /// Set a property to another resource's output and depend on that resource
    pub fn reference(self, key: impl Into<String>, target: &NodeRef, attribute: &str) -> Self {
        self.property(key, target.attr(attribute)).depends_on(target)
    }

    pub fn tags(self, tags: &Tags) -> Self {
        let value = tags
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<String, Value>>();
        self.property("tags", Value::Object(value))
    }

    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }
}

/// Arena of declared resources and the edges between them
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceGraph {
    nodes: Vec<ResourceNode>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<String, NodeId>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a logical component that owns the resources declared under it
    pub fn register_component(
        &mut self,
        component_type: &str,
        name: &str,
        parent: Option<&NodeRef>,
    ) -> Result<NodeRef> {
        let mut declaration = Declaration::new(component_type, name);
        if let Some(parent) = parent {
            declaration = declaration.parent(parent);
        }
        self.insert(declaration, true)
    }

    /// Declare a provider resource
    pub fn declare(&mut self, declaration: Declaration) -> Result<NodeRef> {
        self.insert(declaration, false)
    }

    fn insert(&mut self, declaration: Declaration, component: bool) -> Result<NodeRef> {
        let key = declaration.key();
        if self.index.contains_key(&key) {
            return Err(CloudError::ResourceAlreadyExists(key));
        }

        let Declaration {
            resource_type,
            name,
            parent,
            mut depends_on,
            properties,
        } = declaration;

        for id in parent.iter().chain(depends_on.iter()) {
            if id.index() >= self.nodes.len() {
                return Err(CloudError::UnknownNode(id.to_string()));
            }
        }

        let id = NodeId(self.nodes.len());
        if let Some(parent) = parent {
            self.edges.push(Edge {
                from: id,
                to: parent,
                kind: EdgeKind::Parent,
            });
        }
        depends_on.sort();
        depends_on.dedup();
        for dependency in depends_on {
            self.edges.push(Edge {
                from: id,
                to: dependency,
                kind: EdgeKind::DependsOn,
            });
        }

        tracing::debug!(%key, %id, "declared resource");
        self.nodes.push(ResourceNode {
            id,
            resource_type,
            name,
            parent,
            component,
            properties,
        });
        self.index.insert(key.clone(), id);

        Ok(NodeRef { id, key })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.index())
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceNode> {
        self.find(&resource_key(resource_type, name))
            .and_then(|r| self.node(r.id()))
    }

    /// Look up a node by its `type:name` key
    pub fn find(&self, key: &str) -> Option<NodeRef> {
        self.index.get(key).map(|&id| NodeRef {
            id,
            key: key.to_string(),
        })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.iter()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceNode> {
        self.nodes
            .iter()
            .filter(|n| n.resource_type == resource_type)
            .collect()
    }

    /// Direct dependencies of a node (owning component included)
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to)
            .collect()
    }

    /// Whether `from` has a direct `DependsOn` edge to `to`
    pub fn depends_on(&self, from: NodeId, to: NodeId) -> bool {
        self.edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.kind == EdgeKind::DependsOn)
    }

    /// Whether `from` reaches `to` through `DependsOn` edges
    pub fn depends_transitively(&self, from: NodeId, to: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            for edge in self
                .edges
                .iter()
                .filter(|e| e.from == current && e.kind == EdgeKind::DependsOn)
            {
                if edge.to == to {
                    return true;
                }
                if seen.insert(edge.to) {
                    stack.push(edge.to);
                }
            }
        }
        false
    }

    /// Group nodes into waves: every node's dependencies live in earlier waves,
    /// so nodes within one wave can be created in parallel.
    pub fn creation_waves(&self) -> Vec<Vec<NodeId>> {
        let mut depth = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            // Edges always point at earlier nodes, so `depth[to]` is final here
            // once edges are visited in declaration order.
            let candidate = depth[edge.to.index()] + 1;
            if candidate > depth[edge.from.index()] {
                depth[edge.from.index()] = candidate;
            }
        }

        let mut waves: Vec<Vec<NodeId>> = Vec::new();
        for node in &self.nodes {
            let level = depth[node.id.index()];
            if waves.len() <= level {
                waves.resize_with(level + 1, Vec::new);
            }
            waves[level].push(node.id);
        }
        waves
    }
}
