//! Skyweave Cloud
//!
//! Shared foundation for every Skyweave builder: the resource graph that
//! compositions declare into, resource type tokens, tag defaults, and the
//! apply-engine abstraction that eventually realizes the graph.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  Skyweave CLI                    │
//! │        (weave validate/plan/apply/outputs)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │        skyweave-gateway / skyweave-components    │
//! │         (declare resources into the graph)       │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                 skyweave-cloud                   │
//! │  ┌──────────────┐  ┌──────────────┐             │
//! │  │ResourceGraph │  │  Tag Merger  │             │
//! │  └──────────────┘  └──────────────┘             │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait ApplyEngine { plan, apply }        │   │
//! │  └──────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod action;
pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod kinds;
pub mod tags;

// Re-exports
pub use action::{Action, ActionResult, ActionType, ApplyResult, Plan, PlanSummary};
pub use context::ProviderContext;
pub use engine::{ApplyEngine, DryRunEngine};
pub use error::{CloudError, Result};
pub use graph::{
    Declaration, Edge, EdgeKind, NodeId, NodeRef, ResourceGraph, ResourceNode, placeholder,
    resource_key,
};
pub use tags::{MANAGED_BY, TagDefaults, Tags, merge_tags};
