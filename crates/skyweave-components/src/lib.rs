//! Skyweave Components
//!
//! Flat compositions that sit next to the API front-end in a manifest: a
//! serverless function with its role, logs and alarms, a locked-down storage
//! bucket and a CDN distribution. Each builder fills its defaults, validates
//! the result, merges tags and declares into the shared resource graph.

pub mod bucket;
pub mod distribution;
pub mod error;
pub mod function;

pub use bucket::{BucketConfig, BucketOutputs, SecureBucket};
pub use distribution::{Distribution, DistributionConfig, DistributionOutputs};
pub use error::{ComponentError, Result};
pub use function::{AlertConfig, Function, FunctionConfig, FunctionOutputs, VpcConfig};
