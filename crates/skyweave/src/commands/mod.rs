pub mod apply;
pub mod outputs;
pub mod plan;
pub mod validate;
