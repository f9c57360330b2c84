//! Tool System - descriptors, argument binding, registry and the map catalog

pub mod args;
pub mod catalog;
mod definition;
mod error;
mod registry;

pub use args::{BindError, BoundArgs, bind, coerce};
pub use catalog::standard_registry;
pub use definition::{Constraint, ParamKind, ParamSpec, ToolDescriptor};
pub use error::{AdapterError, ToolError};
pub use registry::{Invocation, ToolHandler, ToolRegistry};
