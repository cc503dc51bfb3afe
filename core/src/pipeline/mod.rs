// antrian/core/src/pipeline/mod.rs

//! A small named-step pipeline engine. Every mutating queue operation
//! (checkout, status transition, payment confirmation) is expressed as a
//! `Pipeline` over its own context type and dispatched through a
//! [`Registry`](crate::registry::Registry).

pub mod context;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use context::{ContextData, Handler};
pub use control::{PipelineControl, PipelineResult};
pub use definition::Pipeline;
pub use step::{SkipCondition, StepDef};
