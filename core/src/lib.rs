// core/src/lib.rs

//! Small asynchronous workflow engine used by the bookstore backend.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step owns one or
//! more handlers that receive a clone of the shared [`ContextData`], read or
//! stage values on it, and tell the engine whether to keep going. The first
//! handler error aborts the run, so later steps never observe a half-checked
//! context.
//!
//! [`Workflows`] keys registered pipelines by their context type, which lets
//! HTTP handlers run "the profile update workflow" by building its context and
//! nothing more.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::WorkflowError;

pub use crate::registry::Workflows;
