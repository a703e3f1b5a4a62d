// core/src/core/context.rs

//! The boxed handler type every pipeline step stores.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A step handler.
///
/// Handlers take a clone of the run's `ContextData<TData>` and resolve to
/// `Result<PipelineControl, Err>`. Lock guards taken inside a handler must be
/// dropped before the handler awaits anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
