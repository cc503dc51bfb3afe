// antrian/core/src/registry.rs

//! A type-keyed registry of pipelines. Each operation registers one pipeline
//! over its own context type, and callers dispatch by handing over a
//! `ContextData` of that type.

use crate::error::PipelineError;
use crate::pipeline::{ContextData, Pipeline, PipelineResult};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

pub struct Registry<E>
where
  E: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pipelines: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
  _error: PhantomData<fn() -> E>,
}

impl<E> Registry<E>
where
  E: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      pipelines: RwLock::new(HashMap::new()),
      _error: PhantomData,
    }
  }

  /// Registers `pipeline` for contexts of type `TData`, replacing any
  /// previous registration for that type.
  pub fn register_pipeline<TData>(&self, pipeline: Pipeline<TData, E>)
  where
    TData: 'static + Send + Sync,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<TData>(), "Registering pipeline.");
    self
      .pipelines
      .write()
      .insert(TypeId::of::<TData>(), Arc::new(pipeline));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.pipelines.read().contains_key(&TypeId::of::<TData>())
  }

  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, E>
  where
    TData: 'static + Send + Sync,
  {
    let context_type = std::any::type_name::<TData>();
    let entry = self
      .pipelines
      .read()
      .get(&TypeId::of::<TData>())
      .cloned()
      .ok_or_else(|| {
        event!(Level::ERROR, context_type, "No pipeline registered.");
        PipelineError::NotRegistered {
          context_type: context_type.to_string(),
        }
      })?;

    let pipeline = entry
      .downcast::<Pipeline<TData, E>>()
      .map_err(|_| PipelineError::TypeMismatch {
        expected_type: std::any::type_name::<Pipeline<TData, E>>().to_string(),
      })?;

    pipeline.run(ctx_data).await
  }
}

impl<E> Default for Registry<E>
where
  E: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
