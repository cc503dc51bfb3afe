// antrian/core/src/pipeline/execution.rs

use crate::error::PipelineError;
use crate::pipeline::context::{ContextData, Handler};
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// A step whose `skip_if` holds is skipped. A non-optional step without any
  /// handler fails the run with `PipelineError::HandlerMissing`. The first
  /// handler error aborts the run and is returned as is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      pipeline_context = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!(
        "pipeline_step_execution",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_if) = &step_def.skip_if {
        if skip_if(ctx_data.clone()) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped due to 'skip_if' condition.");
          continue;
        }
      }

      let handler_count = [&self.before, &self.on, &self.after]
        .iter()
        .map(|phase| phase.get(step_name).map_or(0, Vec::len))
        .sum::<usize>();

      if handler_count == 0 {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        return Err(Err::from(PipelineError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let phases = [("before", &self.before), ("on", &self.on), ("after", &self.after)];
      for (phase_name, phase) in phases {
        let Some(handlers) = phase.get(step_name) else {
          continue;
        };
        let stopped = run_phase(phase_name, handlers, &ctx_data)
          .instrument(step_span.clone())
          .await?;
        if stopped {
          return Ok(PipelineResult::Stopped);
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}

/// Runs one phase's handlers in registration order. `Ok(true)` means a
/// handler asked to stop the pipeline.
async fn run_phase<TData, Err>(
  phase_name: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<bool, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let handler_span = info_span!("step_handler", phase = phase_name, handler_index = handler_idx);
    match handler_fn(ctx_data.clone()).instrument(handler_span).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => {
        event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler.");
        return Ok(true);
      }
      Err(e) => {
        event!(Level::WARN, phase = phase_name, error = %e, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(false)
}
