// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use workflow::{ContextData, Pipeline, PipelineControl, PipelineResult, WorkflowError};

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[
    ("stamp", false, None),
    ("stage_name", false, None),
    ("apply", false, None),
  ]);

  pipeline.on_root("stamp", staging_handler("stamp", "updated_at"));
  pipeline.on_root("stage_name", staging_handler("stage_name", "full_name"));
  pipeline.on_root("apply", staging_handler("apply", "write"));

  let ctx = ContextData::new(StagingContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.staged, vec!["updated_at", "full_name", "write"]);
  assert_eq!(guard.steps_executed, vec!["stamp", "stage_name", "apply"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[
    ("first", false, None),
    ("halt", false, None),
    ("never", false, None),
  ]);

  pipeline.on_root("first", staging_handler("first", "a"));
  pipeline.on_root("halt", staging_handler("halt", "b"));
  pipeline.on_root("never", staging_handler("never", "c"));

  let ctx = ContextData::new(StagingContext {
    stop_at: Some("halt".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.steps_executed, vec!["first", "halt"]);
  assert_eq!(guard.staged, vec!["a", "b"]);
}

#[tokio::test]
#[serial]
async fn test_first_failure_aborts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[
    ("check_email", false, None),
    ("check_password", false, None),
    ("apply_update", false, None),
  ]);

  pipeline.on_root("check_email", staging_handler("check_email", "email"));
  pipeline.on_root("check_password", failing_handler("check_password", "current password incorrect"));
  pipeline.on_root("apply_update", staging_handler("apply_update", "write"));

  let ctx = ContextData::new(StagingContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(
    result.unwrap_err(),
    TestError::Handler("current password incorrect".to_string())
  );
  let guard = ctx.read();
  assert_eq!(guard.steps_executed, vec!["check_email", "check_password"]);
  assert!(!guard.staged.contains(&"write".to_string()));
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[
    ("step1", false, None),
    (
      "only_when_empty",
      false,
      Some(Arc::new(|ctx: ContextData<StagingContext>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  pipeline.on_root("step1", staging_handler("step1", "one"));
  pipeline.on_root("only_when_empty", staging_handler("only_when_empty", "skipped"));
  pipeline.on_root("step3", staging_handler("step3", "three"));

  let ctx = ContextData::new(StagingContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  let guard = ctx.read();
  assert_eq!(guard.staged, vec!["one", "three"]);
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_missing_handler_fails() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<StagingContext, TestError>::new(&[("present", false, None), ("missing", false, None)]);
  pipeline.on_root("present", staging_handler("present", "x"));

  let ctx = ContextData::new(StagingContext::default());
  match pipeline.run(ctx.clone()).await {
    Err(TestError::Workflow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Workflow(HandlerMissing), got {:?}", other),
  }
  assert_eq!(ctx.read().steps_executed, vec!["present"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_missing_handler_succeeds() {
  setup_tracing();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[
    ("required", false, None),
    ("notify", true, None),
    ("after", false, None),
  ]);
  pipeline.on_root("required", staging_handler("required", "r"));
  pipeline.on_root("after", staging_handler("after", "a"));

  let ctx = ContextData::new(StagingContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["required", "after"]);
}

#[tokio::test]
#[serial]
async fn test_multiple_handlers_on_one_step_run_in_registration_order() {
  setup_tracing();
  reset_counters();
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[("stage", false, None)]);
  pipeline.on_root("stage", staging_handler("stage", "first"));
  pipeline.on_root("stage", |ctx: ContextData<StagingContext>| {
    Box::pin(async move {
      HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      ctx.write().staged.push("second".to_string());
      Ok::<PipelineControl, WorkflowError>(PipelineControl::Continue)
    })
  });

  let ctx = ContextData::new(StagingContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().staged, vec!["first", "second"]);
  assert_eq!(HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<StagingContext, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("unknown", staging_handler("unknown", "x"));
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_workflow_error_type() {
  setup_tracing();
  let mut failing = Pipeline::<StagingContext, WorkflowError>::new(&[("fail_task", false, None)]);
  failing.on_root("fail_task", |_ctx| {
    Box::pin(async move { Err(WorkflowError::Internal("Intentional failure".to_string())) })
  });

  let result = failing.run(ContextData::new(StagingContext::default())).await;
  match result {
    Err(WorkflowError::Internal(s)) => assert_eq!(s, "Intentional failure"),
    other => panic!("Expected WorkflowError::Internal, got {:?}", other),
  }
}
