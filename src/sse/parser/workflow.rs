//! Workflow-family event parsing.
//!
//! The six workflow lifecycle events share one payload shape; the kind
//! decides the variant and everything else stays in the opaque `data` map.

use serde_json::Value;

use crate::sse::events::StreamEvent;
use crate::sse::payloads::WorkflowEventPayload;

pub(super) fn parse_workflow_event(kind: &str, value: Value) -> Result<StreamEvent, serde_json::Error> {
    let payload: WorkflowEventPayload = serde_json::from_value(value)?;
    let WorkflowEventPayload {
        task_id,
        workflow_run_id,
        data,
    } = payload;

    let event = match kind {
        "workflow_finished" => StreamEvent::WorkflowFinished {
            task_id,
            workflow_run_id,
            data,
        },
        "node_started" => StreamEvent::NodeStarted {
            task_id,
            workflow_run_id,
            data,
        },
        "node_finished" => StreamEvent::NodeFinished {
            task_id,
            workflow_run_id,
            data,
        },
        "parallel_branch_started" => StreamEvent::ParallelBranchStarted {
            task_id,
            workflow_run_id,
            data,
        },
        "parallel_branch_finished" => StreamEvent::ParallelBranchFinished {
            task_id,
            workflow_run_id,
            data,
        },
        _ => StreamEvent::WorkflowStarted {
            task_id,
            workflow_run_id,
            data,
        },
    };
    Ok(event)
}
