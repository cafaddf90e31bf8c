//! Per-kickoff runtime state

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::protocol::{CrewId, Event, TaskId, TokenUsage};
use crate::task::TaskOutput;

/// State of a single kickoff: finished outputs, usage and the event sink
pub struct KickoffSession {
    crew_id: CrewId,
    /// Finished outputs by task
    outputs: RwLock<HashMap<TaskId, TaskOutput>>,
    /// Completion order
    completed: RwLock<Vec<TaskId>>,
    usage: RwLock<TokenUsage>,
    event_tx: Option<mpsc::UnboundedSender<Event>>,
}

impl KickoffSession {
    pub fn new(crew_id: CrewId, event_tx: Option<mpsc::UnboundedSender<Event>>) -> Self {
        debug!(crew_id = %crew_id, "Creating kickoff session");

        Self {
            crew_id,
            outputs: RwLock::new(HashMap::new()),
            completed: RwLock::new(Vec::new()),
            usage: RwLock::new(TokenUsage::default()),
            event_tx,
        }
    }

    pub fn crew_id(&self) -> CrewId {
        self.crew_id
    }

    /// Publish an event if anyone is listening
    pub fn emit(&self, event: Event) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    pub fn record_usage(&self, usage: &TokenUsage) {
        self.usage.write().add(usage);
    }

    pub fn usage(&self) -> TokenUsage {
        *self.usage.read()
    }

    /// Store a finished output
    pub fn record_output(&self, output: TaskOutput) {
        let task_id = output.task_id;
        let summary = output.summary.clone();
        self.outputs.write().insert(task_id, output);
        self.completed.write().push(task_id);

        self.emit(Event::TaskCompleted {
            crew_id: self.crew_id,
            task_id,
            summary,
        });
        info!(crew_id = %self.crew_id, task_id = %task_id, "Task completed");
    }

    pub fn output(&self, task_id: &TaskId) -> Option<TaskOutput> {
        self.outputs.read().get(task_id).cloned()
    }

    /// Outputs of the given tasks, skipping any not yet finished
    pub fn outputs_for(&self, task_ids: &[TaskId]) -> Vec<TaskOutput> {
        let outputs = self.outputs.read();
        task_ids.iter().filter_map(|id| outputs.get(id).cloned()).collect()
    }

    /// Every finished output in completion order
    pub fn completed_outputs(&self) -> Vec<TaskOutput> {
        let outputs = self.outputs.read();
        self.completed
            .read()
            .iter()
            .filter_map(|id| outputs.get(id).cloned())
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.read().len()
    }
}
