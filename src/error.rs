//! Crew error types

use thiserror::Error;

use crate::llm::LlmError;
use crate::protocol::{AgentId, TaskId};

/// Errors that can occur while building or running a crew
#[derive(Debug, Error)]
pub enum CrewError {
    /// A crew needs at least one agent and one task
    #[error("Crew has no {0}")]
    EmptyCrew(&'static str),

    /// Task is owned by an agent that is not part of the crew
    #[error("Task {task} is owned by agent '{role}' which is not in the crew")]
    UnknownAgent { task: TaskId, role: String },

    /// Same agent listed twice
    #[error("Agent {0} is listed more than once")]
    DuplicateAgent(AgentId),

    /// Two agents share a role
    #[error("More than one agent has role '{0}'")]
    DuplicateRole(String),

    /// Same task listed twice
    #[error("Task {0} is listed more than once")]
    DuplicateTask(TaskId),

    /// Context names a task outside the crew
    #[error("Task {task} takes context from task {context} which is not in the crew")]
    UnknownContext { task: TaskId, context: TaskId },

    /// Context names a task that does not run earlier
    #[error("Task {task} takes context from task {context} which does not run before it")]
    ForwardContext { task: TaskId, context: TaskId },

    /// Agent has no model and the crew has no default
    #[error("Agent '{0}' has no LLM and the crew has no default LLM")]
    MissingLlm(String),

    /// Hierarchical process without a manager
    #[error("Hierarchical process needs a manager agent or a crew LLM")]
    MissingManager,

    /// Model returned nothing usable
    #[error("Task {task} produced an empty output")]
    EmptyOutput { task: TaskId },

    /// Invalid agent, task or settings values
    #[error("Configuration error: {0}")]
    Config(String),

    /// LLM call failed
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}
