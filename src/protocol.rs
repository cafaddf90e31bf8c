//! Identifiers, usage counters and progress events shared across the crate

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier of an agent
    AgentId
);
define_id!(
    /// Unique identifier of a task
    TaskId
);
define_id!(
    /// Unique identifier of a crew
    CrewId
);

/// Token accounting reported by LLM providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Number of completed LLM requests
    pub successful_requests: u64,
}

impl TokenUsage {
    /// Fold another usage record into this one
    pub fn add(&mut self, other: &TokenUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.total_tokens += other.total_tokens;
        self.successful_requests += other.successful_requests;
    }
}

/// Progress events published during a kickoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    CrewStarted {
        crew_id: CrewId,
        task_count: usize,
    },
    TaskStarted {
        crew_id: CrewId,
        task_id: TaskId,
        agent_role: String,
    },
    /// A reply produced by an agent, intermediate or final
    AgentMessage {
        crew_id: CrewId,
        agent_id: AgentId,
        content: String,
    },
    Delegated {
        crew_id: CrewId,
        from: AgentId,
        to: AgentId,
        question: String,
    },
    TaskCompleted {
        crew_id: CrewId,
        task_id: TaskId,
        summary: String,
    },
    CrewCompleted {
        crew_id: CrewId,
        usage: TokenUsage,
    },
}

impl Event {
    /// Crew the event belongs to
    pub fn crew_id(&self) -> CrewId {
        match self {
            Event::CrewStarted { crew_id, .. }
            | Event::TaskStarted { crew_id, .. }
            | Event::AgentMessage { crew_id, .. }
            | Event::Delegated { crew_id, .. }
            | Event::TaskCompleted { crew_id, .. }
            | Event::CrewCompleted { crew_id, .. } => *crew_id,
        }
    }
}
