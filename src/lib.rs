//! # Coterie
//!
//! Sequential multi-agent crew orchestration - a small group with a shared plan.
//!
//! A crew binds agents (personas backed by an LLM) to tasks and runs the tasks
//! in order, feeding earlier outputs to later tasks as context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                              CREW                                │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐      │
//! │  │ Execution Plan │  │ Kickoff Session│  │  Event Channel │      │
//! │  └────────────────┘  └────────────────┘  └────────────────┘      │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │  tasks in order
//!          ┌──────────────────────┼──────────────────────┐
//!          ▼                      ▼                      ▼
//!   ┌─────────────┐        ┌─────────────┐        ┌─────────────┐
//!   │   Task 1    │        │   Task 2    │        │   Task 3    │
//!   │  (Agent A)  │        │  (Agent B)  │        │  (Agent C)  │
//!   └──────┬──────┘        └──────┬──────┘        └──────▲──────┘
//!          │                      │     context          │
//!          └──────────────────────┴──────────────────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Agent**: role, goal and backstory for one automated actor
//! - **Task**: a description and expected output owned by one agent
//! - **Crew**: agents and tasks under a [`Process`]
//! - **Kickoff**: runs the crew and returns a [`CrewOutput`]
//!
//! ```no_run
//! use std::sync::Arc;
//! use coterie::{Agent, Crew, CrewSettings, Process, Task};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = CrewSettings::load(None)?;
//! let llm = Arc::new(settings.llm.client()?);
//!
//! let analyst = Agent::builder()
//!     .role("Analyst")
//!     .goal("Analyze power demand")
//!     .backstory("You study energy use.")
//!     .build()?;
//! let research = Task::builder()
//!     .description("Research AI power demand.")
//!     .expected_output("A short summary.")
//!     .agent(&analyst)
//!     .build()?;
//!
//! let crew = Crew::builder()
//!     .agents([analyst])
//!     .tasks([research])
//!     .process(Process::Sequential)
//!     .llm(llm)
//!     .build()?;
//!
//! println!("{}", crew.kickoff().await?);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod channel;
pub mod config;
pub mod crew;
pub mod delegation;
pub mod error;
pub mod llm;
pub mod logging;
pub mod plan;
pub mod prompt;
pub mod protocol;
pub mod session;
pub mod task;

pub use agent::{Agent, AgentBuilder, AgentHandle};
pub use channel::EventChannel;
pub use config::CrewSettings;
pub use crew::{Crew, CrewBuilder, CrewOutput, Process};
pub use error::CrewError;
pub use llm::{ChatMessage, LlmClient, LlmError, LlmResponse, OpenAiClient, ScriptedLlm};
pub use plan::ExecutionPlan;
pub use protocol::{AgentId, CrewId, Event, TaskId, TokenUsage};
pub use task::{Task, TaskBuilder, TaskOutput};
