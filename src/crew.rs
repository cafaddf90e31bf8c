//! Crew - binds agents and tasks under a process and runs them

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, instrument};

use crate::agent::{Agent, AgentHandle, WorkContext};
use crate::error::CrewError;
use crate::llm::LlmClient;
use crate::plan::ExecutionPlan;
use crate::prompt::PromptTemplate;
use crate::protocol::{AgentId, CrewId, Event, TaskId, TokenUsage};
use crate::session::KickoffSession;
use crate::task::{Task, TaskOutput};

const MANAGER_ROLE: &str = "Crew Manager";
const MANAGER_GOAL: &str =
    "Manage the team to complete the task in the best way possible.";
const MANAGER_BACKSTORY: &str = "You are a seasoned manager with a knack for getting the best out of your team. \
You are known for your ability to delegate work to the right people, and to ask the right questions to get the best out of your team.";

/// How tasks are carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Tasks run in list order, each by its own agent
    #[default]
    Sequential,
    /// A manager works every task, delegating to the crew
    Hierarchical,
}

/// Aggregate result of a kickoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Output of the final task
    pub raw: String,
    /// Every task output in execution order
    pub tasks_output: Vec<TaskOutput>,
    pub token_usage: TokenUsage,
}

impl CrewOutput {
    pub fn task_output(&self, task_id: &TaskId) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|o| &o.task_id == task_id)
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A validated group of agents and tasks
pub struct Crew {
    pub id: CrewId,
    agents: Vec<AgentHandle>,
    tasks: Vec<Task>,
    process: Process,
    verbose: bool,
    llm: Option<Arc<dyn LlmClient>>,
    manager: Option<AgentHandle>,
    plan: ExecutionPlan,
    event_tx: Option<mpsc::UnboundedSender<Event>>,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::default()
    }

    pub fn agents(&self) -> &[AgentHandle] {
        &self.agents
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    /// Manager agent of a hierarchical crew
    pub fn manager(&self) -> Option<&AgentHandle> {
        self.manager.as_ref()
    }

    /// Run every task and return the aggregate output
    pub async fn kickoff(&self) -> Result<CrewOutput, CrewError> {
        self.kickoff_with_inputs(&HashMap::new()).await
    }

    /// Run with `{name}` placeholders in agents and tasks filled from `inputs`
    #[instrument(skip_all, fields(crew_id = %self.id, process = ?self.process))]
    pub async fn kickoff_with_inputs(
        &self,
        inputs: &HashMap<String, String>,
    ) -> Result<CrewOutput, CrewError> {
        let (agents, tasks) = self.prepare(inputs);
        let session = KickoffSession::new(self.id, self.event_tx.clone());

        info!(crew_id = %self.id, tasks = tasks.len(), agents = agents.len(), "Crew kickoff");
        session.emit(Event::CrewStarted {
            crew_id: self.id,
            task_count: tasks.len(),
        });

        // prepare keeps every task id, so each planned id resolves
        let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
        for task in self.plan.order().iter().filter_map(|id| by_id.get(id)) {
            self.run_task(task, &agents, &session).await?;
        }

        let tasks_output = session.completed_outputs();
        let raw = tasks_output
            .last()
            .map(|o| o.raw.clone())
            .ok_or(CrewError::EmptyCrew("tasks"))?;
        let token_usage = session.usage();

        session.emit(Event::CrewCompleted {
            crew_id: self.id,
            usage: token_usage,
        });
        info!(
            crew_id = %self.id,
            total_tokens = token_usage.total_tokens,
            requests = token_usage.successful_requests,
            "Crew finished"
        );

        Ok(CrewOutput {
            raw,
            tasks_output,
            token_usage,
        })
    }

    fn prepare(&self, inputs: &HashMap<String, String>) -> (Vec<AgentHandle>, Vec<Task>) {
        if inputs.is_empty() {
            return (self.agents.clone(), self.tasks.clone());
        }

        let agents: Vec<AgentHandle> = self
            .agents
            .iter()
            .map(|a| AgentHandle::new(a.interpolated(inputs)))
            .collect();
        let by_id: HashMap<AgentId, AgentHandle> =
            agents.iter().map(|a| (a.id(), a.clone())).collect();

        let tasks = self
            .tasks
            .iter()
            .map(|t| {
                let mut task = t.interpolated(inputs);
                if let Some(agent) = by_id.get(&t.agent.id()) {
                    task.agent = agent.clone();
                }
                task
            })
            .collect();

        (agents, tasks)
    }

    async fn run_task(
        &self,
        task: &Task,
        agents: &[AgentHandle],
        session: &KickoffSession,
    ) -> Result<(), CrewError> {
        session.emit(Event::TaskStarted {
            crew_id: self.id,
            task_id: task.id,
            agent_role: task.agent.role.clone(),
        });
        if self.verbose || task.agent.verbose {
            info!(task_id = %task.id, agent = %task.agent.role, "Working on: {}", task.description);
        }

        let context = match self.plan.context(&task.id) {
            Some(ids) => session.outputs_for(ids),
            None => session.completed_outputs(),
        };
        let context_refs: Vec<&TaskOutput> = context.iter().collect();
        let prompt =
            PromptTemplate::task_prompt(&task.description, &task.expected_output, &context_refs);

        let worker = match (self.process, &self.manager) {
            (Process::Hierarchical, Some(manager)) => manager,
            _ => &task.agent,
        };
        let ctx = WorkContext {
            session,
            default_llm: self.llm.as_ref(),
            coworkers: agents,
            verbose: self.verbose,
        };

        let raw = worker.execute(prompt, &ctx).await?;
        if raw.trim().is_empty() {
            return Err(CrewError::EmptyOutput { task: task.id });
        }

        session.record_output(TaskOutput::new(task, raw));
        Ok(())
    }
}

/// Builder for [`Crew`]
#[derive(Default)]
pub struct CrewBuilder {
    agents: Vec<AgentHandle>,
    tasks: Vec<Task>,
    process: Process,
    verbose: bool,
    llm: Option<Arc<dyn LlmClient>>,
    manager: Option<AgentHandle>,
    event_tx: Option<mpsc::UnboundedSender<Event>>,
}

impl CrewBuilder {
    pub fn agents<I>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = AgentHandle>,
    {
        self.agents = agents.into_iter().collect();
        self
    }

    pub fn tasks<I>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = Task>,
    {
        self.tasks = tasks.into_iter().collect();
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Default model for agents without their own
    pub fn llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Manager for the hierarchical process
    pub fn manager(mut self, manager: AgentHandle) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Publish progress events to this sender
    pub fn event_sender(mut self, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Validate the configuration and build the crew
    pub fn build(self) -> Result<Crew, CrewError> {
        let plan = ExecutionPlan::build(&self.agents, &self.tasks)?;

        if self.llm.is_none() {
            if let Some(agent) = self.agents.iter().find(|a| a.llm().is_none()) {
                return Err(CrewError::MissingLlm(agent.role.clone()));
            }
        }

        let manager = match self.process {
            Process::Sequential => None,
            Process::Hierarchical => Some(self.resolve_manager()?),
        };

        let crew = Crew {
            id: CrewId::new(),
            agents: self.agents,
            tasks: self.tasks,
            process: self.process,
            verbose: self.verbose,
            llm: self.llm,
            manager,
            plan,
            event_tx: self.event_tx,
        };
        info!(crew_id = %crew.id, process = ?crew.process, tasks = crew.plan.len(), "Crew assembled");
        Ok(crew)
    }

    fn resolve_manager(&self) -> Result<AgentHandle, CrewError> {
        match &self.manager {
            Some(manager) => {
                if self.agents.iter().any(|a| a.id() == manager.id()) {
                    return Err(CrewError::Config(format!(
                        "manager '{}' must not also be listed as a crew agent",
                        manager.role
                    )));
                }
                if manager.llm().is_none() && self.llm.is_none() {
                    return Err(CrewError::MissingLlm(manager.role.clone()));
                }
                Ok(AgentHandle::new(manager.as_manager()))
            }
            None => {
                let llm = self.llm.clone().ok_or(CrewError::MissingManager)?;
                Agent::builder()
                    .role(MANAGER_ROLE)
                    .goal(MANAGER_GOAL)
                    .backstory(MANAGER_BACKSTORY)
                    .allow_delegation(true)
                    .verbose(self.verbose)
                    .llm(llm)
                    .build()
            }
        }
    }
}
