//! Agent implementation - a persona that works tasks through an LLM

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::config::AgentSettings;
use crate::delegation::{extract_final_answer, parse_reply, AgentReply};
use crate::error::CrewError;
use crate::llm::{ChatMessage, LlmClient};
use crate::prompt::PromptTemplate;
use crate::protocol::{AgentId, Event};
use crate::session::KickoffSession;
use crate::task::interpolate;

/// Rounds an agent may spend before it is told to answer
pub const DEFAULT_MAX_ITER: usize = 5;

/// A single crew member
#[derive(Clone)]
pub struct Agent {
    /// Unique identifier
    pub id: AgentId,
    /// Role, also the name coworkers use to address this agent
    pub role: String,
    /// What the agent is trying to achieve
    pub goal: String,
    /// Persona text
    pub backstory: String,
    /// Log progress at info level
    pub verbose: bool,
    /// May hand questions to coworkers
    pub allow_delegation: bool,
    /// Delegation rounds before a final answer is forced
    pub max_iter: usize,
    /// Model override; the crew default is used otherwise
    llm: Option<Arc<dyn LlmClient>>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("goal", &self.goal)
            .field("verbose", &self.verbose)
            .field("allow_delegation", &self.allow_delegation)
            .field("max_iter", &self.max_iter)
            .field("llm", &self.llm.as_ref().map(|llm| llm.model().to_string()))
            .finish()
    }
}

/// Shared state for one agent invocation
pub(crate) struct WorkContext<'a> {
    pub session: &'a KickoffSession,
    pub default_llm: Option<&'a Arc<dyn LlmClient>>,
    pub coworkers: &'a [AgentHandle],
    pub verbose: bool,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Model override, if any
    pub fn llm(&self) -> Option<&Arc<dyn LlmClient>> {
        self.llm.as_ref()
    }

    /// Copy with `{name}` placeholders filled from `inputs`; the id is kept
    pub fn interpolated(&self, inputs: &HashMap<String, String>) -> Agent {
        Agent {
            role: interpolate(&self.role, inputs),
            goal: interpolate(&self.goal, inputs),
            backstory: interpolate(&self.backstory, inputs),
            ..self.clone()
        }
    }

    /// Copy that may delegate, for use as a hierarchical manager; the id is kept
    pub(crate) fn as_manager(&self) -> Agent {
        Agent {
            allow_delegation: true,
            ..self.clone()
        }
    }

    fn resolve_llm<'a>(
        &'a self,
        default_llm: Option<&'a Arc<dyn LlmClient>>,
    ) -> Result<&'a Arc<dyn LlmClient>, CrewError> {
        self.llm
            .as_ref()
            .or(default_llm)
            .ok_or_else(|| CrewError::MissingLlm(self.role.clone()))
    }

    fn log_reply(&self, verbose: bool, content: &str) {
        if verbose || self.verbose {
            info!(agent_id = %self.id, role = %self.role, "{}", content);
        } else {
            debug!(agent_id = %self.id, role = %self.role, "{}", content);
        }
    }

    /// Work a task prompt to a final answer, delegating when permitted
    #[instrument(skip_all, fields(agent_id = %self.id, role = %self.role))]
    pub(crate) async fn execute(
        &self,
        task_prompt: String,
        ctx: &WorkContext<'_>,
    ) -> Result<String, CrewError> {
        let llm = self.resolve_llm(ctx.default_llm)?;
        let coworkers: Vec<&AgentHandle> =
            ctx.coworkers.iter().filter(|c| c.id != self.id).collect();
        let roles: Vec<&str> = coworkers.iter().map(|c| c.role.as_str()).collect();
        let delegating = self.allow_delegation && !coworkers.is_empty();

        let mut system = PromptTemplate::agent_system(self);
        if delegating {
            system.push_str(&PromptTemplate::delegation_instructions(&roles));
        }
        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(task_prompt)];

        for iteration in 0..self.max_iter {
            let response = llm.complete(&messages).await?;
            ctx.session.record_usage(&response.usage);
            self.log_reply(ctx.verbose, &response.content);
            ctx.session.emit(Event::AgentMessage {
                crew_id: ctx.session.crew_id(),
                agent_id: self.id,
                content: response.content.clone(),
            });

            let delegation = match parse_reply(&response.content, delegating) {
                AgentReply::Final(answer) => return Ok(answer),
                AgentReply::Delegate(delegation) => delegation,
            };

            debug!(iteration, coworker = %delegation.coworker, "Delegation requested");
            messages.push(ChatMessage::assistant(response.content));

            let coworker = coworkers
                .iter()
                .find(|c| c.role.eq_ignore_ascii_case(delegation.coworker.trim()));
            let observation = match coworker {
                Some(coworker) => {
                    ctx.session.emit(Event::Delegated {
                        crew_id: ctx.session.crew_id(),
                        from: self.id,
                        to: coworker.id,
                        question: delegation.question.clone(),
                    });
                    let answer = coworker
                        .answer_question(&self.role, &delegation.question, ctx)
                        .await?;
                    PromptTemplate::coworker_answer(&coworker.role, &answer)
                }
                None => {
                    warn!(requested = %delegation.coworker, "Delegation to unknown coworker");
                    PromptTemplate::unknown_coworker(&delegation.coworker, &roles)
                }
            };
            messages.push(ChatMessage::user(observation));
        }

        warn!(max_iter = self.max_iter, "Iteration budget spent, forcing final answer");
        messages.push(ChatMessage::user(PromptTemplate::force_final_answer()));
        let response = llm.complete(&messages).await?;
        ctx.session.record_usage(&response.usage);
        self.log_reply(ctx.verbose, &response.content);
        ctx.session.emit(Event::AgentMessage {
            crew_id: ctx.session.crew_id(),
            agent_id: self.id,
            content: response.content.clone(),
        });
        Ok(extract_final_answer(&response.content))
    }

    /// Answer a coworker's question in a single call, without delegating further
    async fn answer_question(
        &self,
        delegator_role: &str,
        question: &str,
        ctx: &WorkContext<'_>,
    ) -> Result<String, CrewError> {
        let llm = self.resolve_llm(ctx.default_llm)?;
        let messages = [
            ChatMessage::system(PromptTemplate::agent_system(self)),
            ChatMessage::user(PromptTemplate::coworker_question(delegator_role, question)),
        ];

        let response = llm.complete(&messages).await?;
        ctx.session.record_usage(&response.usage);
        self.log_reply(ctx.verbose, &response.content);
        ctx.session.emit(Event::AgentMessage {
            crew_id: ctx.session.crew_id(),
            agent_id: self.id,
            content: response.content.clone(),
        });
        Ok(extract_final_answer(&response.content))
    }
}

/// Builder for [`Agent`]
pub struct AgentBuilder {
    role: String,
    goal: String,
    backstory: String,
    verbose: bool,
    allow_delegation: bool,
    max_iter: usize,
    llm: Option<Arc<dyn LlmClient>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            role: String::new(),
            goal: String::new(),
            backstory: String::new(),
            verbose: false,
            allow_delegation: false,
            max_iter: DEFAULT_MAX_ITER,
            llm: None,
        }
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    pub fn backstory(mut self, backstory: impl Into<String>) -> Self {
        self.backstory = backstory.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn allow_delegation(mut self, allow: bool) -> Self {
        self.allow_delegation = allow;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Apply defaults from loaded settings
    pub fn settings(mut self, settings: &AgentSettings) -> Self {
        self.max_iter = settings.max_iter;
        self
    }

    /// Validate and build a shareable agent
    pub fn build(self) -> Result<AgentHandle, CrewError> {
        if self.role.trim().is_empty() {
            return Err(CrewError::Config("agent role must not be empty".into()));
        }
        if self.goal.trim().is_empty() {
            return Err(CrewError::Config(format!("agent '{}' has an empty goal", self.role)));
        }
        if self.max_iter == 0 {
            return Err(CrewError::Config(format!("agent '{}' needs max_iter >= 1", self.role)));
        }

        let agent = Agent {
            id: AgentId::new(),
            role: self.role,
            goal: self.goal,
            backstory: self.backstory,
            verbose: self.verbose,
            allow_delegation: self.allow_delegation,
            max_iter: self.max_iter,
            llm: self.llm,
        };
        debug!(agent_id = %agent.id, role = %agent.role, "Created agent");
        Ok(AgentHandle::new(agent))
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheaply cloneable reference to an agent
#[derive(Clone, Debug)]
pub struct AgentHandle {
    inner: Arc<Agent>,
}

impl AgentHandle {
    pub fn new(agent: Agent) -> Self {
        Self {
            inner: Arc::new(agent),
        }
    }

    pub fn id(&self) -> AgentId {
        self.inner.id
    }

    pub fn role(&self) -> &str {
        &self.inner.role
    }

    pub fn inner(&self) -> &Agent {
        &self.inner
    }
}

impl std::ops::Deref for AgentHandle {
    type Target = Agent;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::EventChannel;
    use crate::llm::ScriptedLlm;
    use crate::protocol::CrewId;

    fn analyst(llm: Arc<dyn LlmClient>) -> AgentHandle {
        Agent::builder()
            .role("Analyst")
            .goal("Analyze power demand")
            .backstory("Energy specialist.")
            .allow_delegation(true)
            .max_iter(2)
            .llm(llm)
            .build()
            .unwrap()
    }

    #[test]
    fn test_agent_creation_defaults() {
        let agent = Agent::builder().role("Writer").goal("Write").build().unwrap();
        assert!(!agent.allow_delegation);
        assert!(!agent.verbose);
        assert_eq!(agent.max_iter, DEFAULT_MAX_ITER);
        assert!(agent.llm().is_none());
    }

    #[test]
    fn test_settings_apply_max_iter() {
        let settings = AgentSettings { max_iter: 2 };
        let agent = Agent::builder().role("Writer").goal("Write").settings(&settings).build().unwrap();
        assert_eq!(agent.max_iter, 2);
    }

    #[test]
    fn test_agent_validation() {
        assert!(matches!(Agent::builder().goal("g").build(), Err(CrewError::Config(_))));
        assert!(matches!(Agent::builder().role("r").build(), Err(CrewError::Config(_))));
        assert!(matches!(
            Agent::builder().role("r").goal("g").max_iter(0).build(),
            Err(CrewError::Config(_))
        ));
    }

    #[test]
    fn test_interpolated_keeps_id() {
        let agent = Agent::builder()
            .role("{topic} Analyst")
            .goal("Study {topic}")
            .build()
            .unwrap();
        let inputs = HashMap::from([("topic".to_string(), "Grid".to_string())]);
        let filled = agent.interpolated(&inputs);
        assert_eq!(filled.id, agent.id);
        assert_eq!(filled.role, "Grid Analyst");
        assert_eq!(filled.goal, "Study Grid");
    }

    #[tokio::test]
    async fn test_execute_without_llm_fails() {
        let agent = Agent::builder().role("Writer").goal("Write").build().unwrap();
        let session = KickoffSession::new(CrewId::new(), None);
        let ctx = WorkContext { session: &session, default_llm: None, coworkers: &[], verbose: false };
        let err = agent.execute("task".into(), &ctx).await.unwrap_err();
        assert!(matches!(err, CrewError::MissingLlm(role) if role == "Writer"));
    }

    #[tokio::test]
    async fn test_execute_with_delegation_round() {
        let lead = Arc::new(ScriptedLlm::from_replies([
            "Delegate to: writer\nQuestion: Draft an intro",
            "Final Answer: Intro drafted and reviewed",
        ]));
        let helper = Arc::new(ScriptedLlm::from_replies(["Final Answer: Here is an intro"]));

        let agent = analyst(lead.clone());
        let writer = Agent::builder()
            .role("Writer")
            .goal("Write")
            .llm(helper.clone())
            .build()
            .unwrap();

        let session = KickoffSession::new(CrewId::new(), None);
        let crew_agents = vec![agent.clone(), writer.clone()];
        let ctx = WorkContext { session: &session, default_llm: None, coworkers: &crew_agents, verbose: true };

        let answer = agent.execute("Do it".into(), &ctx).await.unwrap();
        assert_eq!(answer, "Intro drafted and reviewed");

        let calls = lead.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0][0].content.contains("- Writer"));
        assert!(!calls[0][0].content.contains("- Analyst"));
        assert!(calls[1].last().unwrap().content.contains("Here is an intro"));
        assert_eq!(helper.call_count(), 1);
        assert_eq!(session.usage().successful_requests, 3);
    }

    #[tokio::test]
    async fn test_execute_forces_final_answer() {
        let lead = Arc::new(ScriptedLlm::from_replies([
            "Delegate to: Nobody\nQuestion: ?",
            "Delegate to: Nobody\nQuestion: ?",
            "Fine, here it is",
        ]));
        let agent = analyst(lead.clone());
        let other = Agent::builder().role("Writer").goal("Write").build().unwrap();
        let session = KickoffSession::new(CrewId::new(), None);
        let crew_agents = vec![agent.clone(), other];
        let ctx = WorkContext { session: &session, default_llm: None, coworkers: &crew_agents, verbose: false };

        let answer = agent.execute("Do it".into(), &ctx).await.unwrap();
        assert_eq!(answer, "Fine, here it is");

        let calls = lead.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1].last().unwrap().content.contains("There is no coworker named 'Nobody'"));
        assert_eq!(calls[2].last().unwrap().content, PromptTemplate::force_final_answer());
    }

    #[tokio::test]
    async fn test_forced_answer_reaches_event_stream() {
        let lead = Arc::new(ScriptedLlm::from_replies([
            "Delegate to: Nobody\nQuestion: ?",
            "Forced answer text",
        ]));
        let agent = Agent::builder()
            .role("Analyst")
            .goal("Analyze")
            .allow_delegation(true)
            .max_iter(1)
            .llm(lead)
            .build()
            .unwrap();
        let other = Agent::builder().role("Writer").goal("Write").build().unwrap();

        let (mut events, tx) = EventChannel::new();
        let session = KickoffSession::new(CrewId::new(), Some(tx));
        let crew_agents = vec![agent.clone(), other];
        let ctx = WorkContext { session: &session, default_llm: None, coworkers: &crew_agents, verbose: false };

        let answer = agent.execute("Do it".into(), &ctx).await.unwrap();
        assert_eq!(answer, "Forced answer text");

        let replies: Vec<String> = events
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Event::AgentMessage { agent_id, content, .. } if agent_id == agent.id() => Some(content),
                _ => None,
            })
            .collect();
        assert_eq!(replies, ["Delegate to: Nobody\nQuestion: ?", "Forced answer text"]);
    }

    #[test]
    fn test_as_manager_enables_delegation() {
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm::from_replies(["Final Answer: ok"]));
        let lead = Agent::builder().role("Lead").goal("Coordinate").llm(llm).build().unwrap();
        assert!(!lead.allow_delegation);

        let manager = lead.as_manager();
        assert!(manager.allow_delegation);
        assert_eq!(manager.id, lead.id());
        assert_eq!(manager.role, "Lead");
        assert!(manager.llm().is_some());
    }
}
