//! Tasks and their outputs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentHandle;
use crate::error::CrewError;
use crate::protocol::TaskId;

/// Words of the description kept in a task summary
const SUMMARY_WORDS: usize = 10;

/// A unit of work owned by one agent
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// What a good final answer looks like
    pub expected_output: String,
    /// Owning agent
    pub agent: AgentHandle,
    /// Tasks whose outputs feed this one. `None` takes every earlier output.
    pub context: Option<Vec<TaskId>>,
}

impl Task {
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
    }

    /// Copy with `{name}` placeholders filled from `inputs`; the id is kept
    pub fn interpolated(&self, inputs: &HashMap<String, String>) -> Task {
        Task {
            description: interpolate(&self.description, inputs),
            expected_output: interpolate(&self.expected_output, inputs),
            ..self.clone()
        }
    }

    /// First words of the description
    pub fn summary(&self) -> String {
        let words: Vec<&str> = self.description.split_whitespace().take(SUMMARY_WORDS).collect();
        format!("{}...", words.join(" "))
    }
}

/// Builder for [`Task`]
#[derive(Default)]
pub struct TaskBuilder {
    description: String,
    expected_output: String,
    agent: Option<AgentHandle>,
    context: Option<Vec<TaskId>>,
}

impl TaskBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    pub fn agent(mut self, agent: &AgentHandle) -> Self {
        self.agent = Some(agent.clone());
        self
    }

    /// Explicit context, in the order outputs are presented
    pub fn context<'a, I>(mut self, tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        self.context = Some(tasks.into_iter().map(|t| t.id).collect());
        self
    }

    pub fn build(self) -> Result<Task, CrewError> {
        if self.description.trim().is_empty() {
            return Err(CrewError::Config("task description must not be empty".into()));
        }
        if self.expected_output.trim().is_empty() {
            return Err(CrewError::Config("task expected_output must not be empty".into()));
        }
        let agent = self
            .agent
            .ok_or_else(|| CrewError::Config("task has no owning agent".into()))?;

        Ok(Task {
            id: TaskId::new(),
            description: self.description,
            expected_output: self.expected_output,
            agent,
            context: self.context,
        })
    }
}

/// Result of one finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: TaskId,
    pub description: String,
    pub expected_output: String,
    pub summary: String,
    /// Role of the agent credited with the output
    pub agent_role: String,
    pub raw: String,
}

impl TaskOutput {
    pub(crate) fn new(task: &Task, raw: String) -> Self {
        Self {
            task_id: task.id,
            description: task.description.clone(),
            expected_output: task.expected_output.clone(),
            summary: task.summary(),
            agent_role: task.agent.role.clone(),
            raw,
        }
    }
}

impl std::fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Replace `{name}` placeholders with values from `inputs`. Unknown names stay.
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> String {
    if inputs.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match inputs.get(key.trim()) {
                    Some(value) if !key.is_empty() => out.push_str(value),
                    _ => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn agent() -> AgentHandle {
        Agent::builder().role("Writer").goal("Write").build().unwrap()
    }

    #[test]
    fn test_task_builder_requires_fields() {
        let a = agent();
        assert!(Task::builder().expected_output("x").agent(&a).build().is_err());
        assert!(Task::builder().description("x").agent(&a).build().is_err());
        assert!(Task::builder().description("x").expected_output("y").build().is_err());

        let task = Task::builder().description("x").expected_output("y").agent(&a).build().unwrap();
        assert!(task.context.is_none());
        assert_eq!(task.agent.id(), a.id());
    }

    #[test]
    fn test_context_keeps_order() {
        let a = agent();
        let t1 = Task::builder().description("one").expected_output("o").agent(&a).build().unwrap();
        let t2 = Task::builder().description("two").expected_output("o").agent(&a).build().unwrap();
        let t3 = Task::builder()
            .description("three")
            .expected_output("o")
            .agent(&a)
            .context([&t2, &t1])
            .build()
            .unwrap();
        assert_eq!(t3.context, Some(vec![t2.id, t1.id]));
    }

    #[test]
    fn test_summary_truncates_to_ten_words() {
        let a = agent();
        let task = Task::builder()
            .description("Conduct research on current and projected power demand trends specifically driven by AI")
            .expected_output("o")
            .agent(&a)
            .build()
            .unwrap();
        assert_eq!(
            task.summary(),
            "Conduct research on current and projected power demand trends specifically..."
        );
    }

    #[test]
    fn test_interpolate() {
        let inputs = HashMap::from([
            ("topic".to_string(), "AI".to_string()),
            ("year".to_string(), "2030".to_string()),
        ]);
        assert_eq!(interpolate("{topic} demand by {year}", &inputs), "AI demand by 2030");
        assert_eq!(interpolate("keep {unknown} and {}", &inputs), "keep {unknown} and {}");
        assert_eq!(interpolate("open { brace", &inputs), "open { brace");
        assert_eq!(interpolate("no inputs {topic}", &HashMap::new()), "no inputs {topic}");
    }

    #[test]
    fn test_output_credits_owner() {
        let a = agent();
        let task = Task::builder().description("Write it").expected_output("doc").agent(&a).build().unwrap();
        let output = TaskOutput::new(&task, "# Report".into());
        assert_eq!(output.agent_role, "Writer");
        assert_eq!(output.to_string(), "# Report");
        assert_eq!(output.summary, "Write it...");
    }
}
