//! Execution plan - the checked dependency graph between tasks

use std::collections::{HashMap, HashSet};

use crate::agent::AgentHandle;
use crate::error::CrewError;
use crate::protocol::TaskId;
use crate::task::Task;

/// Node in the plan
#[derive(Debug, Clone)]
struct PlanNode {
    /// Explicit context; `None` means every earlier task
    context: Option<Vec<TaskId>>,
}

/// Validated task ordering for a crew
///
/// Building a plan enforces that every task belongs to a crew agent and that
/// explicit context only points at tasks running earlier.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    nodes: HashMap<TaskId, PlanNode>,
    order: Vec<TaskId>,
}

impl ExecutionPlan {
    /// Validate agents and tasks and build the plan
    pub fn build(agents: &[AgentHandle], tasks: &[Task]) -> Result<Self, CrewError> {
        if agents.is_empty() {
            return Err(CrewError::EmptyCrew("agents"));
        }
        if tasks.is_empty() {
            return Err(CrewError::EmptyCrew("tasks"));
        }

        let mut agent_ids = HashSet::new();
        let mut roles = HashSet::new();
        for agent in agents {
            if !agent_ids.insert(agent.id()) {
                return Err(CrewError::DuplicateAgent(agent.id()));
            }
            if !roles.insert(agent.role().to_ascii_lowercase()) {
                return Err(CrewError::DuplicateRole(agent.role().to_string()));
            }
        }

        let crew_tasks: HashSet<TaskId> = tasks.iter().map(|t| t.id).collect();
        let mut nodes: HashMap<TaskId, PlanNode> = HashMap::with_capacity(tasks.len());
        let mut order = Vec::with_capacity(tasks.len());

        for task in tasks {
            if nodes.contains_key(&task.id) {
                return Err(CrewError::DuplicateTask(task.id));
            }
            if !agent_ids.contains(&task.agent.id()) {
                return Err(CrewError::UnknownAgent {
                    task: task.id,
                    role: task.agent.role().to_string(),
                });
            }

            for dep in task.context.iter().flatten() {
                if nodes.contains_key(dep) {
                    continue;
                }
                return Err(if crew_tasks.contains(dep) {
                    CrewError::ForwardContext { task: task.id, context: *dep }
                } else {
                    CrewError::UnknownContext { task: task.id, context: *dep }
                });
            }

            nodes.insert(task.id, PlanNode { context: task.context.clone() });
            order.push(task.id);
        }

        Ok(Self { nodes, order })
    }

    /// Task ids in execution order
    pub fn order(&self) -> &[TaskId] {
        &self.order
    }

    /// Explicit context of a task, `None` when every earlier output applies
    pub fn context(&self, task_id: &TaskId) -> Option<&[TaskId]> {
        self.nodes.get(task_id).and_then(|n| n.context.as_deref())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;

    fn agent(role: &str) -> AgentHandle {
        Agent::builder().role(role).goal("goal").build().unwrap()
    }

    fn task(owner: &AgentHandle, name: &str) -> Task {
        Task::builder().description(name).expected_output("out").agent(owner).build().unwrap()
    }

    fn task_with(owner: &AgentHandle, name: &str, context: &[&Task]) -> Task {
        Task::builder()
            .description(name)
            .expected_output("out")
            .agent(owner)
            .context(context.iter().copied())
            .build()
            .unwrap()
    }

    // === Validation Tests ===

    #[test]
    fn test_empty_crew_rejected() {
        let a = agent("A");
        assert!(matches!(ExecutionPlan::build(&[], &[task(&a, "t")]), Err(CrewError::EmptyCrew("agents"))));
        assert!(matches!(ExecutionPlan::build(&[a], &[]), Err(CrewError::EmptyCrew("tasks"))));
    }

    #[test]
    fn test_owner_must_be_member() {
        let a = agent("A");
        let outsider = agent("Outsider");
        let t = task(&outsider, "t");
        let err = ExecutionPlan::build(&[a], &[t]).unwrap_err();
        assert!(matches!(err, CrewError::UnknownAgent { role, .. } if role == "Outsider"));
    }

    #[test]
    fn test_duplicates_rejected() {
        let a = agent("A");
        let b = agent("a");
        let t = task(&a, "t");
        assert!(matches!(
            ExecutionPlan::build(&[a.clone(), a.clone()], &[t.clone()]),
            Err(CrewError::DuplicateAgent(_))
        ));
        assert!(matches!(
            ExecutionPlan::build(&[a.clone(), b], &[t.clone()]),
            Err(CrewError::DuplicateRole(_))
        ));
        assert!(matches!(
            ExecutionPlan::build(&[a], &[t.clone(), t]),
            Err(CrewError::DuplicateTask(_))
        ));
    }

    #[test]
    fn test_context_outside_crew_rejected() {
        let a = agent("A");
        let stray = task(&a, "stray");
        let t = task_with(&a, "t", &[&stray]);
        let err = ExecutionPlan::build(&[a], &[t.clone()]).unwrap_err();
        assert!(matches!(err, CrewError::UnknownContext { task, context } if task == t.id && context == stray.id));
    }

    #[test]
    fn test_forward_context_rejected() {
        let a = agent("A");
        let later = task(&a, "later");
        let first = task_with(&a, "first", &[&later]);
        let err = ExecutionPlan::build(&[a], &[first, later]).unwrap_err();
        assert!(matches!(err, CrewError::ForwardContext { .. }));
    }

    #[test]
    fn test_self_context_rejected() {
        let a = agent("A");
        let mut t = task(&a, "t");
        t.context = Some(vec![t.id]);
        assert!(matches!(
            ExecutionPlan::build(&[a], &[t]),
            Err(CrewError::ForwardContext { .. })
        ));
    }

    // === Graph Tests ===

    #[test]
    fn test_order_and_context() {
        let a = agent("A");
        let b = agent("B");
        let t1 = task(&a, "one");
        let t2 = task_with(&b, "two", &[]);
        let t3 = task_with(&b, "three", &[&t1, &t2]);
        let plan = ExecutionPlan::build(&[a, b], &[t1.clone(), t2.clone(), t3.clone()]).unwrap();

        assert_eq!(plan.order(), &[t1.id, t2.id, t3.id]);
        assert_eq!(plan.len(), 3);
        assert!(!plan.is_empty());
        assert_eq!(plan.context(&t1.id), None);
        assert_eq!(plan.context(&t2.id), Some(&[][..]));
        assert_eq!(plan.context(&t3.id), Some(&[t1.id, t2.id][..]));
        assert_eq!(plan.context(&TaskId::new()), None);
    }
}
