//! Prompt templates for agents and delegation

use crate::agent::Agent;
use crate::task::TaskOutput;

/// Templates for the prompts an agent sends while working a task
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt framing the agent's persona
    pub fn agent_system(agent: &Agent) -> String {
        format!(
            r#"You are {role}. {backstory}
Your personal goal is: {goal}
To give my best complete final answer to the task, respond with
"Final Answer:" followed by the complete answer."#,
            role = agent.role,
            backstory = agent.backstory.trim(),
            goal = agent.goal,
        )
    }

    /// Coworker section appended to the system prompt of delegating agents
    pub fn delegation_instructions(coworkers: &[&str]) -> String {
        let mut prompt = String::from(
            "\nYou can ask one of your coworkers for help. Your coworkers are:\n",
        );
        for role in coworkers {
            prompt.push_str(&format!("- {}\n", role));
        }
        prompt.push_str(
            r#"To ask a coworker, respond with exactly:
Delegate to: <coworker role>
Question: <everything they need to know to answer>
You will receive their answer before continuing."#,
        );
        prompt
    }

    /// User prompt for a task, with prior outputs as context
    pub fn task_prompt(description: &str, expected_output: &str, context: &[&TaskOutput]) -> String {
        let mut prompt = format!(
            r#"Current Task: {}

This is the expected criteria for your final answer: {}
you MUST return the actual complete content as the final answer, not a summary."#,
            description.trim(),
            expected_output.trim()
        );

        if !context.is_empty() {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            let blocks: Vec<&str> = context.iter().map(|o| o.raw.as_str()).collect();
            prompt.push_str(&blocks.join("\n\n----------\n\n"));
        }

        prompt.push_str("\n\nBegin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!");
        prompt
    }

    /// Prompt given to a coworker answering a delegated question
    pub fn coworker_question(delegator_role: &str, question: &str) -> String {
        format!(
            r#"Your coworker, {}, needs your help with the following:

{}

Answer directly and completely. Start your answer with "Final Answer:"."#,
            delegator_role,
            question.trim()
        )
    }

    /// Observation fed back after a delegation round
    pub fn coworker_answer(role: &str, answer: &str) -> String {
        format!("Answer from {}:\n{}\n\nContinue with the task.", role, answer.trim())
    }

    /// Observation when the named coworker does not exist
    pub fn unknown_coworker(requested: &str, coworkers: &[&str]) -> String {
        format!(
            "There is no coworker named '{}'. Available coworkers: {}. Continue with the task.",
            requested,
            coworkers.join(", ")
        )
    }

    /// Sent once the iteration budget is spent
    pub fn force_final_answer() -> &'static str {
        "You have run out of attempts. Give your best Final Answer now, without delegating."
    }
}
