//! Parsing of agent replies into final answers or delegation requests

const FINAL_ANSWER: &str = "final answer:";
const DELEGATE_TO: &str = "delegate to:";
const QUESTION: &str = "question:";

/// A request to hand a question to a coworker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delegation {
    pub coworker: String,
    pub question: String,
}

/// What an agent meant by its reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Delegate(Delegation),
    Final(String),
}

/// Text after the first `Final Answer:` marker, or the whole reply
pub fn extract_final_answer(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();
    match lowered.find(FINAL_ANSWER) {
        Some(pos) => text[pos + FINAL_ANSWER.len()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Classify a reply. Delegation directives are only honoured when allowed.
pub fn parse_reply(text: &str, allow_delegation: bool) -> AgentReply {
    if !allow_delegation {
        return AgentReply::Final(extract_final_answer(text));
    }

    let lowered = text.to_ascii_lowercase();
    let final_pos = lowered.find(FINAL_ANSWER);

    let mut offset = 0;
    let mut delegate: Option<(usize, String)> = None;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.to_ascii_lowercase().starts_with(DELEGATE_TO) {
            let role = trimmed[DELEGATE_TO.len()..].trim().to_string();
            delegate = Some((offset + line.len(), role));
            break;
        }
        offset += line.len();
    }

    let Some((rest_start, coworker)) = delegate else {
        return AgentReply::Final(extract_final_answer(text));
    };
    if coworker.is_empty() || final_pos.is_some_and(|pos| pos < rest_start) {
        return AgentReply::Final(extract_final_answer(text));
    }

    let rest = &text[rest_start..];
    let rest_lowered = rest.to_ascii_lowercase();
    let question = match rest_lowered.find(QUESTION) {
        Some(pos) => rest[pos + QUESTION.len()..].trim(),
        None => rest.trim(),
    };

    if question.is_empty() {
        return AgentReply::Final(extract_final_answer(text));
    }

    AgentReply::Delegate(Delegation {
        coworker,
        question: question.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_answer_marker() {
        assert_eq!(
            extract_final_answer("Thought: done\nFinal Answer: The grid is strained."),
            "The grid is strained."
        );
        assert_eq!(extract_final_answer("  plain reply \n"), "plain reply");
        assert_eq!(extract_final_answer("FINAL ANSWER: shouting"), "shouting");
    }

    #[test]
    fn test_delegation_parsed() {
        let reply = "I need numbers.\nDelegate to: AI Power Usage Analyst\nQuestion: What is the 2030 forecast?\nInclude sources.";
        match parse_reply(reply, true) {
            AgentReply::Delegate(d) => {
                assert_eq!(d.coworker, "AI Power Usage Analyst");
                assert_eq!(d.question, "What is the 2030 forecast?\nInclude sources.");
            }
            other => panic!("expected delegation, got {other:?}"),
        }
    }

    #[test]
    fn test_delegation_without_question_line() {
        let reply = "Delegate to: Writer\nPlease polish the draft";
        assert_eq!(
            parse_reply(reply, true),
            AgentReply::Delegate(Delegation {
                coworker: "Writer".into(),
                question: "Please polish the draft".into(),
            })
        );
    }

    #[test]
    fn test_delegation_ignored_when_not_allowed() {
        let reply = "Delegate to: Writer\nQuestion: help";
        assert!(matches!(parse_reply(reply, false), AgentReply::Final(_)));
    }

    #[test]
    fn test_final_answer_before_directive_wins() {
        let reply = "Final Answer: all done\nDelegate to: Writer\nQuestion: help";
        assert_eq!(
            parse_reply(reply, true),
            AgentReply::Final("all done\nDelegate to: Writer\nQuestion: help".into())
        );
    }

    #[test]
    fn test_empty_question_is_final() {
        assert!(matches!(parse_reply("Delegate to: Writer\n", true), AgentReply::Final(_)));
    }
}
