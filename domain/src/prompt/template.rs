//! Prompt templates for collaborative turns.
//!
//! Individual persona prompts come from the agent itself
//! ([`crate::agent::entities::TutorAgent::persona_prompt`]); the templates
//! here build the cross-agent prompts for sequential transcripts, debate
//! rounds, and synthesis.

use crate::collab::contribution::AgentContribution;

/// Templates for generating prompts at each collaboration stage
pub struct TutorPromptTemplate;

impl TutorPromptTemplate {
    /// Note appended to a persona prompt when the agent is one of several
    /// contributors in a collaborative turn.
    pub fn collaborative_system_note() -> &'static str {
        "You are one of several tutors answering together. Give your own \
         perspective on the student's question, grounded in your subject. \
         Be concise; other tutors will cover their areas."
    }

    /// Transcript block a sequential agent sees: prior contributions
    /// verbatim, in order, followed by the instruction to build on them.
    pub fn sequential_prompt(question: &str, prior: &[AgentContribution]) -> String {
        let mut prompt = format!("Student question:\n\n{question}\n");
        if !prior.is_empty() {
            prompt.push_str("\nContributions so far:\n");
            for contribution in prior {
                prompt.push_str(&format!(
                    "\n--- {} ---\n{}\n",
                    contribution.agent_name, contribution.text
                ));
            }
            prompt.push_str(
                "\nBuild on the contributions above: add your perspective, \
                 correct anything you disagree with, and avoid repeating \
                 points already made.",
            );
        }
        prompt
    }

    /// Prompt for a debate round after the first: the previous round's
    /// contributions, with an invitation to rebut.
    pub fn debate_round_prompt(
        question: &str,
        round: usize,
        previous: &[AgentContribution],
    ) -> String {
        let mut prompt = format!(
            "Student question:\n\n{question}\n\nDebate round {}. \
             Positions from the previous round:\n",
            round + 1
        );
        for contribution in previous {
            prompt.push_str(&format!(
                "\n--- {} ---\n{}\n",
                contribution.agent_name, contribution.text
            ));
        }
        prompt.push_str(
            "\nRespond to the other tutors: defend your position where you \
             still hold it, concede where they are right, and rebut where \
             they are wrong.",
        );
        prompt
    }

    /// System prompt for a synthesizer call.
    pub fn synthesis_system() -> &'static str {
        "You are a moderator combining several tutors' contributions into \
         one answer for a student. Merge the strongest points, resolve \
         disagreements explicitly, and keep the student's level in mind."
    }

    /// User prompt for a synthesizer call.
    pub fn synthesis_prompt(question: &str, contributions: &[AgentContribution]) -> String {
        let mut prompt = format!(
            "Student question:\n\n{question}\n\nTutor contributions:\n"
        );
        for contribution in contributions {
            prompt.push_str(&format!(
                "\n--- {} ---\n{}\n",
                contribution.agent_name, contribution.text
            ));
        }
        prompt.push_str("\nWrite the single combined answer for the student.");
        prompt
    }

    /// Default synthesis: concatenation with attribution, no extra call.
    pub fn concatenate_with_attribution(contributions: &[AgentContribution]) -> String {
        contributions
            .iter()
            .filter(|c| c.success)
            .map(|c| format!("**{}**: {}", c.agent_name, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_prompt_contains_prior_contributions_in_order() {
        let prior = vec![
            AgentContribution::success("math", "Math Tutor", "use algebra", 1, 0),
            AgentContribution::success("physics", "Physics Tutor", "model the forces", 1, 0),
        ];
        let prompt = TutorPromptTemplate::sequential_prompt("How do levers work?", &prior);
        let math_pos = prompt.find("use algebra").unwrap();
        let physics_pos = prompt.find("model the forces").unwrap();
        assert!(math_pos < physics_pos);
        assert!(prompt.contains("How do levers work?"));
    }

    #[test]
    fn test_sequential_prompt_first_agent_has_no_transcript() {
        let prompt = TutorPromptTemplate::sequential_prompt("Why is the sky blue?", &[]);
        assert!(!prompt.contains("Contributions so far"));
    }

    #[test]
    fn test_concatenation_skips_failures() {
        let contributions = vec![
            AgentContribution::success("a", "Alpha", "one", 1, 0),
            AgentContribution::failure("b", "Beta", "timeout", 0),
        ];
        let combined = TutorPromptTemplate::concatenate_with_attribution(&contributions);
        assert!(combined.contains("**Alpha**: one"));
        assert!(!combined.contains("Beta"));
    }
}
