//! Prompt construction
//!
//! Builds the message list sent to the chat model: the system
//! instructions, the caller's earlier turns, and a final user turn that
//! carries the question followed by the retrieved professors.

use profrag_core::{Message, RetrievalMatch};

/// Banner placed between the question and the retrieved professors
pub const RESULTS_BANNER: &str = "\n\nReturned results from vector db (done automatically): ";

/// Default system instructions for the recommendation assistant
pub const SYSTEM_PROMPT: &str = "\
You are an assistant that helps students find and evaluate professors.

Every user question is followed by professor records retrieved automatically from a \
review database. Each record lists the professor's name, the subject they teach, and \
their average rating out of 5 stars.

When answering:
1. Work out what the student is looking for: subject, teaching style, rating, or any \
other preference they mention.
2. Use the retrieved records to pick the three professors who best match, ranked from \
best to worst fit.
3. For each professor give their name, subject, star rating, and one or two sentences \
on why they fit the request.
4. Only rely on the retrieved records. If none of them fit, say so plainly.
5. If the question is too vague to rank professors, ask a short follow-up question \
instead of guessing.

Keep the answer clear, concise, and friendly.";

/// Render one retrieved professor as a plain-text block
pub fn format_match(m: &RetrievalMatch) -> String {
    format!(
        "\nReturned Results:\nProfessor: {}\nSubject: {}\nStars: {}\n\n",
        m.id, m.metadata.subject, m.metadata.stars
    )
}

/// Render the retrieval results, in the order returned, behind the banner
pub fn format_matches(matches: &[RetrievalMatch]) -> String {
    matches
        .iter()
        .fold(RESULTS_BANNER.to_string(), |mut block, m| {
            block.push_str(&format_match(m));
            block
        })
}

// ============================================================================
// Prompt Builder
// ============================================================================

/// Builder for the augmented message list
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_instruction: String,
    history: Vec<Message>,
    question: String,
    retrieved: Vec<RetrievalMatch>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set system instruction
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Earlier conversation turns, kept verbatim and in order
    pub fn history(mut self, history: &[Message]) -> Self {
        self.history = history.to_vec();
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Retrieved professors appended to the question
    pub fn retrieved(mut self, matches: &[RetrievalMatch]) -> Self {
        self.retrieved = matches.to_vec();
        self
    }

    /// Build the final message list: system, history, then the synthesized user turn
    pub fn build(self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(self.system_instruction));
        messages.extend(self.history);

        let mut content = self.question;
        content.push_str(&format_matches(&self.retrieved));
        messages.push(Message::user(content));

        messages
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use profrag_core::Role;
    use proptest::prelude::*;

    fn sample_matches(n: usize) -> Vec<RetrievalMatch> {
        (0..n)
            .map(|i| RetrievalMatch::new(format!("Dr. {i}"), format!("Subject {i}"), 4.0))
            .collect()
    }

    #[test]
    fn test_format_match_block() {
        let block = format_match(&RetrievalMatch::new("Dr. X", "Algorithms", 5.0));
        assert!(block.contains("Professor: Dr. X\n"));
        assert!(block.contains("Subject: Algorithms\n"));
        assert!(block.contains("Stars: 5\n"));
        assert!(!block.contains("Review"));
    }

    #[test]
    fn test_fractional_stars() {
        let block = format_match(&RetrievalMatch::new("Dr. Y", "Physics", 3.5));
        assert!(block.contains("Stars: 3.5\n"));
    }

    #[test]
    fn test_format_no_matches_is_banner_only() {
        assert_eq!(format_matches(&[]), RESULTS_BANNER);
    }

    #[test]
    fn test_format_matches_preserves_order() {
        let block = format_matches(&sample_matches(5));
        assert!(block.starts_with(RESULTS_BANNER));

        let positions: Vec<usize> = (0..5)
            .map(|i| block.find(&format!("Professor: Dr. {i}\n")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_prompt_builder() {
        let history = vec![
            Message::user("I need a CS professor"),
            Message::assistant("Which course?"),
        ];
        let messages = PromptBuilder::new()
            .system("You are a helpful assistant.")
            .history(&history)
            .question("best professor for algorithms?")
            .retrieved(&[RetrievalMatch::new("Dr. X", "Algorithms", 5.0)])
            .build();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::system("You are a helpful assistant."));
        assert_eq!(&messages[1..3], &history[..]);

        let last = &messages[3];
        assert_eq!(last.role, Role::User);
        assert!(last.content.starts_with("best professor for algorithms?"));
        assert!(last.content.contains("Dr. X"));
        assert!(last.content.contains("Algorithms"));
    }

    proptest! {
        #[test]
        fn prop_block_has_one_entry_per_match(n in 0usize..=5) {
            let block = format_matches(&sample_matches(n));
            prop_assert_eq!(block.matches("Professor: ").count(), n);
            prop_assert_eq!(block.matches("\nReturned Results:\n").count(), n);
        }

        #[test]
        fn prop_augmented_length(history_len in 0usize..20, n in 0usize..=5) {
            let history: Vec<Message> = (0..history_len)
                .map(|i| if i % 2 == 0 { Message::user("q") } else { Message::assistant("a") })
                .collect();
            let messages = PromptBuilder::new()
                .system(SYSTEM_PROMPT)
                .history(&history)
                .question("question")
                .retrieved(&sample_matches(n))
                .build();

            // Input conversation is history + question
            prop_assert_eq!(messages.len(), (history_len + 1) - 1 + 2);
            prop_assert_eq!(messages[0].role, Role::System);
            prop_assert_eq!(messages.last().unwrap().role, Role::User);
        }
    }
}
