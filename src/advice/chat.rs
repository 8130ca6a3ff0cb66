//! AI plan and chat on top of a [`TextGenerator`]

use super::client::{Message, TextGenerator};
use super::prompts::{plan_prompt, CHAT_SYSTEM_PROMPT, PLAN_SYSTEM_PROMPT};
use super::{AdviceError, AdviceResult};
use crate::features::FeatureMap;
use crate::inference::InferenceResult;
use crate::risk::RiskCategory;
use std::collections::VecDeque;

/// Messages kept in a chat session
pub const CHAT_WINDOW: usize = 8;

/// Conversation history owned by the caller.
///
/// Bounded on every write; the oldest messages drop first.
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: VecDeque<Message>,
    window: usize,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::with_window(CHAT_WINDOW)
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(window: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(window + 1),
            window: window.max(1),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.history.push_back(message);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Generates plans and chat replies through any [`TextGenerator`]
pub struct HealthCoach<G> {
    generator: G,
    pub plan_max_tokens: u32,
    pub chat_max_tokens: u32,
}

impl<G: TextGenerator> HealthCoach<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            plan_max_tokens: 1200,
            chat_max_tokens: 400,
        }
    }

    pub fn with_limits(mut self, plan_max_tokens: u32, chat_max_tokens: u32) -> Self {
        self.plan_max_tokens = plan_max_tokens;
        self.chat_max_tokens = chat_max_tokens;
        self
    }

    /// Numbered action plan for one result
    pub fn plan(
        &self,
        inputs: &FeatureMap,
        result: &InferenceResult,
        category: Option<RiskCategory>,
    ) -> AdviceResult<String> {
        let prompt = plan_prompt(inputs, result, category);
        tracing::debug!("Plan prompt:\n{}", prompt);
        let reply = self.generator.generate(
            vec![Message::user(prompt)],
            Some(PLAN_SYSTEM_PROMPT),
            self.plan_max_tokens,
        )?;
        non_empty(reply)
    }

    /// Send `user_message` with the health `context` and record the exchange.
    ///
    /// On failure the user message stays in the session.
    pub fn chat(
        &self,
        session: &mut ChatSession,
        context: &str,
        user_message: &str,
    ) -> AdviceResult<String> {
        session.push(Message::user(user_message));
        let system = format!("{CHAT_SYSTEM_PROMPT}\n\n{context}");
        let messages: Vec<Message> = session.messages().cloned().collect();

        let reply = self
            .generator
            .generate(messages, Some(&system), self.chat_max_tokens)
            .and_then(non_empty)?;
        session.push(Message::assistant(reply.clone()));
        Ok(reply)
    }
}

fn non_empty(reply: String) -> AdviceResult<String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(AdviceError::EmptyReply);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advice::Role;
    use crate::models::ModelName;
    use std::sync::Mutex;

    /// Replies with a fixed text and records what it was sent
    struct Echo {
        reply: String,
        calls: Mutex<Vec<(Vec<Message>, Option<String>, u32)>>,
    }

    impl Echo {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Echo {
        fn generate(
            &self,
            messages: Vec<Message>,
            system: Option<&str>,
            max_tokens: u32,
        ) -> AdviceResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((messages, system.map(str::to_string), max_tokens));
            Ok(self.reply.clone())
        }
    }

    fn heart_result() -> InferenceResult {
        InferenceResult {
            model: ModelName::Heart,
            label: Some(1.0),
            probabilities: vec![0.3, 0.7],
            raw_probability: Some(0.7),
        }
    }

    #[test]
    fn test_session_keeps_last_eight() {
        let mut session = ChatSession::new();
        for i in 0..11 {
            session.push(Message::user(format!("m{i}")));
        }
        assert_eq!(session.len(), CHAT_WINDOW);
        assert_eq!(session.messages().next().unwrap().content, "m3");
        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_plan_is_trimmed() {
        let coach = HealthCoach::new(Echo::new("  1. Walk daily.\n"));
        let plan = coach
            .plan(&FeatureMap::new(), &heart_result(), Some(RiskCategory::High))
            .unwrap();
        assert_eq!(plan, "1. Walk daily.");

        let calls = coach.generator.calls.lock().unwrap();
        let (messages, system, max_tokens) = &calls[0];
        assert_eq!(*max_tokens, 1200);
        assert_eq!(system.as_deref(), Some(PLAN_SYSTEM_PROMPT));
        assert_eq!(messages.len(), 1);
        assert!(messages[0].content.contains("Predicted Category: High"));
    }

    #[test]
    fn test_empty_plan_is_an_error() {
        let coach = HealthCoach::new(Echo::new("   "));
        assert!(matches!(
            coach.plan(&FeatureMap::new(), &heart_result(), None),
            Err(AdviceError::EmptyReply)
        ));
    }

    #[test]
    fn test_chat_records_exchange() {
        let coach = HealthCoach::new(Echo::new("Try a short walk.")).with_limits(1000, 300);
        let mut session = ChatSession::new();

        let reply = coach.chat(&mut session, "No recent health data found.", "Hi").unwrap();
        assert_eq!(reply, "Try a short walk.");
        let roles: Vec<_> = session.messages().map(|m| m.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);

        let calls = coach.generator.calls.lock().unwrap();
        let (messages, system, max_tokens) = &calls[0];
        assert_eq!(*max_tokens, 300);
        assert_eq!(messages.len(), 1);
        let system = system.as_deref().unwrap();
        assert!(system.starts_with(CHAT_SYSTEM_PROMPT));
        assert!(system.ends_with("No recent health data found."));
    }

    #[test]
    fn test_chat_sends_only_the_window() {
        let coach = HealthCoach::new(Echo::new("ok"));
        let mut session = ChatSession::new();
        for i in 0..6 {
            coach.chat(&mut session, "", &format!("q{i}")).unwrap();
        }
        let calls = coach.generator.calls.lock().unwrap();
        assert!(calls.iter().all(|(messages, _, _)| messages.len() <= CHAT_WINDOW));
        assert_eq!(session.len(), CHAT_WINDOW);
    }
}
