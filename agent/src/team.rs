use crate::llm::{self, Message, TokenUsage};
use crate::{Agent, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One entry in the shared group-chat transcript.
#[derive(Clone)]
pub struct ChatMessage {
    pub source: String,
    pub content: String,
}

impl std::fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.content)
    }
}

pub trait TerminationCondition {
    /// Returns the stop reason once the chat should end.
    fn check(&self, transcript: &[ChatMessage]) -> Option<String>;

    fn or(self, other: Box<dyn TerminationCondition + Send>) -> OrTermination
    where
        Self: Sized + Send + 'static,
    {
        OrTermination(Box::new(self), other)
    }
}

/// Stops once any participant mentions the given text.
pub struct TextMentionTermination(pub String);

impl TerminationCondition for TextMentionTermination {
    fn check(&self, transcript: &[ChatMessage]) -> Option<String> {
        transcript
            .last()
            .filter(|message| message.content.contains(&self.0))
            .map(|message| format!("text '{}' mentioned by {}", self.0, message.source))
    }
}

/// Stops once the transcript reaches the given length.
pub struct MaxMessageTermination(pub usize);

impl TerminationCondition for MaxMessageTermination {
    fn check(&self, transcript: &[ChatMessage]) -> Option<String> {
        (transcript.len() >= self.0)
            .then(|| format!("maximum number of messages ({}) reached", self.0))
    }
}

pub struct OrTermination(
    Box<dyn TerminationCondition + Send>,
    Box<dyn TerminationCondition + Send>,
);

impl TerminationCondition for OrTermination {
    fn check(&self, transcript: &[ChatMessage]) -> Option<String> {
        self.0.check(transcript).or_else(|| self.1.check(transcript))
    }
}

#[derive(Clone, Copy, Default)]
pub struct AgentStats {
    pub usage: TokenUsage,
    pub elapsed: Duration,
    pub turns: u32,
}

pub struct TeamResult {
    pub transcript: Vec<ChatMessage>,
    pub stop_reason: String,
    pub stats: HashMap<String, AgentStats>,
}

type Observer = Box<dyn FnMut(&ChatMessage) + Send>;

/// A group chat where a selector model picks which participant speaks next,
/// each turn appending one message to a shared transcript.
pub struct SelectorTeam {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    participants: Vec<Agent>,
    termination: Box<dyn TerminationCondition + Send>,
    transcript: Vec<ChatMessage>,
    stats: HashMap<String, AgentStats>,
    observers: Vec<Observer>,
    last_speaker: Option<String>,
}

impl SelectorTeam {
    fn notify(observers: &mut [Observer], message: &ChatMessage) {
        for observer in observers {
            observer(message);
        }
    }

    fn render_transcript(&self) -> String {
        self.transcript
            .iter()
            .map(ChatMessage::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn roles(&self) -> String {
        self.participants
            .iter()
            .map(|agent| format!("{}: {}", agent.name(), agent.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Picks the next speaker, preferring the selector model's choice and
    /// avoiding back-to-back turns by the same participant when possible.
    async fn select_speaker(&self) -> Result<usize> {
        if self.participants.len() == 1 {
            return Ok(0);
        }

        let names = self
            .participants
            .iter()
            .map(|agent| agent.name().to_string())
            .collect::<Vec<_>>();

        let prompt = format!(
            "You are moderating a conversation between the following roles:\n\n{}\n\n\
             Read the conversation below. Then select the next role from [{}] to speak. \
             Only return the role name.\n\n{}\n\n\
             Which role speaks next? Only return the role name.",
            self.roles(),
            names.join(", "),
            self.render_transcript(),
        );

        let response = self
            .llm
            .completion(llm::CompletionRequest {
                messages: &[Message::User(prompt)],
                tools: &[],
            })
            .await?;

        let eligible = |idx: &usize| -> bool {
            self.last_speaker.as_deref() != Some(self.participants[*idx].name())
        };

        // when the reply names several participants, the first mention wins
        let chosen = (0..self.participants.len())
            .filter(|idx| eligible(idx))
            .filter_map(|idx| {
                response
                    .content
                    .find(self.participants[idx].name())
                    .map(|pos| (pos, idx))
            })
            .min_by_key(|&(pos, _)| pos)
            .map(|(_, idx)| idx);

        match chosen {
            Some(idx) => Ok(idx),
            None => {
                tracing::warn!(
                    selection = %response.content,
                    "selector reply did not name an eligible participant, falling back"
                );
                (0..self.participants.len())
                    .find(|idx| eligible(idx))
                    .ok_or(Error::AgentWorkflowError(
                        "no eligible participant to speak".to_string(),
                    ))
            }
        }
    }

    async fn run_turn(&mut self, idx: usize) -> Result<()> {
        let context = format!(
            "Conversation so far:\n\n{}\n\nIt is now your turn to respond as {}.",
            self.render_transcript(),
            self.participants[idx].name(),
        );

        let started = Instant::now();
        let reply = self.participants[idx].respond(context).await?;
        let elapsed = started.elapsed();

        let agent = &self.participants[idx];
        tracing::info!(speaker = agent.name(), ?elapsed, "team turn complete");

        let stats = self.stats.entry(agent.name().to_string()).or_default();
        stats.usage = agent.usage();
        stats.elapsed += elapsed;
        stats.turns += 1;

        let message = ChatMessage {
            source: agent.name().to_string(),
            content: reply,
        };
        Self::notify(&mut self.observers, &message);
        self.last_speaker = Some(message.source.clone());
        self.transcript.push(message);

        Ok(())
    }

    /// Runs the chat on the given task until a termination condition fires.
    /// The transcript persists across calls, so follow-up instructions can be
    /// issued by calling `run` again.
    pub async fn run(&mut self, task: &str) -> Result<TeamResult> {
        let message = ChatMessage {
            source: "user".to_string(),
            content: task.to_string(),
        };
        Self::notify(&mut self.observers, &message);
        self.transcript.push(message);

        let stop_reason = loop {
            if let Some(reason) = self.termination.check(&self.transcript) {
                break reason;
            }

            let speaker = self.select_speaker().await?;
            self.run_turn(speaker).await?;
        };

        tracing::info!(%stop_reason, "team run finished");

        Ok(TeamResult {
            transcript: self.transcript.clone(),
            stop_reason,
            stats: self.stats.clone(),
        })
    }
}

pub struct SelectorTeamBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    participants: Vec<Agent>,
    termination: Option<Box<dyn TerminationCondition + Send>>,
    observers: Vec<Observer>,
}

impl SelectorTeamBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            participants: Vec::new(),
            termination: None,
            observers: Vec::new(),
        }
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn participant(mut self, agent: Agent) -> Self {
        self.participants.push(agent);
        self
    }

    pub fn termination(mut self, condition: impl TerminationCondition + Send + 'static) -> Self {
        self.termination = Some(Box::new(condition));
        self
    }

    pub fn observer(mut self, observer: impl FnMut(&ChatMessage) + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn build(self) -> Result<SelectorTeam> {
        if self.participants.is_empty() {
            return Err(Error::MissingArg(
                "at least one participant is required for a team".to_string(),
            ));
        }

        Ok(SelectorTeam {
            llm: self.llm.ok_or(Error::MissingArg(
                "llm is required for team speaker selection".to_string(),
            ))?,
            participants: self.participants,
            termination: self.termination.ok_or(Error::MissingArg(
                "termination condition is required for team".to_string(),
            ))?,
            transcript: Vec::new(),
            stats: HashMap::new(),
            observers: self.observers,
            last_speaker: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MaxMessageTermination, SelectorTeamBuilder, TerminationCondition, TextMentionTermination,
    };
    use crate::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use crate::{AgentBuilder, Result};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Plays both the selector and the two participants: alpha greets, then
    /// the selector hands over to beta, which ends the chat.
    struct ScriptedLLM;

    #[async_trait]
    impl LLM for ScriptedLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            let content = match request.messages.first() {
                Some(Message::User(prompt)) => {
                    // selector call
                    if prompt.contains("hello from alpha") {
                        "beta".to_string()
                    } else {
                        "alpha".to_string()
                    }
                }
                Some(Message::System(prompt)) if prompt.contains("alpha") => {
                    "hello from alpha".to_string()
                }
                Some(Message::System(_)) => "all done TERMINATE".to_string(),
                _ => panic!("unexpected message sequence"),
            };

            Ok(CompletionResponse {
                content,
                tool_calls: vec![],
                usage: None,
            })
        }
    }

    fn two_agent_team(
        termination: impl TerminationCondition + Send + 'static,
    ) -> Result<super::SelectorTeam> {
        let llm = Arc::new(ScriptedLLM);

        SelectorTeamBuilder::new()
            .llm(llm.clone())
            .participant(
                AgentBuilder::new()
                    .name("alpha")
                    .description("says hello")
                    .system_prompt("you are alpha".to_string())
                    .llm(llm.clone())
                    .build()?,
            )
            .participant(
                AgentBuilder::new()
                    .name("beta")
                    .description("ends the chat")
                    .system_prompt("you are beta".to_string())
                    .llm(llm)
                    .build()?,
            )
            .termination(termination)
            .build()
    }

    #[tokio::test]
    async fn test_selector_team_runs_until_text_mention() -> Result<()> {
        let mut team = two_agent_team(
            TextMentionTermination("TERMINATE".to_string())
                .or(Box::new(MaxMessageTermination(100))),
        )?;

        let result = team.run("write a greeting").await?;

        assert_eq!(result.transcript.len(), 3);
        assert_eq!(result.transcript[0].source, "user");
        assert_eq!(result.transcript[1].source, "alpha");
        assert_eq!(result.transcript[1].content, "hello from alpha");
        assert_eq!(result.transcript[2].source, "beta");
        assert!(result.stop_reason.contains("TERMINATE"));

        assert_eq!(result.stats["alpha"].turns, 1);
        assert_eq!(result.stats["beta"].turns, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_max_message_termination() -> Result<()> {
        let mut team = two_agent_team(MaxMessageTermination(2))?;

        let result = team.run("write a greeting").await?;

        // the task plus a single alpha turn hits the cap
        assert_eq!(result.transcript.len(), 2);
        assert!(result.stop_reason.contains("maximum number of messages"));

        Ok(())
    }

    /// Selector whose reply names both participants, the later-registered
    /// one first.
    struct MultiNameSelectorLLM;

    #[async_trait]
    impl LLM for MultiNameSelectorLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            let content = match request.messages.first() {
                Some(Message::User(_)) => "beta is a better fit than alpha here".to_string(),
                Some(Message::System(prompt)) if prompt.contains("beta") => {
                    "all done TERMINATE".to_string()
                }
                Some(Message::System(_)) => "hello from alpha".to_string(),
                _ => panic!("unexpected message sequence"),
            };

            Ok(CompletionResponse {
                content,
                tool_calls: vec![],
                usage: None,
            })
        }
    }

    #[tokio::test]
    async fn test_selector_prefers_first_named_participant() -> Result<()> {
        let llm = Arc::new(MultiNameSelectorLLM);
        let mut team = SelectorTeamBuilder::new()
            .llm(llm.clone())
            .participant(
                AgentBuilder::new()
                    .name("alpha")
                    .system_prompt("you are alpha".to_string())
                    .llm(llm.clone())
                    .build()?,
            )
            .participant(
                AgentBuilder::new()
                    .name("beta")
                    .system_prompt("you are beta".to_string())
                    .llm(llm)
                    .build()?,
            )
            .termination(TextMentionTermination("TERMINATE".to_string()))
            .build()?;

        let result = team.run("pick a speaker").await?;

        // the reply mentions beta before alpha, so beta goes first despite
        // registration order
        assert_eq!(result.transcript[1].source, "beta");

        Ok(())
    }

    #[tokio::test]
    async fn test_observer_sees_every_message() -> Result<()> {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();

        let llm = Arc::new(ScriptedLLM);
        let mut team = SelectorTeamBuilder::new()
            .llm(llm.clone())
            .participant(
                AgentBuilder::new()
                    .name("alpha")
                    .system_prompt("you are alpha".to_string())
                    .llm(llm)
                    .build()?,
            )
            .termination(MaxMessageTermination(2))
            .observer(move |message| sink.lock().unwrap().push(message.source.clone()))
            .build()?;

        team.run("say hi").await?;

        assert_eq!(*seen.lock().unwrap(), vec!["user", "alpha"]);

        Ok(())
    }
}
