use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use std::hash::{Hash, Hasher};

mod openai;
pub use openai::OpenAI;

#[derive(Clone, Hash)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl Message {
    pub fn get_hash(&self) -> u64 {
        let mut hasher = std::hash::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::User(content) => write!(f, "#### User\n\n{}\n\n", content),
            Message::System(content) => write!(f, "#### System\n\n{}\n\n", content),
            Message::Assistant(content, tool_calls) => {
                write!(f, "#### Assistant\n\n{}\n\n", content)?;
                tool_calls.iter().try_for_each(|call| write!(f, "{}", call))
            }
            Message::Tool { name, result, .. } => {
                write!(f, "#### Tool `{}`\n\n{}\n\n", name, result)
            }
        }
    }
}

/// Token counts reported by the model for a single completion.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, other: Self) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}
