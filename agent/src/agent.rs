use crate::callbacks;
use crate::llm;
use crate::llm::{Message, TokenUsage};
use crate::tools;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

pub trait StopCondition {
    fn done(&self, history: &[llm::Message]) -> bool;
}

/// Default stop condition: the agent is done once it produces an assistant
/// message with no tool calls left to execute.
pub struct NoPendingToolCalls;

impl StopCondition for NoPendingToolCalls {
    fn done(&self, history: &[llm::Message]) -> bool {
        matches!(history.last(), Some(Message::Assistant(_, tool_calls)) if tool_calls.is_empty())
    }
}

type Tool = Box<dyn tools::Tool + Send>;
type Callback = Box<dyn callbacks::Callback + Send>;

pub struct Agent {
    name: String,
    description: String,
    system_prompt: String,
    llm: Arc<dyn llm::LLM + Send + Sync>,
    tools: HashMap<String, Tool>,
    callbacks: Vec<Callback>,
    tool_defs: Vec<tools::ToolDefinition>,
    stop_condition: Box<dyn StopCondition + Send>,
    usage: TokenUsage,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Cumulative token usage across every completion this agent has made.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    async fn execute_tool_call(
        &mut self,
        tool_call: &tools::ToolCall,
        messages: Vec<llm::Message>,
    ) -> Result<Vec<llm::Message>> {
        let tool = self
            .tools
            .get_mut(&tool_call.name)
            .ok_or(Error::ToolDoesNotExist(tool_call.name.clone()))?;

        let messages = tool.invoke(tool_call, messages).await?;

        Ok(messages)
    }

    pub async fn run(&mut self, mut messages: Vec<llm::Message>) -> Result<Vec<Message>> {
        while !self.stop_condition.done(&messages) {
            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: &self.tool_defs,
                })
                .await?;

            if let Some(usage) = next.usage {
                self.usage += usage;
            }

            messages.push(llm::Message::Assistant(
                next.content,
                next.tool_calls.clone(),
            ));

            for tool_call in &next.tool_calls {
                messages = self.execute_tool_call(tool_call, messages).await?;
            }

            for callback in &mut self.callbacks {
                messages = callback.call(messages).await?;
            }
        }

        Ok(messages)
    }

    /// Run one conversational turn: seed a fresh history with the agent's
    /// system prompt and the given context, iterate until the stop condition
    /// holds, and return the agent's final reply.
    pub async fn respond(&mut self, context: String) -> Result<String> {
        let messages = vec![
            Message::System(self.system_prompt.clone()),
            Message::User(context),
        ];

        let history = self.run(messages).await?;

        history
            .iter()
            .rev()
            .find_map(|message| match message {
                Message::Assistant(content, _) if !content.is_empty() => Some(content.clone()),
                _ => None,
            })
            .ok_or(Error::AgentWorkflowError(format!(
                "agent {} finished its turn without a reply",
                self.name
            )))
    }
}

pub struct AgentBuilder {
    name: Option<String>,
    description: String,
    system_prompt: String,
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    tools: Vec<Tool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            description: String::new(),
            system_prompt: String::new(),
            llm: None,
            tools: Vec::new(),
            callbacks: Vec::new(),
            stop_condition: None,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn system_prompt(mut self, prompt: String) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let mut tool_defs = Vec::new();
        let mut tools = HashMap::new();

        for tool in self.tools {
            let def = tool.definition()?;
            tools.insert(def.name.clone(), tool);
            tool_defs.push(def);
        }

        Ok(Agent {
            name: self
                .name
                .ok_or(Error::MissingArg("name is required for agent".to_string()))?,
            description: self.description,
            system_prompt: self.system_prompt,
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            tools,
            tool_defs,
            callbacks: self.callbacks,
            stop_condition: self
                .stop_condition
                .unwrap_or(Box::new(NoPendingToolCalls)),
            usage: TokenUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::llm::{CompletionRequest, CompletionResponse, LLM, Message, TokenUsage};
    use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
    use crate::{AgentBuilder, Error, Result, StopCondition};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockLLM;

    #[async_trait]
    impl LLM for MockLLM {
        async fn completion<'a>(
            &self,
            request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            let usage = Some(TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            });
            match request.messages.last() {
                Some(Message::User(_)) => Ok(CompletionResponse {
                    content: "tool call".to_string(),
                    tool_calls: vec![ToolCall {
                        id: "call1".to_string(),
                        name: "double".to_string(),
                        args: "{\"arg\":123}".to_string(),
                    }],
                    usage,
                }),
                Some(Message::Tool { .. }) => Ok(CompletionResponse {
                    content: "tool call received".to_string(),
                    tool_calls: vec![],
                    usage,
                }),
                Some(Message::Assistant(_, _)) => Ok(CompletionResponse {
                    content: "completed".to_string(),
                    tool_calls: vec![],
                    usage,
                }),
                _ => panic!("unexpected message sequence"),
            }
        }
    }

    struct DoubleTool;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct DoubleArgs {
        arg: i32,
    }

    #[async_trait]
    impl FunctionalTool for DoubleTool {
        fn definition(&self) -> Result<ToolDefinition> {
            ToolDefinition::new::<DoubleArgs>("double", "double")
        }

        async fn invoke_fn(&mut self, tool_call: &ToolCall) -> Result<Message> {
            let args: DoubleArgs = tool_call.args()?;
            Ok(Message::Tool {
                id: tool_call.id.clone(),
                name: "double".to_string(),
                result: format!("2 * {} = {}", args.arg, 2 * args.arg),
            })
        }
    }

    struct SimpleStop;

    impl StopCondition for SimpleStop {
        fn done(&self, history: &[Message]) -> bool {
            if let Some(Message::Assistant(content, _)) = history.last() {
                content == "completed"
            } else {
                false
            }
        }
    }

    #[tokio::test]
    async fn test_agent() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .name("doubler")
            .llm(Arc::new(MockLLM))
            .tool(Box::new(DoubleTool))
            .stop_condition(Box::new(SimpleStop))
            .build()?;

        let history = agent
            .run(vec![Message::User("do stuff".to_string())])
            .await?;

        assert_eq!(history.len(), 5);

        assert!(matches!(&history[0], Message::User(content) if content == "do stuff"));
        assert!(matches!(&history[1], Message::Assistant(_, tool_calls) if tool_calls.len() == 1));
        assert!(matches!(&history[2], Message::Tool { result, .. } if result == "2 * 123 = 246"));
        assert!(
            matches!(&history[3], Message::Assistant(content, _) if content == "tool call received")
        );
        assert!(matches!(&history[4], Message::Assistant(content, _) if content == "completed"));

        assert_eq!(agent.usage().prompt_tokens, 30);
        assert_eq!(agent.usage().completion_tokens, 15);

        Ok(())
    }

    #[tokio::test]
    async fn test_agent_default_stop_condition() -> Result<()> {
        let mut agent = AgentBuilder::new()
            .name("doubler")
            .description("doubles numbers")
            .system_prompt("you double numbers".to_string())
            .llm(Arc::new(MockLLM))
            .tool(Box::new(DoubleTool))
            .build()?;

        // NoPendingToolCalls stops at the first assistant message without
        // tool calls, one completion earlier than SimpleStop above.
        let reply = agent.respond("do stuff".to_string()).await?;
        assert_eq!(reply, "tool call received");

        Ok(())
    }

    #[test]
    fn test_builder_requires_name_and_llm() {
        let error = AgentBuilder::new().llm(Arc::new(MockLLM)).build().unwrap_err();
        assert!(matches!(error, Error::MissingArg(_)));

        let error = AgentBuilder::new().name("doubler").build().unwrap_err();
        assert!(matches!(error, Error::MissingArg(_)));
    }
}
