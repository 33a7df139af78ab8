//! Agent-facing tools wrapping the recipe, nutrition, and file-write
//! helpers. Tool results are always JSON strings; domain failures are
//! embedded in the result (`{"error": …}`) so the chat keeps going and the
//! model can react, rather than tearing down the agent loop.

use crate::files::write_html_file;
use crate::mealdb::MealDbClient;
use crate::nutrition::NutritionClient;
use agent::Result;
use agent::llm::Message;
use agent::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

pub struct GetRandomRecipes {
    client: Arc<MealDbClient>,
}

impl GetRandomRecipes {
    pub fn new(client: Arc<MealDbClient>) -> Box<Self> {
        Box::new(Self { client })
    }
}

#[derive(Deserialize, JsonSchema)]
struct GetRandomRecipesArgs {
    /// Number of random recipes to fetch.
    count: usize,
}

#[async_trait]
impl FunctionalTool for GetRandomRecipes {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<GetRandomRecipesArgs>(
            "get_random_recipes",
            "Fetch the given number of random meal recipes, each with a source link, \
             an image, full instructions, and the ingredient list with measurements.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: GetRandomRecipesArgs = call.args()?;

        let result = match self.client.random_recipes(args.count).await {
            Ok(recipes) => serde_json::to_string(&json!({ "meals": recipes }))?,
            Err(error) => {
                tracing::warn!(%error, "recipe fetch failed");
                serde_json::to_string(&json!({ "error": error.to_string() }))?
            }
        };

        Ok(Message::Tool {
            id: call.id.clone(),
            name: "get_random_recipes".to_string(),
            result,
        })
    }
}

pub struct GetNutritionInfo {
    client: Arc<NutritionClient>,
}

impl GetNutritionInfo {
    pub fn new(client: Arc<NutritionClient>) -> Box<Self> {
        Box::new(Self { client })
    }
}

#[derive(Deserialize, JsonSchema)]
struct GetNutritionInfoArgs {
    /// Ingredient with an optional measurement, e.g. "75g Butter" or "1 Egg".
    query: String,
}

#[async_trait]
impl FunctionalTool for GetNutritionInfo {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<GetNutritionInfoArgs>(
            "get_nutrition_info",
            "Look up calories, carbohydrates, protein, and total fat for an ingredient \
             quantity. Returns zeros when the ingredient has no data.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: GetNutritionInfoArgs = call.args()?;

        let result = match self.client.get_nutrition_info(&args.query).await {
            Ok(summary) => serde_json::to_string(&summary)?,
            Err(error) => {
                tracing::warn!(query = %args.query, %error, "nutrition lookup failed");
                serde_json::to_string(&json!({ "error": error.to_string() }))?
            }
        };

        Ok(Message::Tool {
            id: call.id.clone(),
            name: "get_nutrition_info".to_string(),
            result,
        })
    }
}

pub struct WriteHtmlFile {
    work_dir: PathBuf,
}

impl WriteHtmlFile {
    pub fn new(work_dir: PathBuf) -> Box<Self> {
        Box::new(Self { work_dir })
    }
}

#[derive(Deserialize, JsonSchema)]
struct WriteHtmlFileArgs {
    /// Name of the HTML file to create; a .html extension is added if missing.
    filename: String,
    /// Full HTML content to write.
    content: String,
}

#[async_trait]
impl FunctionalTool for WriteHtmlFile {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<WriteHtmlFileArgs>(
            "write_html_file",
            "Write HTML content to a file in the working directory and verify it exists.",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: WriteHtmlFileArgs = call.args()?;

        let report = write_html_file(&self.work_dir, &args.filename, &args.content).await;

        Ok(Message::Tool {
            id: call.id.clone(),
            name: "write_html_file".to_string(),
            result: serde_json::to_string(&report)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{GetNutritionInfo, WriteHtmlFile};
    use crate::nutrition::NutritionClient;
    use agent::Result;
    use agent::llm::Message;
    use agent::tools::{FunctionalTool, ToolCall};
    use std::sync::Arc;

    async fn call_tool(tool: &mut dyn FunctionalTool, args: &str) -> Result<String> {
        match tool
            .invoke_fn(&ToolCall {
                id: String::new(),
                name: String::new(),
                args: args.to_string(),
            })
            .await?
        {
            Message::Tool { result, .. } => Ok(result),
            _ => panic!("not a tool message"),
        }
    }

    #[tokio::test]
    async fn test_nutrition_tool_soft_failure_keeps_fixed_shape() -> Result<()> {
        let mut tool = GetNutritionInfo::new(Arc::new(NutritionClient::new(Some(
            "test-key".to_string(),
        ))));

        // whitespace-only input resolves without touching the network
        let result = call_tool(&mut *tool, "{\"query\":\"   \"}").await?;
        assert_eq!(
            result,
            "{\"calories\":0.0,\"carbohydrates\":0.0,\"protein\":0.0,\"total_fat\":0.0}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_nutrition_tool_reports_hard_failure_as_error_value() -> Result<()> {
        let mut tool = GetNutritionInfo::new(Arc::new(NutritionClient::new(None)));

        let result = call_tool(&mut *tool, "{\"query\":\"75g Butter\"}").await?;
        let value: serde_json::Value = serde_json::from_str(&result)?;

        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .contains("USDA_FOOD_API_KEY")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_write_html_tool_reports_the_written_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut tool = WriteHtmlFile::new(dir.path().to_path_buf());

        let result = call_tool(
            &mut *tool,
            "{\"filename\":\"post\",\"content\":\"<html></html>\"}",
        )
        .await?;
        let value: serde_json::Value = serde_json::from_str(&result)?;

        assert_eq!(value["success"], true);
        assert!(value["filepath"].as_str().unwrap().ends_with("post.html"));

        Ok(())
    }
}
