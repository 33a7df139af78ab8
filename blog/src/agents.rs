//! The three scripted participants of the blog-building chat.

use crate::mealdb::MealDbClient;
use crate::nutrition::NutritionClient;
use crate::tools::{GetNutritionInfo, GetRandomRecipes, WriteHtmlFile};
use agent::callbacks::MessageLogger;
use agent::llm::LLM;
use agent::{Agent, AgentBuilder, Result};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

const PLANNER_PROMPT: &str = include_str!("prompts/planner.md");
const MEAL_NUTRITION_PROMPT: &str = include_str!("prompts/meal_nutrition.md");
const SOFTWARE_ENGINEER_PROMPT: &str = include_str!("prompts/software_engineer.md");
const TASK_PROMPT: &str = include_str!("prompts/task.md");

/// The initial group-chat task, parameterized on the recipe count.
pub fn task_prompt(count: usize) -> String {
    with_count(TASK_PROMPT, count)
}

fn with_count(prompt: &str, count: usize) -> String {
    prompt.replace("{count}", &count.to_string())
}

fn transcript_log(log_dir: &Path, name: &str) -> Result<File> {
    Ok(File::create(log_dir.join(format!("{name}.md")))?)
}

pub fn create_planner_agent(
    count: usize,
    llm: Arc<dyn LLM + Send + Sync>,
    log_dir: &Path,
) -> Result<Agent> {
    AgentBuilder::new()
        .name("planner")
        .description(
            "An agent for planning tasks; it should be the first to engage when given a new task.",
        )
        .system_prompt(with_count(PLANNER_PROMPT, count))
        .llm(llm)
        .callback(MessageLogger::new(
            "planner",
            transcript_log(log_dir, "planner")?,
        )?)
        .build()
}

pub fn create_meal_nutrition_agent(
    count: usize,
    llm: Arc<dyn LLM + Send + Sync>,
    mealdb: Arc<MealDbClient>,
    nutrition: Arc<NutritionClient>,
    log_dir: &Path,
) -> Result<Agent> {
    AgentBuilder::new()
        .name("meal_nutrition")
        .description(
            "Responsible for fetching meal recipes and nutrition information. The only \
             source of truth for anything to do with meals, recipes, or nutrition.",
        )
        .system_prompt(with_count(MEAL_NUTRITION_PROMPT, count))
        .llm(llm)
        .tool(GetRandomRecipes::new(mealdb))
        .tool(GetNutritionInfo::new(nutrition))
        .callback(MessageLogger::new(
            "meal_nutrition",
            transcript_log(log_dir, "meal_nutrition")?,
        )?)
        .build()
}

pub fn create_software_engineer_agent(
    count: usize,
    llm: Arc<dyn LLM + Send + Sync>,
    work_dir: &Path,
    log_dir: &Path,
) -> Result<Agent> {
    AgentBuilder::new()
        .name("software_engineer")
        .description("Responsible for producing the HTML blog post and writing it to disk.")
        .system_prompt(with_count(SOFTWARE_ENGINEER_PROMPT, count))
        .llm(llm)
        .tool(WriteHtmlFile::new(work_dir.to_path_buf()))
        .callback(MessageLogger::new(
            "software_engineer",
            transcript_log(log_dir, "software_engineer")?,
        )?)
        .build()
}
