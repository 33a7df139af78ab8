use agent::team::{
    MaxMessageTermination, SelectorTeamBuilder, TerminationCondition, TextMentionTermination,
};
use blog::{agents, config, console, mealdb, nutrition};
use clap::Parser;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const TERMINATE_KEYWORD: &str = "TERMINATE";
const MAX_MESSAGES: usize = 100;

#[tokio::main]
async fn main() -> agent::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = config::Args::parse();

    let credentials = config::Credentials::from_env();
    if credentials.usda_api_key.is_none() {
        tracing::warn!(
            "USDA_FOOD_API_KEY is not set; nutrition lookups will report a configuration error"
        );
    }

    // fresh working directory per session
    if args.work_dir.exists() {
        std::fs::remove_dir_all(&args.work_dir)?;
    }
    std::fs::create_dir_all(&args.work_dir)?;
    std::fs::create_dir_all(&args.log_dir)?;

    let llm = agent::llm::OpenAI::new(args.model.clone());
    let mealdb = Arc::new(mealdb::MealDbClient::new());
    let nutrition = Arc::new(nutrition::NutritionClient::new(credentials.usda_api_key));

    let mut team = SelectorTeamBuilder::new()
        .llm(llm.clone())
        .participant(agents::create_planner_agent(
            args.recipes,
            llm.clone(),
            &args.log_dir,
        )?)
        .participant(agents::create_meal_nutrition_agent(
            args.recipes,
            llm.clone(),
            mealdb,
            nutrition,
            &args.log_dir,
        )?)
        .participant(agents::create_software_engineer_agent(
            args.recipes,
            llm.clone(),
            &args.work_dir,
            &args.log_dir,
        )?)
        .termination(
            TextMentionTermination(TERMINATE_KEYWORD.to_string())
                .or(Box::new(MaxMessageTermination(MAX_MESSAGES))),
        )
        .observer(console::print_chat_message)
        .build()?;

    console::print_section("TASK EXECUTION", Some("Creating the recipe blog post"));

    let mut task = agents::task_prompt(args.recipes);
    loop {
        let started = Instant::now();
        match team.run(&task).await {
            Ok(result) => {
                console::print_section(
                    "TERMINATION",
                    Some(&format!(
                        "The task has been terminated, reason: {}",
                        result.stop_reason
                    )),
                );
                console::print_stats(&result.stats, started.elapsed());
            }
            Err(error) => {
                tracing::error!(%error, "team run failed");
            }
        }

        print!("User instructions (type 'exit' to end session): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("exit") {
            break;
        }
        task = line.to_string();
    }

    Ok(())
}
