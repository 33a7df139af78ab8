use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "blog",
    about = "Builds a recipe blog post with a team of scripted agents"
)]
pub struct Args {
    /// Number of recipes in the blog post
    #[arg(long, default_value_t = 3)]
    pub recipes: usize,

    /// Directory the generated HTML is written into (recreated on start)
    #[arg(long, default_value = "site")]
    pub work_dir: PathBuf,

    /// Directory for per-agent transcript logs
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Chat model used by all agents and the speaker selector
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,
}

/// Credentials pulled from the environment once at startup and handed to
/// the components that need them.
pub struct Credentials {
    pub usda_api_key: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            usda_api_key: std::env::var("USDA_FOOD_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
        }
    }
}
