//! Plain-text console rendering for the group chat.

use agent::team::{AgentStats, ChatMessage};
use std::collections::HashMap;
use std::time::Duration;

// gpt-4o list pricing per token, 2025-02
const COST_PER_PROMPT_TOKEN: f64 = 2.50 / 1_000_000.0;
const COST_PER_COMPLETION_TOKEN: f64 = 10.00 / 1_000_000.0;

const RULE: &str =
    "────────────────────────────────────────────────────────────────────────";

pub fn print_section(title: &str, subtitle: Option<&str>) {
    println!("\n{RULE}");
    println!("  {title}");
    if let Some(subtitle) = subtitle {
        println!("  {subtitle}");
    }
    println!("{RULE}\n");
}

pub fn print_chat_message(message: &ChatMessage) {
    println!("[{}]", message.source);
    println!("{}\n", message.content);
}

pub fn print_stats(stats: &HashMap<String, AgentStats>, overall: Duration) {
    print_section("STATISTICS", None);

    let mut names = stats.keys().collect::<Vec<_>>();
    names.sort();

    let mut prompt_tokens = 0u64;
    let mut completion_tokens = 0u64;

    for name in names {
        let entry = &stats[name];
        println!(
            "{}: {} turns, {:.2} minutes, {} prompt tokens, {} completion tokens",
            name,
            entry.turns,
            entry.elapsed.as_secs_f64() / 60.0,
            entry.usage.prompt_tokens,
            entry.usage.completion_tokens,
        );
        prompt_tokens += u64::from(entry.usage.prompt_tokens);
        completion_tokens += u64::from(entry.usage.completion_tokens);
    }

    let input_cost = prompt_tokens as f64 * COST_PER_PROMPT_TOKEN;
    let output_cost = completion_tokens as f64 * COST_PER_COMPLETION_TOKEN;

    println!();
    println!("Total execution time: {:.2} minutes", overall.as_secs_f64() / 60.0);
    println!("Total prompt tokens (cumulative): {prompt_tokens}");
    println!("Total completion tokens (cumulative): {completion_tokens}");
    println!(
        "Estimated session cost (cumulative, USD): ${:.4}",
        input_cost + output_cost
    );
}
