//! `inkpad titles ...`: title suggestions and analysis from the remote.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::remote;

pub const DEFAULT_TITLE_COUNT: usize = 5;

pub async fn run_titles_generate(config: &Config, topic: &str, count: usize) -> Result<()> {
    if count == 0 {
        bail!("--count must be >= 1");
    }
    let remote = remote::from_config(config)?;
    let titles = remote.generate_titles(topic, count).await?;
    if titles.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }
    for (i, title) in titles.iter().enumerate() {
        println!("{:>2}. {}", i + 1, title);
    }
    Ok(())
}

pub async fn run_titles_analyze(config: &Config, title: &str) -> Result<()> {
    let remote = remote::from_config(config)?;
    let analysis = remote.analyze_title(title).await?;

    println!("--- Title ---");
    println!("{}", analysis.title);
    println!();

    if !analysis.psychology.is_empty() {
        println!("--- Psychology ---");
        for item in &analysis.psychology {
            println!("- {}", item);
        }
        println!();
    }

    if !analysis.elements.is_empty() {
        println!("--- Elements ({}) ---", analysis.elements.len());
        for element in &analysis.elements {
            println!("[{}] {}", element.category, element.text);
            if !element.explain.is_empty() {
                println!("    {}", element.explain);
            }
        }
        println!();
    }

    if !analysis.routine.is_empty() {
        println!("routine:  {}", analysis.routine);
    }
    if !analysis.scenario.is_empty() {
        println!("scenario: {}", analysis.scenario);
    }
    Ok(())
}
