use anyhow::Result;
use clap::Parser;
use colored::*;

use docchat_cli::{display_banner, print_response, prompt_confirm, read_query};
use docchat_core::Config;
use docchat_rag::RagEngine;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "RAG assistant that answers questions over a local document set", long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let _cli = Cli::parse();

    // Phase 1: configuration. Every violation is reported at once, before
    // any backend cost is incurred.
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{} {}", "❌".red(), e);
            std::process::exit(2);
        }
    };
    log::debug!("Configuration: {}", config.redacted());

    display_banner();

    // Phase 2: dependency construction, inside its own error boundary so
    // environment problems are not mistaken for configuration ones.
    let mut engine = match RagEngine::new(config).await {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to initialize the RAG engine: {}", e);
            eprintln!("{} {}", "❌".red(), e);
            eprintln!(
                "{}",
                "Check that the configured store backend is reachable and the provider credentials are valid."
                    .dimmed()
            );
            std::process::exit(1);
        }
    };

    let key_name = engine.config().namespace.clone();
    if !ensure_index(&mut engine, &key_name).await? {
        println!("{}", "No index available; nothing to query.".yellow());
        return Ok(());
    }

    let query = read_query()?;
    if query.is_empty() {
        println!("{}", "Empty query; nothing to do.".yellow());
        return Ok(());
    }

    // Interruption is handled only around the query step; an interrupt
    // during index construction terminates the process immediately.
    tokio::select! {
        result = engine.run(&query, &key_name) => match result {
            Ok(answer) => print_response(&answer),
            Err(e) => {
                log::error!("Query failed: {}", e);
                eprintln!("{} {}", "❌".red(), e);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            log::info!("Interrupted while waiting for the agent, exiting");
            println!("\n{}", "Interrupted.".yellow());
        }
    }

    Ok(())
}

fn load_config() -> docchat_core::Result<Config> {
    let config = Config::from_env()?;
    config.validate(true)?;
    Ok(config)
}

/// Try to load the index for `key_name`; when absent, offer to build one
/// from the configured input paths. Returns whether an index is available.
async fn ensure_index(engine: &mut RagEngine, key_name: &str) -> Result<bool> {
    if engine.load_index(key_name).await?.is_some() {
        return Ok(true);
    }

    println!(
        "{} No index found for namespace '{}'.",
        "ℹ️".blue(),
        key_name
    );
    let paths = engine.config().input_files.join(", ");
    if !prompt_confirm(&format!("Create one from {}?", paths))? {
        return Ok(false);
    }

    println!("{} Building index, this may take a while...", "⏳".blue());
    engine.create_index(key_name).await?;
    println!("{} Index created.", "✅".green());
    Ok(true)
}
