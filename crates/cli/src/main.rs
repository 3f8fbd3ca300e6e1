use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medicheck_agents::TriageAgent;
use medicheck_core::{
    search_directory, select_suggestions_by_key, ChatInput, DirectoryKind, DirectoryQuery,
};
use medicheck_llm::{Generator, OllamaConfig, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use medicheck_observability::{init_tracing_to, AppMetrics, LogTarget};

/// stdout carries command output (pretty JSON, chat replies).
const LOG_TARGET: LogTarget = LogTarget::Stderr;

#[derive(Debug, Parser)]
#[command(name = "medicheck")]
#[command(about = "Medicheck symptom triage CLI")]
struct Cli {
    #[arg(long, env = "MEDICHECK_OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    ollama_url: String,

    #[arg(long, env = "MEDICHECK_OLLAMA_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, env = "MEDICHECK_LLM_TIMEOUT_SECONDS", default_value_t = 120)]
    timeout_seconds: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify one symptom description and print the full response.
    Triage {
        message: String,
        #[arg(long, default_value = "english")]
        language: String,
    },
    Chat {
        #[arg(long, default_value = "english")]
        language: String,
    },
    Suggestions {
        #[arg(long)]
        tier: String,
        #[arg(long, default_value = "english")]
        language: String,
    },
    Doctors {
        #[arg(long)]
        location: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long)]
        emergency: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing_to("medicheck_cli", LOG_TARGET);
    let cli = Cli::parse();
    let config = OllamaConfig {
        base_url: cli.ollama_url,
        model: cli.model,
        timeout: Duration::from_secs(cli.timeout_seconds),
        ..OllamaConfig::default()
    };

    match cli.command {
        Command::Triage { message, language } => {
            let agent = build_agent(&config)?;
            let response = agent
                .handle_chat(ChatInput::new(message, language))
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Chat { language } => {
            let agent = build_agent(&config)?;
            run_chat(agent, &language).await?;
        }
        Command::Suggestions { tier, language } => {
            for suggestion in select_suggestions_by_key(&tier, &language) {
                println!("- {suggestion}");
            }
        }
        Command::Doctors {
            location,
            kind,
            specialty,
            emergency,
        } => {
            let mut query = DirectoryQuery {
                kind: DirectoryKind::parse(kind.as_deref()),
                specialty,
                emergency_only: emergency,
                ..DirectoryQuery::default()
            };
            if let Some(location) = location {
                query.location = location;
            }

            let results = search_directory(&query);
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

async fn run_chat(agent: TriageAgent<Generator>, language: &str) -> Result<()> {
    println!("Medicheck chat mode. type 'exit' to quit.");
    println!("This is not medical advice. Call emergency services for emergencies.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let response = agent.handle_chat(ChatInput::new(message, language)).await?;

        println!("\n{}\n", response.reply);
        println!("Urgency: {}", response.urgency.as_str());
        println!("Suggestions:");
        for suggestion in response.suggestions {
            println!("- {suggestion}");
        }
        println!();
    }

    Ok(())
}

fn build_agent(config: &OllamaConfig) -> Result<TriageAgent<Generator>> {
    let generator = Generator::ollama(config)
        .with_context(|| format!("failed building generation client for {}", config.base_url))?;

    Ok(TriageAgent::new(generator, AppMetrics::shared()))
}
