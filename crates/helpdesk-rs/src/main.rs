//! Interactive terminal client for the helpdesk.

mod repl;

use anyhow::{Context, bail};
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use clap::Parser;
use helpdesk_rs::config::{HelpdeskConfig, LayeredConfigOptions};
use helpdesk_rs::core::{Helpdesk, LlmGenerator, SessionContext};
use helpdesk_rs::protocol::Generator;
use log::{debug, info, warn};
use repl::{Command, HELP, ask, parse_command, warning_lines};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Command-line options for the helpdesk client.
#[derive(Parser)]
#[command(name = "helpdesk", version)]
struct Cli {
    /// Optional path to a helpdesk.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// OpenAI model name for the generative fallback
    #[arg(long)]
    model: Option<String>,
    /// Resume the session behind this ticket
    #[arg(long, conflicts_with_all = ["email", "name"])]
    ticket: Option<String>,
    /// Email to sign in with
    #[arg(long)]
    email: Option<String>,
    /// Display name; starts a new session for the email
    #[arg(long, requires = "email")]
    name: Option<String>,
    /// Request type recorded for new sessions
    #[arg(long, default_value = "General")]
    request_type: String,
    /// Start a new session instead of resuming the latest one
    #[arg(long)]
    new: bool,
}

type InputLines = Lines<BufReader<Stdin>>;

/// Entry point for the helpdesk client.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    helpdesk_rs::init_logging();

    let cli = Cli::parse();
    info!(
        "starting helpdesk (config_set={}, model_set={}, ticket_set={}, email_set={})",
        cli.config.is_some(),
        cli.model.is_some(),
        cli.ticket.is_some(),
        cli.email.is_some()
    );
    let cwd = std::env::current_dir().context("cwd")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        info!("loading config from path: {}", path.display());
        options = options.with_config_path(path);
    }
    let layered =
        HelpdeskConfig::load_layered_with_options(options).context("failed to load config")?;
    for layer in &layered.layers {
        debug!("config layer applied (source={:?}, origin={})", layer.source, layer.origin);
    }
    let config = layered.config;

    let mut builder = Helpdesk::builder(config.clone());
    if let Some(generator) = build_generator(&cli, &config)? {
        builder = builder.generator(generator);
    }
    let helpdesk = builder.build().context("failed to build helpdesk")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ctx = SessionContext::new();
    sign_in(&helpdesk, &mut ctx, &cli, &mut lines).await?;
    if let Some(ticket) = ctx.ticket() {
        println!("Your ticket: {ticket} (use --ticket to come back later)");
    }
    for (position, message) in ctx.messages().iter().enumerate() {
        println!("[{}] you: {}", position + 1, message.question);
        println!("    {}: {}", config.assistant.name, message.answer);
    }
    if let Some(greeting) = helpdesk.greeting(&mut ctx) {
        println!("{}: {greeting}", config.assistant.name);
    }
    println!("Type /help for commands.");

    while let Some(line) = prompt(&mut lines, "> ").await? {
        match parse_command(&line) {
            Command::Empty => {}
            Command::Ask(text) => {
                for line in ask(&helpdesk, &mut ctx, text).await {
                    println!("{line}");
                }
            }
            Command::Rate { index, liked } => {
                match helpdesk.set_feedback(&mut ctx, index, liked).await {
                    Ok(outcome) => {
                        println!("Thanks for the feedback.");
                        for line in warning_lines(&outcome.warnings) {
                            println!("{line}");
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Command::History => {
                for (position, message) in ctx.messages().iter().enumerate() {
                    let rating = match message.feedback() {
                        Some(true) => " 👍",
                        Some(false) => " 👎",
                        None => "",
                    };
                    println!(
                        "[{}] {} -> {} ({}, {:.2}){rating}",
                        position + 1,
                        message.question,
                        message.answer,
                        message.provenance,
                        message.confidence
                    );
                }
            }
            Command::Sessions => {
                let Some(email) = ctx.active().map(|session| session.user.email.clone()) else {
                    continue;
                };
                for summary in helpdesk.sessions_for(&email)? {
                    println!(
                        "{}  {}  {} messages  {}",
                        summary.ticket,
                        summary.started_at.format("%Y-%m-%d %H:%M"),
                        summary.message_count,
                        summary.preview.unwrap_or_default()
                    );
                }
            }
            Command::Report => println!("{}", helpdesk.monitoring_report()?),
            Command::Help => println!("{HELP}"),
            Command::Unknown(input) => println!("Unknown command: {input}\n{HELP}"),
            Command::Close | Command::Quit => break,
        }
    }

    if let Some(ticket) = ctx.ticket().map(str::to_string) {
        helpdesk.close(&mut ctx);
        println!("Session closed. Your ticket: {ticket}");
    }
    Ok(())
}

/// Build the OpenAI-backed generator when an API key is present.
fn build_generator(
    cli: &Cli,
    config: &HelpdeskConfig,
) -> anyhow::Result<Option<Arc<dyn Generator>>> {
    if !config.generation.enabled {
        info!("generative fallback disabled by config");
        return Ok(None);
    }
    if config.generation.provider != "openai" {
        warn!(
            "unsupported generation provider, fallback disabled (provider={})",
            config.generation.provider
        );
        return Ok(None);
    }
    let Ok(api_key) = std::env::var("OPENAI_API_KEY") else {
        warn!("OPENAI_API_KEY not set, generative fallback disabled");
        return Ok(None);
    };
    let model_name = cli
        .model
        .clone()
        .or_else(|| std::env::var("OPENAI_MODEL").ok())
        .unwrap_or_else(|| config.generation.model.clone());
    info!("building OpenAI generator (model={})", model_name);
    let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
        .api_key(api_key)
        .model(model_name.clone())
        .build()
        .context("failed to build OpenAI LLM provider")?;
    Ok(Some(Arc::new(LlmGenerator::new(llm, model_name))))
}

/// Resume or start the session requested on the command line, asking for an
/// email and name when none were given.
async fn sign_in(
    helpdesk: &Helpdesk,
    ctx: &mut SessionContext,
    cli: &Cli,
    lines: &mut InputLines,
) -> anyhow::Result<()> {
    if let Some(ticket) = cli.ticket.as_deref() {
        helpdesk
            .resume_by_ticket(ctx, ticket)
            .with_context(|| format!("failed to resume ticket {ticket}"))?;
        return Ok(());
    }
    let email = match cli.email.clone() {
        Some(email) => email,
        None => match prompt(lines, "Email: ").await? {
            Some(email) => email,
            None => bail!("no email given"),
        },
    };
    let name = match cli.name.clone() {
        Some(name) => Some(name),
        None if cli.email.is_none() => prompt(lines, "Name: ").await?,
        None => None,
    };
    if let Some(name) = name {
        helpdesk
            .register_or_login(ctx, &email, &name, &cli.request_type)
            .context("failed to sign in")?;
        return Ok(());
    }
    let start_new = cli.new;
    helpdesk
        .resume_by_email(ctx, &email, &cli.request_type, |sessions| {
            if start_new {
                None
            } else {
                sessions.first().map(|summary| summary.ticket.clone())
            }
        })
        .context("failed to sign in by email")?;
    Ok(())
}

async fn prompt(lines: &mut InputLines, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush().context("flush stdout")?;
    Ok(lines.next_line().await.context("read stdin")?)
}
