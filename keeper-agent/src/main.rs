//! keeper command-line tool.
//!
//! Usage:
//!   keeper --strategy deterministic status
//!   keeper --root /srv/shop --strategy random --storage env-file watch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keeper_agent::{Agent, AgentConfig, Scheduler};
use keeper_identity::{IdentityStrategy, StorageKind};
use keeper_types::{ProjectStatus, RequestContext};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keeper")]
#[command(about = "Installation identity, registration and liveness for a host application")]
struct Args {
    /// Host installation root
    #[arg(short, long, env = "KEEPER_PROJECT_ROOT", default_value = ".")]
    root: PathBuf,

    /// Remote authority base URL
    #[arg(long, env = "KEEPER_BASE_URL")]
    base_url: Option<String>,

    /// Identity strategy: deterministic or random
    #[arg(long, env = "KEEPER_IDENTITY_STRATEGY")]
    strategy: IdentityStrategy,

    /// Where the identity is kept: flag-file or env-file
    #[arg(long, default_value = "flag-file")]
    storage: StorageKind,

    /// Domain to act for (defaults to the host of APP_URL)
    #[arg(long)]
    domain: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the last known project status
    Status,
    /// Show the installation identity
    Identity,
    /// Run heartbeat and last-seen updates until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let mut config = AgentConfig::discover(&args.root, args.strategy);
    config.storage = args.storage;
    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }
    if let Some(domain) = args.domain {
        config.domain = Some(domain);
    }
    let ctx = RequestContext::detached(config.domain_or_default());
    let agent = Arc::new(Agent::new(config).context("Failed to initialise agent")?);

    match args.command {
        Command::Identity => print_identity(&agent, &ctx),
        Command::Status => {
            agent.boot(&ctx).await;
            let status = agent
                .project_status()
                .await
                .context("Failed to fetch project status")?;
            print_status(&status);
        }
        Command::Watch => run_watch(agent, ctx).await?,
    }
    Ok(())
}

fn print_identity(agent: &Agent, ctx: &RequestContext) {
    let identity = agent.identity();
    let config = agent.config();
    println!("Unique ID:   {}", identity.unique_id);
    println!("Persisted:   {}", if identity.persisted { "yes" } else { "no (in memory only)" });
    println!("Strategy:    {}", config.identity_strategy);
    println!("Storage:     {:?}", config.storage);
    println!("Domain:      {}", ctx.domain);
    println!("Registered:  {}", if agent.is_registered(&ctx.domain) { "yes" } else { "no" });
}

fn print_status(status: &ProjectStatus) {
    let cell = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let row = [cell(&status.last_seen), cell(&status.status), cell(&status.created_at)];
    let headers = ["Last Seen", "Status", "Created At"];
    let widths: Vec<usize> = headers
        .iter()
        .zip(&row)
        .map(|(h, v)| h.len().max(v.chars().count()))
        .collect();

    let rule = widths
        .iter()
        .map(|w| "-".repeat(w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let line = |cells: &[&str]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!(" {c:<w$} "))
            .collect::<Vec<_>>()
            .join("|")
    };

    println!("+{rule}+");
    println!("|{}|", line(&headers));
    println!("+{rule}+");
    println!("|{}|", line(&row.iter().map(String::as_str).collect::<Vec<_>>()));
    println!("+{rule}+");
}

async fn run_watch(agent: Arc<Agent>, ctx: RequestContext) -> Result<()> {
    let identity = agent.identity();
    let registered = agent.boot(&ctx).await.is_some();

    println!("\n========================================");
    println!("  keeper agent running");
    println!("========================================");
    println!("  Identity:   {}", identity.unique_id);
    println!("  Domain:     {}", ctx.domain);
    println!("  Authority:  {}", agent.config().client.base_url);
    println!("  Registered: {}", if registered { "yes" } else { "pending" });
    println!("========================================\n");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(Arc::clone(&agent), ctx);
    let runner = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down...");
    shutdown_tx.send(true).ok();
    runner.await.context("Scheduler task failed")?;
    Ok(())
}
