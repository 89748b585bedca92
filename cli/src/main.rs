//! CLI entrypoint for tutormesh
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tutormesh_application::{AgentRouter, NoAudit, SendMessageInput, TurnAuditLogger, TutorService};
use tutormesh_domain::{CollaborationStyle, InteractionMode};
use tutormesh_infrastructure::{
    config::ConfigLoader, HealthMonitor, HttpChatBackend, JsonlTurnAudit, MemoryTutorStore,
    ProviderRegistry, RequestExecutor,
};

#[derive(Parser)]
#[command(name = "tutormesh", version, about = "Multi-agent tutoring over interchangeable model providers")]
struct Cli {
    /// Path to a config file (overrides discovered files)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip all config files and use built-in defaults
    #[arg(long, global = true)]
    no_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one message and print the tutors' answer
    Ask {
        /// The question to ask
        question: String,

        /// Interaction mode: manual, router, collaborative, random
        #[arg(long, default_value = "router")]
        mode: String,

        /// Agent to address (manual mode)
        #[arg(long)]
        agent: Option<String>,

        /// Collaboration style: parallel, sequential, debate, random
        #[arg(long)]
        style: Option<String>,

        /// Comma-separated agent ids for collaborative turns
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// RNG seed for random agent selection
        #[arg(long)]
        seed: Option<u64>,

        /// User id owning the session
        #[arg(long, default_value = "local")]
        user: String,

        /// Probe provider health before sending
        #[arg(long)]
        health_check: bool,
    },

    /// List configured tutor agents
    ListAgents {
        /// Include inactive agents
        #[arg(long)]
        all: bool,
    },

    /// List configured providers and their models
    ListProviders,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!("config: {e}"))?
    };
    let collaboration = file_config.collaboration.clone();
    let routing = file_config.routing.clone();
    let audit_path = file_config.audit.path.clone();
    let (providers, models, directory) = file_config
        .into_parts()
        .context("invalid configuration")?;

    // === Dependency Injection ===
    let registry = Arc::new(ProviderRegistry::new(providers, models)?);
    let backend = Arc::new(HttpChatBackend::new());
    let gateway = Arc::new(RequestExecutor::new(Arc::clone(&registry), Arc::clone(&backend)));
    let directory = Arc::new(directory);
    let store = Arc::new(MemoryTutorStore::new());
    let audit: Arc<dyn TurnAuditLogger> = match &audit_path {
        Some(path) => match JsonlTurnAudit::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoAudit),
        },
        None => Arc::new(NoAudit),
    };

    let router = AgentRouter::new(Arc::clone(&directory))
        .with_confidence_floor(routing.confidence_floor);
    let service = TutorService::new(gateway, Arc::clone(&directory), store, audit)
        .with_router(router)
        .with_collaborative_defaults(collaboration.clone());

    match cli.command {
        Command::Ask {
            question,
            mode,
            agent,
            style,
            agents,
            seed,
            user,
            health_check,
        } => {
            let mode: InteractionMode = mode
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            info!(user = %user, mode = mode.as_str(), "sending turn");

            if health_check {
                let monitor = HealthMonitor::new(Arc::clone(&registry), backend);
                monitor.scan().await;
            }

            service.set_mode(&user, mode).await?;
            if let Some(agent_id) = &agent {
                service.set_active_agent(&user, agent_id).await?;
            }

            let mut settings = collaboration;
            if let Some(style) = &style {
                let style: CollaborationStyle =
                    style.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                settings = settings.with_style(style);
            }
            if !agents.is_empty() {
                settings = settings.with_agents(agents);
            }
            if let Some(seed) = seed {
                settings = settings.with_seed(seed);
            }

            let mut input = SendMessageInput::new(&user, &question);
            input.agent_id = agent;
            input.seed = seed;
            input.cancel = Some(ctrl_c_token());
            if mode == InteractionMode::Collaborative {
                input.collaborative = Some(settings);
            }

            let response = service.send_message(input).await?;
            if let Some(welcome) = &response.welcome {
                println!("{welcome}");
                println!();
            }
            println!("{}", response.content);
            if let Some(route) = &response.route {
                info!(
                    agent = %route.agent_id,
                    confidence = route.confidence,
                    "routed"
                );
            }
        }

        Command::ListAgents { all } => {
            let agents = service.list_agents(!all);
            if agents.is_empty() {
                bail!("no agents configured; add [agents.<id>] sections to tutormesh.toml");
            }
            for agent in agents {
                let marker = if agent.active { " " } else { "-" };
                println!("{marker} {:<20} {}", agent.id, agent.description);
            }
        }

        Command::ListProviders => {
            let models = registry.models();
            for provider in registry.providers() {
                let default = if provider.is_default { " (default)" } else { "" };
                let state = if provider.enabled {
                    format!("{:?}", provider.health.status).to_lowercase()
                } else {
                    "disabled".to_string()
                };
                println!("{}{} [{}] {}", provider.name, default, state, provider.base_url);
                for model in models.iter().filter(|m| m.provider == provider.name) {
                    let tag = if model.is_default { "*" } else { " " };
                    println!("  {tag} {:<24} requests: {}", model.id, model.usage.requests);
                }
            }
        }
    }

    Ok(())
}

/// Token cancelled on Ctrl-C, so an in-flight turn aborts cleanly without
/// persisting a half-written exchange.
fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    token
}
