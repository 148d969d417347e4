//! courier - run capability agents and plan trips

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use courier::config::{load_config, AgentKind, AppConfig};
use courier::fleet::Fleet;
use courier::server::AgentServer;
use courier::transport::{HttpTransport, Transport};
use courier::RemoteClient;

#[derive(Parser)]
#[command(name = "courier")]
#[command(about = "Capability agents and a trip planner over a streaming task protocol")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); COURIER__* variables override it
    #[arg(short, long, value_name = "FILE", env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve one agent over HTTP
    Serve {
        /// weather, translator, planner, search or calculator
        agent: AgentKind,
    },
    /// Plan a trip: "destination, departure, language"
    Plan {
        text: String,
        /// Run every agent in this process instead of calling the planner over HTTP
        #[arg(long)]
        local: bool,
    },
    /// Print an agent's card as JSON
    Card { agent: AgentKind },
}

async fn plan(config: &AppConfig, text: &str, local: bool) -> Result<String> {
    let transport: Arc<dyn Transport> = if local {
        Arc::new(Fleet::new(config).local().context("assembling local agents")?)
    } else {
        Arc::new(HttpTransport::new(config.client.connect_timeout())?)
    };

    let address = config.url(AgentKind::Planner);
    let client = RemoteClient::new("planner", &address, transport).with_deadline(config.client.deadline());
    client
        .call(text)
        .await
        .with_context(|| format!("planning \"{text}\" via {address}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    courier::observability::init();

    let cli = Cli::parse();
    let config = load_config(cli.config).context("loading configuration")?;
    let fleet = Fleet::new(&config);

    match cli.command {
        Command::Serve { agent } => {
            let handle = fleet.agent(agent).with_context(|| format!("building {agent} agent"))?;
            let bind = config.bind(agent);
            info!(agent = %agent, bind = %bind, simulation = config.simulation.enabled, "Starting agent server");
            AgentServer::new(handle)
                .serve(&bind)
                .await
                .with_context(|| format!("serving {agent} on {bind}"))?;
        }
        Command::Plan { text, local } => {
            println!("{}", plan(&config, &text, local).await?);
        }
        Command::Card { agent } => {
            let handle = fleet.agent(agent).with_context(|| format!("building {agent} agent"))?;
            println!("{}", serde_json::to_string_pretty(handle.card())?);
        }
    }

    Ok(())
}
