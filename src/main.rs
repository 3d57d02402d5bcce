use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

mod agent;
mod config;
mod embeddings;
mod schema_context;
mod util;
mod web;
mod workflow;

use crate::agent::client::AgentClient;
use crate::config::{AppConfig, CliArgs};
use crate::embeddings::EmbeddingClient;
use crate::util::logging::init_tracing;
use crate::web::state::AppState;
use crate::workflow::ApprovalWorkflow;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Build the agent client; missing credentials are fatal here
    info!("Initializing text-to-SQL agent client");
    let agent_client = AgentClient::new(&config.agent)?;
    let memory_backend = agent_client.memory_backend().clone();

    let workflow = ApprovalWorkflow::new(Box::new(agent_client));

    // Prepare the schema context up front; the endpoint can re-run this
    info!("Preparing schema context");
    workflow.prepare_context().await;

    // Embeddings are optional; the endpoint reports unavailable without them
    let embeddings = match EmbeddingClient::new(&config.embeddings) {
        Ok(client) => Some(client),
        Err(e) => {
            warn!("Embedding features disabled: {}", e);
            None
        }
    };

    let app_state = Arc::new(AppState::new(
        config.clone(),
        workflow,
        embeddings,
        memory_backend,
    ));

    // Start the web server
    info!(
        "Starting nl-gate server on {}:{}",
        config.web.host, config.web.port
    );
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(std::io::Error::other(e.to_string()).into());
        }
    }

    Ok(())
}
