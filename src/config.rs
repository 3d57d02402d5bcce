use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AgentConfig {
    /// Endpoint of the text-to-SQL agent service.
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Connection string the agent's SQL runner executes against.
    pub database_url: Option<String>,
    /// Optional credential for the vector-backed agent memory. When absent
    /// the agent falls back to an ephemeral in-process memory.
    pub memory_api_key: Option<String>,
    pub memory_index: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub web: WebConfig,
    pub agent: AgentConfig,
    pub embeddings: EmbeddingConfig,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl AppConfig {
    pub fn new(args: &CliArgs) -> Result<Self, ConfigError> {
        // Defaults first; file and environment sources override them
        let mut config_builder =
            Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        // Add configuration from file if specified
        if let Some(config_path) = &args.config {
            config_builder = config_builder.add_source(File::from(config_path.as_path()));
        } else {
            // Check for config in default locations
            let default_locations = vec![
                "config.toml",
                "config/config.toml",
                "/etc/nl-gate/config.toml",
            ];

            for location in default_locations {
                if Path::new(location).exists() {
                    config_builder =
                        config_builder.add_source(File::new(location, config::FileFormat::Toml));
                    break;
                }
            }
        }

        // Credentials come from the environment, e.g. NLGATE_AGENT__API_KEY
        config_builder =
            config_builder.add_source(Environment::with_prefix("NLGATE").separator("__"));

        let mut config: AppConfig = config_builder.build()?.try_deserialize()?;

        // Override with command line args if provided
        if let Some(host) = &args.host {
            config.web.host = host.clone();
        }
        if let Some(port) = args.port {
            config.web.port = port;
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            agent: AgentConfig {
                api_url: "https://api.openai.com/v1/responses".to_string(),
                api_key: None,
                model: "gpt-4o".to_string(),
                database_url: None,
                memory_api_key: None,
                memory_index: "nl-gate-agent-memory".to_string(),
            },
            embeddings: EmbeddingConfig {
                api_url: "https://api.openai.com/v1/embeddings".to_string(),
                api_key: None,
            },
        }
    }
}
