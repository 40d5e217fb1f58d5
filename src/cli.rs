use clap::Parser;
use std::path::PathBuf;

use crate::agents::config::RuntimeKind;

/// Buying Assistant - conversational shopping advice over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "buying-assistant", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "BUYING_ASSISTANT_CONFIG", default_value = "buying-assistant.toml")]
    pub config: PathBuf,

    /// Server host address
    #[arg(long, env = "BUYING_ASSISTANT_HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(long, env = "BUYING_ASSISTANT_PORT")]
    pub port: Option<u16>,

    /// Directory of static files served outside the API
    #[arg(long, env = "BUYING_ASSISTANT_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Agent runtime: "gemini" (in-process) or "remote" (ADK-compatible server)
    #[arg(long, env = "BUYING_ASSISTANT_RUNTIME")]
    pub runtime: Option<RuntimeKind>,

    /// Base URL of the remote agent server
    #[arg(long, env = "BUYING_ASSISTANT_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Gemini model name
    #[arg(long, env = "BUYING_ASSISTANT_MODEL")]
    pub model: Option<String>,
}
