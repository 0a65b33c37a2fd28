mod interrupt;

pub use interrupt::InterruptRouter;

use clap::{ Args as ClapArgs, Parser, Subcommand };
use crate::config::{ load_widget_config, ConfigError, WidgetConfig };

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the chat relay that forwards `/api/chat` to the upstream provider.
    Serve(ServeArgs),
    /// Chat with the assistant from the terminal through the relay.
    Chat(ChatArgs),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Host address and port for the relay to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Upstream OpenAI-compatible chat-completions endpoint.
    #[arg(
        long,
        env = "UPSTREAM_URL",
        default_value = "https://api.siliconflow.cn/v1/chat/completions"
    )]
    pub upstream_url: String,

    /// Secret key for the upstream provider. Never sent to callers.
    #[arg(long, env = "SILICONFLOW_API_KEY", hide_env_values = true)]
    pub upstream_api_key: Option<String>,

    /// Seconds to wait for the upstream before failing the request.
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value = "60")]
    pub upstream_timeout_secs: u64,

    /// Requests per second accepted across all callers.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ChatArgs {
    /// Path to a JSON widget settings file. Flags below override its values.
    #[arg(long, env = "WIDGET_CONFIG")]
    pub widget_config: Option<String>,

    /// Chat endpoint, normally the relay's /api/chat.
    #[arg(long, env = "CHAT_API_URL")]
    pub api_url: Option<String>,

    /// Client-side key sent as a bearer token. Leave unset when using the relay.
    #[arg(long, env = "CHAT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name placed in each request.
    #[arg(long, env = "CHAT_MODEL")]
    pub model: Option<String>,

    /// Maximum number of turns kept in history.
    #[arg(long, env = "CHAT_MAX_MESSAGES")]
    pub max_messages: Option<usize>,

    /// Seconds before an unanswered request falls back.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: Option<u64>,

    /// Snapshot storage type (file, memory)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Directory holding conversation snapshots for file storage.
    #[arg(long, env = "STORAGE_DIR", default_value = ".portfolio-chat")]
    pub storage_dir: String,
}

impl ChatArgs {
    pub fn widget_config(&self) -> Result<WidgetConfig, ConfigError> {
        let mut config = match &self.widget_config {
            Some(path) => load_widget_config(path)?,
            None => WidgetConfig::default(),
        };
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max) = self.max_messages {
            config.max_messages = max;
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }
}
