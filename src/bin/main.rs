use std::path::PathBuf;
use std::sync::Arc;

use activity_auth::config::{
    ALLOWED_ORIGIN_ENV, CLIENT_ID_ENV, DEFAULT_RELAY_BIND, TOKEN_URL_ENV,
};
use activity_auth::overrides::OverrideKey;
use activity_auth::sdk::LineTransport;
use activity_auth::{
    ClientConfig, FileStore, LaunchParams, MemoryStore, OverrideStore, RelayClient, RelayConfig,
    SessionStore, SetupOptions, TokenExchange, create_provider,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_LOG_DIRECTIVE: &str = "activity_auth=info";

#[derive(Parser)]
#[command(name = "activity-auth")]
#[command(about = "Embedded activity session handshake and token relay")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the token relay (holds the client secret)
    Relay {
        /// Bind address, e.g. 0.0.0.0:3001
        #[arg(long, default_value = DEFAULT_RELAY_BIND)]
        bind: String,
        /// OAuth token endpoint to exchange codes against
        #[arg(long, env = TOKEN_URL_ENV)]
        token_url: Option<String>,
        /// Extra origin allowed to call the relay cross-origin
        #[arg(long, env = ALLOWED_ORIGIN_ENV)]
        allowed_origin: Option<String>,
    },
    /// Establish a session for a launch URL and print the session context
    Session {
        /// Page URL the activity was launched with
        #[arg(long)]
        url: Url,
        #[arg(long, env = CLIENT_ID_ENV)]
        client_id: String,
        /// Origin serving the token relay (defaults to the launch URL's origin)
        #[arg(long)]
        relay: Option<Url>,
        /// File backing the per-tab identity overrides (in-memory if omitted)
        #[arg(long)]
        store: Option<PathBuf>,
        /// Only wait for readiness, skip authorization
        #[arg(long, default_value_t = false)]
        no_auth: bool,
        /// Comma-separated scopes (defaults to identify,guilds)
        #[arg(long)]
        scope: Option<String>,
    },
    /// Print the identity a mock session would use for a launch URL
    Identity {
        #[arg(long)]
        url: Url,
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout may carry bridge frames, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref())?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Relay {
            bind,
            token_url,
            allowed_origin,
        } => {
            let mut config = RelayConfig::from_env()?.with_bind(bind);
            if let Some(url) = token_url {
                config = config.with_token_url(url);
            }
            if let Some(origin) = allowed_origin {
                config = config.with_allowed_origin(origin);
            }
            info!("Starting token relay with {:?}", config);
            activity_auth::relay::serve(config).await?;
        }
        Commands::Session {
            url,
            client_id,
            relay,
            store,
            no_auth,
            scope,
        } => {
            let params = LaunchParams::from_url(&url);
            let config = ClientConfig::new(client_id);
            let storage = open_store(store)?;

            let relay_origin = relay.unwrap_or_else(|| url.clone());

            let options = SetupOptions {
                authenticate: !no_auth,
                scope: scope.map(|s| parse_scopes(&s)),
            };

            let provider = create_provider(
                &params,
                &config,
                storage,
                options,
                || Arc::new(LineTransport::stdio()),
                || {
                    let client = RelayClient::for_origin(&relay_origin)?;
                    info!("Exchanging codes via {}", client.endpoint());
                    let exchange: Arc<dyn TokenExchange> = Arc::new(client);
                    Ok(exchange)
                },
            )?;
            provider.mount().await;

            let context = provider.wait_until_settled().await;
            println!("{}", serde_json::to_string_pretty(&context)?);
        }
        Commands::Identity { url, store } => {
            let overrides = OverrideStore::new(LaunchParams::from_url(&url), open_store(store)?);
            for key in OverrideKey::ALL {
                println!("{:<12} {}", key.as_str(), overrides.resolve(key));
            }
        }
    }

    Ok(())
}

fn open_store(path: Option<PathBuf>) -> Result<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match path {
        Some(path) => {
            info!("Using tab storage at {}", path.display());
            Arc::new(FileStore::open(path)?)
        }
        None => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// `RUST_LOG` when set, otherwise info for this crate.
fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
    }
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|scope| scope.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
