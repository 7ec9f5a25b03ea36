//! authgate - token and password authentication service
//!
//! Serves the authentication API, or mints access tokens with the same
//! configuration for local testing.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use authgate_api::{ApiServer, ApiServerConfig};
use authgate_auth::{
    hash_password, Algorithm, CredentialStore, InMemoryCredentialStore, TokenCodec, TokenConfig,
};
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_SECRET_KEY: &str = "your-secret-key-change-in-production";

/// authgate - bearer token and password authentication for HTTP services
#[derive(Parser, Debug)]
#[command(name = "authgate")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    "\nCommit: ",
    env!("AUTHGATE_GIT_HASH"),
    "\nBuilt: ",
    env!("AUTHGATE_BUILD_TIME")
))]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Token signing settings shared by every subcommand
#[derive(Args, Debug)]
struct TokenArgs {
    /// HMAC secret used to sign and verify access tokens
    #[arg(long, env = "AUTHGATE_SECRET_KEY", default_value = DEFAULT_SECRET_KEY, hide_env_values = true)]
    secret_key: String,

    /// Signing algorithm (HS256, HS384 or HS512)
    #[arg(long, env = "AUTHGATE_ALGORITHM", default_value = "HS256")]
    algorithm: String,

    /// Expected token issuer
    #[arg(long, env = "AUTHGATE_ISSUER", default_value = "http://localhost:8000")]
    issuer: String,

    /// Lifetime of tokens issued at login, in minutes
    #[arg(long, env = "AUTHGATE_ACCESS_TOKEN_EXPIRE_MINUTES", default_value = "30")]
    access_token_expire_minutes: i64,
}

impl TokenArgs {
    fn into_config(self) -> Result<TokenConfig> {
        let algorithm = Algorithm::from_str(&self.algorithm)
            .with_context(|| format!("Unknown signing algorithm '{}'", self.algorithm))?;

        if self.access_token_expire_minutes <= 0 {
            bail!("--access-token-expire-minutes must be positive");
        }
        let access_token_ttl = minutes_to_ttl(self.access_token_expire_minutes)
            .context("--access-token-expire-minutes is out of range")?;

        if self.secret_key == DEFAULT_SECRET_KEY {
            warn!("Using the built-in default secret key; set AUTHGATE_SECRET_KEY in production");
        }

        Ok(TokenConfig {
            secret_key: self.secret_key,
            algorithm,
            issuer: self.issuer,
            access_token_ttl,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the authentication API server
    #[command(long_about = r#"
Run the authentication API server.

ENVIRONMENT VARIABLES:
  AUTHGATE_BIND                         Address to listen on
  AUTHGATE_SECRET_KEY                   Token signing secret
  AUTHGATE_ALGORITHM                    HS256, HS384 or HS512
  AUTHGATE_ISSUER                       Token issuer
  AUTHGATE_ACCESS_TOKEN_EXPIRE_MINUTES  Login token lifetime
  AUTHGATE_CORS_ORIGINS                 Comma-separated allowed origins
  AUTHGATE_ADMIN_USERNAME               Seed an admin account (optional)
  AUTHGATE_ADMIN_PASSWORD               Password for the seeded admin
    "#)]
    Serve {
        /// Address to bind the API server
        #[arg(long, env = "AUTHGATE_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,

        #[command(flatten)]
        token: TokenArgs,

        /// Allowed CORS origin (repeatable; default mirrors the request origin)
        #[arg(long = "cors-origin", env = "AUTHGATE_CORS_ORIGINS", value_delimiter = ',')]
        cors_origins: Vec<String>,

        /// Disable CORS headers entirely
        #[arg(long)]
        no_cors: bool,

        /// Username of an admin account created at start-up
        #[arg(long, env = "AUTHGATE_ADMIN_USERNAME", requires = "admin_password")]
        admin_username: Option<String>,

        /// Password of the admin account created at start-up
        #[arg(long, env = "AUTHGATE_ADMIN_PASSWORD", hide_env_values = true, requires = "admin_username")]
        admin_password: Option<String>,
    },

    /// Mint an access token for a user
    Token {
        #[command(flatten)]
        token: TokenArgs,

        /// Subject (user ID)
        #[arg(long)]
        user_id: String,

        /// Username claim
        #[arg(long)]
        username: String,

        /// Role claim (omitted when not set; validators default it to "user")
        #[arg(long)]
        role: Option<String>,

        /// Validity in minutes (defaults to 15)
        #[arg(long)]
        minutes: Option<i64>,
    },
}

fn minutes_to_ttl(minutes: i64) -> Result<Duration> {
    Duration::try_minutes(minutes).context("Duration overflows")
}

/// Setup logging with the specified log level
fn setup_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };

    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

async fn serve(config: ApiServerConfig, admin: Option<(String, String)>) -> Result<()> {
    let store = Arc::new(InMemoryCredentialStore::new());

    if let Some((username, password)) = admin {
        let password_hash = hash_password(&password).context("Failed to hash admin password")?;
        store
            .insert(&username, &password_hash, "admin")
            .await
            .context("Failed to seed admin account")?;
        info!("Seeded admin account '{}'", username);
    }

    let server = ApiServer::new(config, store).context("Invalid token configuration")?;
    server.start().await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    match cli.command {
        Commands::Serve {
            bind,
            token,
            cors_origins,
            no_cors,
            admin_username,
            admin_password,
        } => {
            let config = ApiServerConfig {
                bind_addr: bind,
                enable_cors: !no_cors,
                cors_origins: if cors_origins.is_empty() {
                    None
                } else {
                    Some(cors_origins)
                },
                token: token.into_config()?,
            };

            serve(config, admin_username.zip(admin_password)).await
        }
        Commands::Token {
            token,
            user_id,
            username,
            role,
            minutes,
        } => {
            let codec = TokenCodec::new(&token.into_config()?)?;
            let ttl = minutes
                .map(|m| minutes_to_ttl(m).context("--minutes is out of range"))
                .transpose()?;
            let access_token = codec.issue(&user_id, &username, role.as_deref(), ttl)?;

            println!("{}", access_token);
            Ok(())
        }
    }
}
