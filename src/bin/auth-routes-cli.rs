use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use auth_routes::config::validation::validate_config;
use auth_routes::config::{load_config, AuthConfig, ConfigError};
use auth_routes::session::Principal;
use auth_routes::HttpServer;

#[derive(Parser)]
#[command(name = "auth-routes-cli")]
#[command(about = "Management CLI for the auth routes service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Status,
    /// List the registered routes and their guards
    Routes,
    /// Print a signed email verification link
    SignVerification {
        /// Configuration file holding app.url and app.key
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        email: String,
        /// Override verification.link_ttl_secs
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let res = client.get(format!("{}/admin/routes", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::SignVerification { config, id, email, ttl_secs } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => AuthConfig::default(),
            };
            if let Some(ttl) = ttl_secs {
                config.verification.link_ttl_secs = ttl;
            }
            validate_config(&config).map_err(ConfigError::Validation)?;
            let server = HttpServer::new(config)?;
            let url = server.state().verification_url(&Principal::new(id, email))?;
            println!("{url}");
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
