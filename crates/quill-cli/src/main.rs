// crates/quill-cli/src/main.rs
//
// CLI entrypoint for operating a Quill instance over its HTTP surfaces.
//
// Admin commands (connect, post create/update, trust listings) send the
// admin secret as a bearer token; read-only commands need no token.

mod api_client;
mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::posts::PostCmd;
use commands::trust::TrustCmd;

use api_client::ApiClient;
use output::OutputFormat;

/// Quill CLI: operator tools for a federated blog instance.
#[derive(Parser, Debug)]
#[command(name = "quill", version = "0.1.0", about = "Quill instance operator CLI")]
struct Cli {
    /// Base URL of the quilld HTTP server.
    #[arg(long, global = true, default_value = "http://localhost:8080")]
    server: String,

    /// Admin secret, sent as a bearer token.
    #[arg(long, global = true, env = "QUILL_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Trust a remote origin (admin).
    Connect {
        /// Remote origin, e.g. blog.example.com.
        origin: String,
        /// Remote page to return to after connecting.
        #[arg(long)]
        path: Option<String>,
    },

    /// Ask the server whether it trusts an origin.
    Check {
        origin: String,
    },

    /// Connection and subscription listings (admin).
    #[command(subcommand)]
    Trust(TrustCmd),

    /// Post management: list, create, update.
    #[command(subcommand)]
    Post(PostCmd),

    /// Reply to a post, as admin or as a claimed remote origin.
    Reply {
        post_id: String,
        content: String,
        /// Claimed home origin (visitor replies).
        #[arg(long = "as")]
        as_origin: Option<String>,
    },

    /// Show a post's reply thread.
    Thread {
        post_id: String,
    },

    /// List received feed entries.
    Feed,

    /// Display server health and counts.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.server, cli.token.clone());
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    match &cli.command {
        Commands::Connect { origin, path } => {
            commands::trust::connect(&api, origin, path.as_deref(), &format).await?
        }
        Commands::Check { origin } => commands::trust::check(&api, origin, &format).await?,
        Commands::Trust(cmd) => commands::trust::run(&api, cmd, &format).await?,
        Commands::Post(cmd) => commands::posts::run(&api, cmd, &format).await?,
        Commands::Reply {
            post_id,
            content,
            as_origin,
        } => commands::replies::reply(&api, post_id, content, as_origin.as_deref(), &format).await?,
        Commands::Thread { post_id } => commands::replies::thread(&api, post_id, &format).await?,
        Commands::Feed => commands::feed::run(&api, &format).await?,
        Commands::Status => commands::status::run(&api, &format).await?,
    }

    Ok(())
}
