// crates/quill-cli/src/commands/trust.rs
//
// `quill connect`, `quill check`, `quill trust {connections, subscriptions}`.

use clap::Subcommand;
use serde_json::{json, Value};

use quill_core::Connection;

use crate::api_client::ApiClient;
use crate::output::{format_json, print_rows, OriginRow, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum TrustCmd {
    /// Origins this instance trusts.
    Connections,
    /// Origins this instance pushes updates to.
    Subscriptions,
}

pub async fn connect(
    api: &ApiClient,
    origin: &str,
    path: Option<&str>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = api.token().ok_or("connect needs --token or QUILL_ADMIN_TOKEN")?;
    let resp: Value = api
        .post(
            "/api/connect",
            &json!({ "origin": origin, "password": password, "path": path }),
        )
        .await?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => {
            println!("Now trusting {}", resp["origin"].as_str().unwrap_or(origin));
            println!("Hand-back URL: {}", resp["redirect"].as_str().unwrap_or(""));
        }
    }
    Ok(())
}

pub async fn check(
    api: &ApiClient,
    origin: &str,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let trusted: Value = api
        .get_with_query("/api/check-connection", &[("origin", origin)])
        .await?;

    match format {
        OutputFormat::Json => println!("{}", trusted),
        OutputFormat::Table if trusted == Value::Bool(true) => println!("{} is trusted", origin),
        OutputFormat::Table => println!("{} is not trusted", origin),
    }
    Ok(())
}

pub async fn run(
    api: &ApiClient,
    cmd: &TrustCmd,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        TrustCmd::Connections => {
            let connections: Vec<Connection> = api.get("/api/connections").await?;
            let rows: Vec<OriginRow> = connections.iter().map(OriginRow::from).collect();
            print_rows(format, &connections, &rows);
        }
        TrustCmd::Subscriptions => {
            let origins: Vec<String> = api.get("/api/subscriptions").await?;
            match format {
                OutputFormat::Json => println!("{}", format_json(&origins)),
                OutputFormat::Table if origins.is_empty() => println!("(none)"),
                OutputFormat::Table => {
                    for origin in &origins {
                        println!("{}", origin);
                    }
                }
            }
        }
    }
    Ok(())
}
