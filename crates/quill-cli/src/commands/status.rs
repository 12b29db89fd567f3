// crates/quill-cli/src/commands/status.rs
//
// `quill status`: server health plus content and trust counts.

use serde_json::{json, Value};

use quill_core::{FeedEntry, PostSummary};

use crate::api_client::ApiClient;
use crate::output::{format_json, OutputFormat};

pub async fn run(api: &ApiClient, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let health: Value = api.get("/health").await?;
    let posts: Vec<PostSummary> = api.get("/api/posts").await?;
    let feed: Vec<FeedEntry> = api.get("/api/feed").await?;

    // Trust listings need the admin token; show them only when it works.
    let connections: Option<Vec<Value>> = api.get("/api/connections").await.ok();
    let subscriptions: Option<Vec<String>> = api.get("/api/subscriptions").await.ok();

    if *format == OutputFormat::Json {
        let summary = json!({
            "health": health,
            "posts": posts.len(),
            "feedEntries": feed.len(),
            "connections": connections.as_ref().map(Vec::len),
            "subscriptions": subscriptions.as_ref().map(Vec::len),
        });
        println!("{}", format_json(&summary));
        return Ok(());
    }

    println!("Quill instance {}", health["origin"].as_str().unwrap_or("?"));
    println!();
    println!("  Status:        {}", health["status"].as_str().unwrap_or("unknown"));
    println!("  Posts:         {}", posts.len());
    println!("  Feed entries:  {}", feed.len());
    match (&connections, &subscriptions) {
        (Some(c), Some(s)) => {
            println!("  Connections:   {}", c.len());
            println!("  Subscriptions: {}", s.len());
        }
        _ => println!("  Trust:         (pass --token to see connections and subscriptions)"),
    }
    Ok(())
}
