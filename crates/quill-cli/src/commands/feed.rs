// crates/quill-cli/src/commands/feed.rs
//
// `quill feed`: received entries from trusted instances.

use quill_core::FeedEntry;

use crate::api_client::ApiClient;
use crate::output::{print_rows, FeedRow, OutputFormat};

pub async fn run(api: &ApiClient, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let entries: Vec<FeedEntry> = api.get("/api/feed").await?;
    let rows: Vec<FeedRow> = entries.iter().map(FeedRow::from).collect();
    print_rows(format, &entries, &rows);
    Ok(())
}
