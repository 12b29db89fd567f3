// crates/quill-cli/src/commands/replies.rs
//
// `quill reply` and `quill thread`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use quill_core::{Post, Reply};

use crate::api_client::ApiClient;
use crate::output::{format_json, print_rows, OutputFormat, ReplyRow};

#[derive(Debug, Serialize, Deserialize)]
struct Thread {
    post: Post,
    replies: Vec<Reply>,
}

pub async fn reply(
    api: &ApiClient,
    post_id: &str,
    content: &str,
    as_origin: Option<&str>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = json!({
        "postId": post_id,
        "replyingOrigin": as_origin,
        "content": content,
    });
    let resp: Value = api.post("/api/replies", &body).await?;

    match format {
        OutputFormat::Json => println!("{}", format_json(&resp)),
        OutputFormat::Table => println!("Reply {} posted", resp["replyId"].as_str().unwrap_or("?")),
    }
    Ok(())
}

pub async fn thread(
    api: &ApiClient,
    post_id: &str,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let thread: Thread = api.get(&format!("/api/replies/{}", post_id)).await?;
    if *format == OutputFormat::Table {
        println!("{} ({})", thread.post.title, thread.post.path());
        println!();
    }
    let rows: Vec<ReplyRow> = thread.replies.iter().map(ReplyRow::from).collect();
    print_rows(format, &thread, &rows);
    Ok(())
}
