// crates/quill-cli/src/commands/posts.rs
//
// `quill post {list, create, update}`.

use clap::Subcommand;
use serde_json::{json, Value};

use quill_core::PostSummary;

use crate::api_client::ApiClient;
use crate::output::{format_json, print_rows, OutputFormat, PostRow};

#[derive(Debug, Subcommand)]
pub enum PostCmd {
    /// List posts, newest first.
    List,
    /// Create a post; subscribers are notified.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        teaser: String,
    },
    /// Replace a post's title, content and teaser.
    Update {
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        teaser: String,
    },
}

pub async fn run(
    api: &ApiClient,
    cmd: &PostCmd,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        PostCmd::List => {
            let posts: Vec<PostSummary> = api.get("/api/posts").await?;
            let rows: Vec<PostRow> = posts.iter().map(PostRow::from).collect();
            print_rows(format, &posts, &rows);
        }
        PostCmd::Create {
            title,
            content,
            teaser,
        } => {
            let body = json!({ "title": title, "content": content, "teaser": teaser });
            let created: Value = api.post("/api/posts", &body).await?;
            report(format, "Created", &created);
        }
        PostCmd::Update {
            slug,
            title,
            content,
            teaser,
        } => {
            let body = json!({ "title": title, "content": content, "teaser": teaser });
            let updated: Value = api.put(&format!("/api/posts/{}", slug), &body).await?;
            report(format, "Updated", &updated);
        }
    }
    Ok(())
}

fn report(format: &OutputFormat, verb: &str, post: &Value) {
    match format {
        OutputFormat::Json => println!("{}", format_json(post)),
        OutputFormat::Table => println!(
            "{} post {} (/posts/{})",
            verb,
            post["postId"].as_str().unwrap_or("?"),
            post["slug"].as_str().unwrap_or("?")
        ),
    }
}
