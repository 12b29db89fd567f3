// crates/quill-cli/src/output.rs
//
// Output formatting utilities for the Quill CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use quill_core::{Connection, FeedEntry, PostSummary, Reply};

/// Output format for CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Print `raw` as JSON, or its table rows.
pub fn print_rows<T: Serialize, R: Tabled>(format: &OutputFormat, raw: &T, rows: &[R]) {
    match format {
        OutputFormat::Json => println!("{}", format_json(raw)),
        OutputFormat::Table if rows.is_empty() => println!("(none)"),
        OutputFormat::Table => println!("{}", format_table(rows)),
    }
}

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

#[derive(Tabled)]
pub struct PostRow {
    #[tabled(rename = "Post ID")]
    pub post_id: String,
    #[tabled(rename = "Slug")]
    pub slug: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Replies")]
    pub replies: usize,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&PostSummary> for PostRow {
    fn from(s: &PostSummary) -> Self {
        Self {
            post_id: s.post.post_id.clone(),
            slug: s.post.slug.clone(),
            title: truncate(&s.post.title, 40),
            replies: s.reply_count,
            updated: s.post.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct FeedRow {
    #[tabled(rename = "Origin")]
    pub origin: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Replies")]
    pub replies: usize,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

impl From<&FeedEntry> for FeedRow {
    fn from(e: &FeedEntry) -> Self {
        Self {
            origin: e.origin.clone(),
            title: truncate(&e.title, 40),
            path: e.path.clone(),
            replies: e.reply_count,
            updated: e.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct OriginRow {
    #[tabled(rename = "Origin")]
    pub origin: String,
    #[tabled(rename = "Since")]
    pub since: String,
}

impl From<&Connection> for OriginRow {
    fn from(c: &Connection) -> Self {
        Self {
            origin: c.origin.clone(),
            since: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct ReplyRow {
    #[tabled(rename = "Reply ID")]
    pub reply_id: String,
    #[tabled(rename = "From")]
    pub origin: String,
    #[tabled(rename = "Content")]
    pub content: String,
}

impl From<&Reply> for ReplyRow {
    fn from(r: &Reply) -> Self {
        Self {
            reply_id: r.reply_id.clone(),
            origin: r.origin.clone(),
            content: truncate(&r.content, 60),
        }
    }
}

/// Truncate to `max_chars` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_origin_table_has_headers() {
        let rows = vec![OriginRow {
            origin: "b.example".to_string(),
            since: "2024-01-01 00:00".to_string(),
        }];
        let table = format_table(&rows);
        assert!(table.contains("Origin"));
        assert!(table.contains("b.example"));
    }
}
