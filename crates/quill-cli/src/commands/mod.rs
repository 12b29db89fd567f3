// crates/quill-cli/src/commands/mod.rs
//
// Command module declarations for the Quill CLI.

pub mod feed;
pub mod posts;
pub mod replies;
pub mod status;
pub mod trust;
