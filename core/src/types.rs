//! Domain DTOs for the page API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Health and info
//! responses stay as raw `serde_json::Value` since their shape is open.

use serde::{Deserialize, Serialize};

/// A page rendered as Markdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageContent {
    pub markdown: String,
    pub title: String,
}

/// Result of an append call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppendResult {
    pub success: bool,
}
