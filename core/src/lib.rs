//! Blocking client for the page Markdown API.
//!
//! # Overview
//! Fetches a page as Markdown and appends Markdown to a page over HTTP.
//! `PageClient` resolves paths against a base URL, attaches the bearer token
//! to page routes only, retries transport failures with exponential backoff,
//! and maps non-2xx responses to `ApiError`.
//!
//! # Design
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), so the I/O boundary is explicit
//!   and callers may execute requests themselves.
//! - The round-trip runs through the `Transport` trait; `UreqTransport` is
//!   the default and tests substitute scripted transports.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//!
//! ```no_run
//! use page_core::{ClientConfig, PageClient};
//!
//! let client = PageClient::new(ClientConfig::new("http://localhost:8000", "api-key"));
//! let page = client.get_page("12345678-1234-1234-1234-123456789abc")?;
//! println!("{}: {} characters", page.title, page.markdown.len());
//! # Ok::<(), page_core::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod page_id;
pub mod types;

pub use client::PageClient;
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, ConfigError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError, UreqTransport};
pub use page_id::PageId;
pub use types::{AppendResult, PageContent};
