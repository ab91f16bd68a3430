//! Request building, retry, and response mapping for the page API.
//!
//! # Design
//! `PageClient` holds the normalized base URL, the API key, the retry budget
//! and one `Transport`. Every operation is available in two layers:
//!
//! - `build_*` produces an `HttpRequest` and `parse_*` interprets an
//!   `HttpResponse`. Both are pure, so a caller can run the I/O itself.
//! - `health_check`, `get_page` and friends run the round-trip through the
//!   owned transport, retrying transport failures with exponential backoff.
//!
//! Only transport failures are retried. An HTTP response of any status is
//! final: a 4xx or 5xx is assumed to repeat if sent again unchanged.

use std::fmt;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::page_id::PageId;
use crate::types::{AppendResult, PageContent};

/// User-Agent sent with every request.
pub const USER_AGENT: &str = concat!("page-core/", env!("CARGO_PKG_VERSION"));

/// Body substituted when a response is not valid JSON.
pub const INVALID_JSON_ERROR: &str = "Invalid JSON response";

const PAGES_PREFIX: &str = "api/pages/";

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

/// Blocking client for the page API.
///
/// The client owns its transport, and with it the connection pool, for its
/// whole lifetime. Dropping the client (or calling [`PageClient::close`])
/// releases the pool on every exit path.
pub struct PageClient<T = UreqTransport> {
    base_url: String,
    api_key: String,
    max_retries: u32,
    transport: T,
    sleep: Sleeper,
}

impl PageClient<UreqTransport> {
    /// Build a client backed by a pooled `ureq` agent that applies
    /// `config.timeout` to each attempt.
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PageClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            max_retries: config.max_retries,
            transport,
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait between retries.
    pub fn with_sleeper<F>(mut self, sleep: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Release the client and its connection pool.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "closing page client");
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    /// Resolve `path` against the base URL and attach the default headers.
    ///
    /// The bearer token is added only when `requires_auth` is set and the
    /// path falls under `api/pages/`.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        requires_auth: bool,
    ) -> HttpRequest {
        let path = path.trim_start_matches('/');
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), USER_AGENT.to_string()),
        ];
        if requires_auth && requires_bearer(path) {
            headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key),
            ));
        }
        HttpRequest {
            method,
            url: format!("{}/{path}", self.base_url),
            headers,
            body: body.map(Value::to_string),
        }
    }

    pub fn build_health_check(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, "/health", None, false)
    }

    pub fn build_get_api_info(&self) -> HttpRequest {
        self.build_request(HttpMethod::Get, "/api", None, false)
    }

    pub fn build_get_page(&self, page_id: PageId) -> HttpRequest {
        self.build_request(HttpMethod::Get, &format!("/api/pages/{page_id}"), None, true)
    }

    pub fn build_append_to_page(&self, page_id: PageId, markdown: &str) -> HttpRequest {
        let body = json!({ "markdown": markdown });
        self.build_request(
            HttpMethod::Post,
            &format!("/api/pages/{page_id}/append"),
            Some(&body),
            true,
        )
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_get_page(&self, response: HttpResponse) -> Result<PageContent, ApiError> {
        let body = parse_json(&response)?;
        Ok(PageContent {
            markdown: string_field(&body, "markdown", response.status)?,
            title: string_field(&body, "title", response.status)?,
        })
    }

    pub fn parse_append_to_page(&self, response: HttpResponse) -> Result<AppendResult, ApiError> {
        let body = parse_json(&response)?;
        let success = body
            .get("success")
            .and_then(Value::as_bool)
            .ok_or_else(|| ApiError::missing_field("success", response.status))?;
        Ok(AppendResult { success })
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Send one request through the retry policy and decode the JSON body.
    pub fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
        requires_auth: bool,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, path, body, requires_auth);
        let response = self.send(&request)?;
        parse_json(&response)
    }

    #[tracing::instrument(skip(self))]
    pub fn health_check(&self) -> Result<Value, ApiError> {
        self.request(HttpMethod::Get, "/health", None, false)
    }

    #[tracing::instrument(skip(self))]
    pub fn get_api_info(&self) -> Result<Value, ApiError> {
        self.request(HttpMethod::Get, "/api", None, false)
    }

    /// Fetch a page as Markdown. `page_id` must be a hyphenated UUID; any
    /// other input fails before a request is sent.
    #[tracing::instrument(skip(self))]
    pub fn get_page(&self, page_id: &str) -> Result<PageContent, ClientError> {
        let page_id = PageId::parse(page_id)?;
        let response = self.send(&self.build_get_page(page_id))?;
        Ok(self.parse_get_page(response)?)
    }

    /// Append Markdown to the end of a page.
    #[tracing::instrument(skip(self, markdown), fields(markdown_len = markdown.len()))]
    pub fn append_to_page(&self, page_id: &str, markdown: &str) -> Result<AppendResult, ClientError> {
        let page_id = PageId::parse(page_id)?;
        let response = self.send(&self.build_append_to_page(page_id, markdown))?;
        Ok(self.parse_append_to_page(response)?)
    }

    /// Execute `request`, retrying transport failures up to `max_retries`
    /// times. Attempts run strictly one after another.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut attempt: u32 = 0;
        loop {
            debug!(
                method = request.method.as_str(),
                url = %request.url,
                attempt = attempt + 1,
                "sending request"
            );
            match self.transport.execute(request) {
                Ok(response) => {
                    debug!(status = response.status, "received response");
                    return Ok(response);
                }
                Err(err) if attempt >= self.max_retries => {
                    warn!(
                        url = %request.url,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up after transport failures"
                    );
                    return Err(ApiError::network(err));
                }
                Err(err) => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        url = %request.url,
                        attempt = attempt + 1,
                        error = %err,
                        delay_secs = delay.as_secs(),
                        "request failed, retrying"
                    );
                    (self.sleep)(delay);
                    attempt += 1;
                }
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PageClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("max_retries", &self.max_retries)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

/// `true` if requests to `path` carry the bearer token.
///
/// Only page routes are authenticated; health and info endpoints are public.
pub fn requires_bearer(path: &str) -> bool {
    path.trim_start_matches('/').starts_with(PAGES_PREFIX)
}

/// Wait before the retry that follows the failed attempt `attempt`
/// (0-indexed): 1s, 2s, 4s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Decode a response body and map non-2xx statuses to `ApiError`.
///
/// A body that is not JSON is replaced by `{"error": "Invalid JSON response"}`
/// rather than failing, so a 2xx with a garbled body still succeeds.
pub fn parse_json(response: &HttpResponse) -> Result<Value, ApiError> {
    let body: Value = serde_json::from_str(&response.body)
        .unwrap_or_else(|_| json!({ "error": INVALID_JSON_ERROR }));

    if !response.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", response.status));
        let details = body
            .get("details")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(ApiError::new(message, response.status, details));
    }

    Ok(body)
}

fn string_field(body: &Value, field: &str, status: u16) -> Result<String, ApiError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::missing_field(field, status))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::TransportError;

    const PAGE_ID: &str = "12345678-1234-1234-1234-123456789abc";

    /// Replays scripted outcomes and records every request it sees.
    #[derive(Default)]
    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn last(&self) -> HttpRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("connection refused".to_string())))
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    fn down() -> Result<HttpResponse, TransportError> {
        Err(TransportError("connection refused".to_string()))
    }

    fn client(
        max_retries: u32,
        outcomes: Vec<Result<HttpResponse, TransportError>>,
    ) -> (PageClient<ScriptedTransport>, Arc<Mutex<Vec<Duration>>>) {
        let config = ClientConfig::new("http://localhost:8000/", "secret").with_max_retries(max_retries);
        let slept = Arc::new(Mutex::new(Vec::new()));
        let recorder = slept.clone();
        let client = PageClient::with_transport(config, ScriptedTransport::new(outcomes))
            .with_sleeper(move |d| recorder.lock().unwrap().push(d));
        (client, slept)
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let (c, _) = client(0, vec![]);
        assert_eq!(c.base_url(), "http://localhost:8000");
        let req = c.build_request(HttpMethod::Get, &format!("api/pages/{PAGE_ID}"), None, true);
        assert_eq!(req.url, format!("http://localhost:8000/api/pages/{PAGE_ID}"));
    }

    #[test]
    fn default_headers_on_every_request() {
        let (c, _) = client(0, vec![]);
        let req = c.build_health_check();
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("user-agent"), Some(USER_AGENT));
    }

    #[test]
    fn bearer_only_on_page_routes() {
        assert!(requires_bearer("api/pages/abc"));
        assert!(requires_bearer("/api/pages/abc/append"));
        assert!(!requires_bearer("/api"));
        assert!(!requires_bearer("/health"));
        assert!(!requires_bearer("/api/pagesx"));

        let (c, _) = client(0, vec![]);
        assert!(c.build_health_check().header("authorization").is_none());
        assert!(c.build_get_api_info().header("authorization").is_none());
        let id = PageId::parse(PAGE_ID).unwrap();
        assert_eq!(c.build_get_page(id).header("authorization"), Some("Bearer secret"));
        assert_eq!(
            c.build_append_to_page(id, "# hi").header("authorization"),
            Some("Bearer secret")
        );
    }

    #[test]
    fn requires_auth_false_suppresses_bearer() {
        let (c, _) = client(0, vec![]);
        let req = c.build_request(HttpMethod::Get, "/api/pages/x", None, false);
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn append_request_shape() {
        let (c, _) = client(0, vec![]);
        let req = c.build_append_to_page(PageId::parse(PAGE_ID).unwrap(), "## Notes\n- item");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, format!("http://localhost:8000/api/pages/{PAGE_ID}/append"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "markdown": "## Notes\n- item" }));
    }

    #[test]
    fn invalid_page_id_makes_no_call() {
        let (c, _) = client(3, vec![]);
        for bad in ["", "invalid-page-id", "123456781234123412341234567890ab"] {
            let err = c.get_page(bad).unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)));
            let err = c.append_to_page(bad, "text").unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)));
        }
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn get_page_single_call_on_success() {
        let (c, slept) = client(3, vec![ok(200, r##"{"markdown":"# Hello","title":"Hello"}"##)]);
        let page = c.get_page(PAGE_ID).unwrap();
        assert_eq!(
            page,
            PageContent {
                markdown: "# Hello".to_string(),
                title: "Hello".to_string()
            }
        );
        assert_eq!(c.transport().calls(), 1);
        assert!(slept.lock().unwrap().is_empty());
        assert_eq!(c.transport().last().method, HttpMethod::Get);
    }

    #[test]
    fn transient_failures_back_off_exponentially() {
        let (c, slept) = client(
            3,
            vec![down(), down(), down(), ok(200, r#"{"success":true}"#)],
        );
        let result = c.append_to_page(PAGE_ID, "text").unwrap();
        assert!(result.success);
        assert_eq!(c.transport().calls(), 4);
        assert_eq!(
            *slept.lock().unwrap(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn persistent_failure_exhausts_budget() {
        let (c, slept) = client(2, vec![]);
        let err = c.health_check().unwrap_err();
        assert_eq!(err.status_code, 0);
        assert!(err.is_network());
        assert_eq!(err.message, "Network error: connection refused");
        assert_eq!(c.transport().calls(), 3);
        assert_eq!(slept.lock().unwrap().len(), 2);
    }

    #[test]
    fn zero_retries_means_one_attempt() {
        let (c, slept) = client(0, vec![]);
        let err = c.get_page(PAGE_ID).unwrap_err();
        assert_eq!(err.api().map(|e| e.status_code), Some(0));
        assert_eq!(c.transport().calls(), 1);
        assert!(slept.lock().unwrap().is_empty());
    }

    #[test]
    fn http_error_is_not_retried() {
        let (c, slept) = client(3, vec![ok(404, r#"{"error":"not found"}"#)]);
        let err = c.get_page(PAGE_ID).unwrap_err();
        let api = err.api().unwrap();
        assert_eq!(api.message, "not found");
        assert_eq!(api.status_code, 404);
        assert!(api.details.is_none());
        assert_eq!(c.transport().calls(), 1);
        assert!(slept.lock().unwrap().is_empty());
    }

    #[test]
    fn server_error_carries_details() {
        let (c, _) = client(
            3,
            vec![ok(
                500,
                r#"{"error":"Failed to get page","details":"upstream timeout"}"#,
            )],
        );
        let err = c.get_page(PAGE_ID).unwrap_err();
        let api = err.api().unwrap();
        assert_eq!(api.message, "Failed to get page");
        assert_eq!(api.status_code, 500);
        assert_eq!(api.details.as_deref(), Some("upstream timeout"));
        assert_eq!(c.transport().calls(), 1);
    }

    #[test]
    fn error_without_message_falls_back_to_status() {
        let (c, _) = client(0, vec![ok(503, r#"{"status":"down"}"#)]);
        let err = c.get_api_info().unwrap_err();
        assert_eq!(err.message, "HTTP 503");
        assert_eq!(err.status_code, 503);
    }

    #[test]
    fn invalid_json_error_body_uses_substitute_message() {
        let (c, _) = client(0, vec![ok(502, "<html>Bad Gateway</html>")]);
        let err = c.health_check().unwrap_err();
        assert_eq!(err.message, INVALID_JSON_ERROR);
        assert_eq!(err.status_code, 502);
    }

    #[test]
    fn invalid_json_success_body_is_substituted() {
        let (c, _) = client(0, vec![ok(200, "OK")]);
        let body = c.health_check().unwrap();
        assert_eq!(body, json!({ "error": INVALID_JSON_ERROR }));
    }

    #[test]
    fn missing_page_field_is_an_api_error() {
        let (c, _) = client(0, vec![ok(200, r##"{"markdown":"# Hi"}"##)]);
        let err = c.get_page(PAGE_ID).unwrap_err();
        let api = err.api().unwrap();
        assert_eq!(api.status_code, 200);
        assert_eq!(api.details.as_deref(), Some("title"));
    }

    #[test]
    fn missing_success_field_is_an_api_error() {
        let (c, _) = client(0, vec![ok(200, "{}")]);
        let err = c.append_to_page(PAGE_ID, "x").unwrap_err();
        assert_eq!(err.api().and_then(|e| e.details.as_deref()), Some("success"));
    }

    #[test]
    fn health_and_info_return_raw_body() {
        let (c, _) = client(
            0,
            vec![
                ok(200, r#"{"status":"ok"}"#),
                ok(200, r#"{"name":"notion-markdown-api","version":"1.0.0"}"#),
            ],
        );
        assert_eq!(c.health_check().unwrap()["status"], "ok");
        let info = c.get_api_info().unwrap();
        assert_eq!(info["name"], "notion-markdown-api");
        assert_eq!(info["version"], "1.0.0");
    }

    #[test]
    fn backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(5), Duration::from_secs(32));
        assert_eq!(backoff_delay(200), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = PageClient::new(ClientConfig::new("http://localhost:8000", "secret"));
        let rendered = format!("{c:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
