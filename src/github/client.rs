use crate::model::{MetricsError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, RETRY_AFTER, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";
pub const API_VERSION: &str = "2022-11-28";

const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type PageProgress<'a> = Box<dyn FnMut(u64) + Send + 'a>;

/// Bounded retry with exponential backoff for transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// The closed set of response shapes the API produces. Each kind knows
/// where the record array lives inside a page body.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EndpointKind {
    OrgMetrics,
    UserMetrics,
    Seats,
}

impl EndpointKind {
    fn records(&self, body: Value) -> Vec<Value> {
        match self {
            EndpointKind::OrgMetrics | EndpointKind::UserMetrics => match body {
                Value::Array(records) => records,
                _ => vec![],
            },
            EndpointKind::Seats => body
                .get("seats")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// One API response page. Discarded after normalization.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub records: Vec<Value>,
    pub next: Option<String>,
}

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

// Create
impl GithubClient {
    pub fn new(base_url: impl ToString, token: &str) -> Result<Self> {
        Self::with_retry_policy(base_url, token, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        base_url: impl ToString,
        token: &str,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            MetricsError::configuration("the credential contains characters not valid in a header")
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_MEDIA_TYPE));
        headers.insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
        headers.insert(USER_AGENT, HeaderValue::from_static("copilot-usage-metrics"));
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
            retry,
        })
    }
}

// Fetch
impl GithubClient {
    /// Starts a cursor-ordered page sequence for `path`. The query is sent
    /// with the first request only; follow-up cursors carry their own.
    pub fn pages(
        &self,
        kind: EndpointKind,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Paginator<'_> {
        Paginator {
            client: self,
            kind,
            next: Some(format!("{}{}", self.base_url, path)),
            query: Some(query),
            page: 0,
        }
    }

    /// Drains a page sequence into a flat record list, reporting each page
    /// number through `progress` as it is requested.
    pub async fn fetch_all(
        &self,
        kind: EndpointKind,
        path: &str,
        query: Vec<(String, String)>,
        mut progress: PageProgress<'_>,
    ) -> Result<Vec<Value>> {
        let mut pages = self.pages(kind, path, query);
        let mut records = Vec::new();
        loop {
            progress(pages.page_number() + 1);
            match pages.next_page().await? {
                Some(page) => records.extend(page.records),
                None => break,
            }
        }
        Ok(records)
    }

    async fn get_with_retry(&self, url: &str, query: Option<&[(String, String)]>) -> Result<Response> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let mut request = self.http.get(url);
            if let Some(query) = query {
                request = request.query(query);
            }
            let outcome = request.send().await;
            attempt += 1;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if is_retryable_status(status) {
                        if attempt < max_attempts {
                            let fallback = self.retry.delay_for_attempt(attempt - 1);
                            tokio::time::sleep(retry_delay(response.headers(), fallback)).await;
                            continue;
                        }
                        return Err(MetricsError::TransientFetch {
                            status: status.as_u16(),
                            attempts: attempt,
                        });
                    }
                    return Err(classify_status(status, url, response).await);
                }
                Err(error) => {
                    // Timeouts and connection drops retry under the same
                    // bound as 429/5xx responses.
                    if is_retryable_error(&error) && attempt < max_attempts {
                        tokio::time::sleep(self.retry.delay_for_attempt(attempt - 1)).await;
                        continue;
                    }
                    return Err(error.into());
                }
            }
        }
    }
}

/// Cursor-driven page iterator. Pages are requested strictly in cursor
/// order; the sequence ends at the page lacking a `rel="next"` link and is
/// restartable only from the start.
pub struct Paginator<'a> {
    client: &'a GithubClient,
    kind: EndpointKind,
    next: Option<String>,
    query: Option<Vec<(String, String)>>,
    page: u64,
}

impl Paginator<'_> {
    pub fn page_number(&self) -> u64 {
        self.page
    }

    pub async fn next_page(&mut self) -> Result<Option<RawPage>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };
        let query = self.query.take();
        let response = self.client.get_with_retry(&url, query.as_deref()).await?;
        self.next = next_page_url(response.headers());
        self.page += 1;
        let body: Value = response.json().await?;
        Ok(Some(RawPage {
            records: self.kind.records(body),
            next: self.next.clone(),
        }))
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

fn retry_delay(headers: &HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

async fn classify_status(status: StatusCode, url: &str, response: Response) -> MetricsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MetricsError::Authorization {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => MetricsError::NotFound(format!(
            "`{url}` returned 404; the owner may not exist, or has no Copilot data for the period"
        )),
        _ => MetricsError::Request {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        },
    }
}

fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        if !params.split(';').any(|param| param.trim() == "rel=\"next\"") {
            return None;
        }
        let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
        Some(target.to_string())
    })
}
