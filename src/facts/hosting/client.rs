//! GitHub REST API client
//!
//! Thin wrapper over `reqwest` that classifies responses, extracts the quota
//! signal and next-page link of each response, and feeds the quota signal to
//! the [`RateGovernor`].

use super::rate_governor::RateGovernor;
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{EnrichableExt, IntoAppError, bail};
use regex::Regex;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use url::Url;

const LOG_TARGET: &str = "   hosting";
const USER_AGENT: &str = "repo-pulse";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RATE_LIMIT_WAIT_SECS: i64 = 3600;
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

static NEXT_LINK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="next""#).expect("invalid regex"));

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a hosting API call
#[derive(Debug)]
pub enum HostingApiResult<T> {
    /// Request succeeded - contains data and optional rate limit info
    Success(T, Option<RateLimitInfo>),

    /// Rate limited - should retry after reset time
    RateLimited(RateLimitInfo),

    /// The requested resource was not found (404)
    NotFound(Option<RateLimitInfo>),

    /// Request failed permanently - should NOT retry
    Failed(ohno::AppError, Option<RateLimitInfo>),
}

/// One decoded response body together with the link to the following page, if any.
#[derive(Debug)]
pub struct Page<T> {
    pub data: T,
    pub next: Option<String>,
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    governor: RateGovernor,
}

impl Client {
    /// Create a new client with optional authentication token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, governor: RateGovernor) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}")).into_app_err("invalid characters in API token")?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .into_app_err("creating HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            governor,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser address of the GitHub instance serving this API.
    ///
    /// `https://api.github.com` maps to `https://github.com`, and a GitHub Enterprise Server
    /// API at `https://ghe.example.com/api/v3` maps to `https://ghe.example.com`.
    #[must_use]
    pub fn web_url(&self) -> String {
        let Ok(mut url) = Url::parse(&self.base_url) else {
            return self.base_url.clone();
        };

        if let Some(host) = url.host_str().and_then(|h| h.strip_prefix("api.")).map(str::to_string) {
            let _ = url.set_host(Some(&host));
        }

        let path = url.path().trim_end_matches('/').trim_end_matches("/api/v3").to_string();
        url.set_path(&path);

        url.as_str().trim_end_matches('/').to_string()
    }

    /// Build an absolute API URL from a path below the base URL and a set of query parameters.
    pub fn url(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let raw = format!("{}{path}", self.base_url);
        let url = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        }
        .into_app_err_with(|| format!("invalid API URL '{raw}'"))?;

        Ok(url.into())
    }

    /// Make an API call and classify the result
    pub async fn api_call(&self, url: &str) -> HostingApiResult<reqwest::Response> {
        let resp = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return HostingApiResult::Failed(e.into(), None),
        };

        // Extract rate limit info from response headers before checking status
        let rate_limit = extract_rate_limit_from_headers(resp.headers());

        let status = resp.status();
        if status.is_success() {
            return HostingApiResult::Success(resp, rate_limit);
        }

        // 429 is always a rate limit; 403 only when the quota is spent, otherwise it is a permission problem
        let status_code = status.as_u16();
        let quota_spent = rate_limit.is_none_or(|rl| rl.remaining == 0);
        if status_code == 429 || (status_code == 403 && quota_spent) {
            let rate_limit = rate_limit.unwrap_or_else(|| RateLimitInfo {
                remaining: 0,
                reset_at: Utc::now() + chrono::Duration::seconds(MAX_RATE_LIMIT_WAIT_SECS),
            });
            return HostingApiResult::RateLimited(rate_limit);
        }

        if status_code == 404 {
            return HostingApiResult::NotFound(rate_limit);
        }

        match resp.error_for_status() {
            Ok(resp) => HostingApiResult::Failed(ohno::app_err!("unexpected HTTP status {} from '{}'", status, resp.url()), rate_limit),
            Err(e) => HostingApiResult::Failed(e.into(), rate_limit),
        }
    }

    /// Fetch and decode one JSON document.
    ///
    /// Returns `None` when the resource does not exist. Rate-limited responses are retried
    /// after the reported reset time, and the quota signal of every successful response is
    /// passed to the rate governor before returning.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<Page<T>>> {
        let mut retries = 0;

        loop {
            match self.api_call(url).await {
                HostingApiResult::Success(resp, rate_limit) => {
                    let next = next_page_link(resp.headers());
                    let data = resp
                        .json::<T>()
                        .await
                        .into_app_err_with(|| format!("decoding response from '{url}'"))?;

                    self.governor.observe(rate_limit).await;
                    return Ok(Some(Page { data, next }));
                }

                HostingApiResult::NotFound(rate_limit) => {
                    self.governor.observe(rate_limit).await;
                    return Ok(None);
                }

                HostingApiResult::Failed(e, rate_limit) => {
                    self.governor.observe(rate_limit).await;
                    return Err(e.enrich_with(|| format!("requesting '{url}'")));
                }

                HostingApiResult::RateLimited(rate_limit) => {
                    if retries >= MAX_RATE_LIMIT_RETRIES {
                        bail!("rate limit still exhausted after {MAX_RATE_LIMIT_RETRIES} retries for '{url}'");
                    }

                    retries += 1;
                    let wait = rate_limit_wait(rate_limit, Utc::now());
                    log::warn!(
                        target: LOG_TARGET,
                        "Hit API rate limit, waiting {}s until {} (retry {retries}/{MAX_RATE_LIMIT_RETRIES})",
                        wait.as_secs(),
                        rate_limit.reset_at.with_timezone(&chrono::Local).format("%T")
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// How long to wait for a spent quota to reset, never longer than an hour.
fn rate_limit_wait(rate_limit: RateLimitInfo, now: DateTime<Utc>) -> Duration {
    let wait_until = rate_limit.reset_at.min(now + chrono::Duration::seconds(MAX_RATE_LIMIT_WAIT_SECS));
    (wait_until - now).to_std().unwrap_or(Duration::ZERO)
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

/// Extract the `rel="next"` target from a `Link` header
fn next_page_link(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    NEXT_LINK_REGEX
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
