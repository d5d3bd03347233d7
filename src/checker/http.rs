// src/checker/http.rs
// =============================================================================
// The production liveness prober: one HEAD request per URL over HTTP(S).
//
// Key behaviour:
// - follows redirects (up to 10) and reports the final status code
// - sends an identifying user agent
// - never fails: any transport problem (timeout, DNS, refused connection,
//   TLS, redirect loop) is reported as code 0, with the reason logged
//
// The client is built once and shared by all workers (reqwest pools
// connections internally, cloning it is cheap).
// =============================================================================

use super::scheduler::Prober;
use crate::ledger::UNREACHABLE_CODE;
use async_trait::async_trait;
use reqwest::{redirect, Client, ClientBuilder};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 10;

/// Why a probe produced no status code. Only used for logging; the ledger
/// records all of these as code 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Timeout,
    TooManyRedirects,
    DnsError,
    ConnectFailed,
    SslError,
    InvalidUrl,
    Other,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::Timeout => "request timed out",
            FailureReason::TooManyRedirects => "too many redirects",
            FailureReason::DnsError => "could not resolve hostname",
            FailureReason::ConnectFailed => "connection failed",
            FailureReason::SslError => "tls error",
            FailureReason::InvalidUrl => "invalid url",
            FailureReason::Other => "request failed",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::from_builder(Client::builder())
    }

    fn from_builder(builder: ClientBuilder) -> Result<Self, reqwest::Error> {
        let client = builder
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HttpProber { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> i32 {
        // HEAD: we only want the status line, never the body
        match self.client.head(url).timeout(timeout).send().await {
            // redirects are already followed, so this is the final status
            Ok(response) => i32::from(response.status().as_u16()),
            Err(error) => {
                let reason = categorize_error(&error);
                debug!(%url, %reason, %error, "probe failed");
                UNREACHABLE_CODE
            }
        }
    }
}

// reqwest does not expose DNS or TLS failures as separate kinds, so those
// two are recognised from the error text.
fn categorize_error(error: &reqwest::Error) -> FailureReason {
    let text = format!("{:?}", error).to_lowercase();

    if error.is_timeout() {
        FailureReason::Timeout
    } else if error.is_redirect() {
        FailureReason::TooManyRedirects
    } else if error.is_builder() {
        FailureReason::InvalidUrl
    } else if error.is_connect() {
        if text.contains("dns") || text.contains("resolve") {
            FailureReason::DnsError
        } else if text.contains("certificate") || text.contains("tls") || text.contains("ssl") {
            FailureReason::SslError
        } else {
            FailureReason::ConnectFailed
        }
    } else if text.contains("certificate") || text.contains("ssl") {
        FailureReason::SslError
    } else {
        FailureReason::Other
    }
}
