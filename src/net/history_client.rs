//! HTTP access to the message history endpoint.
//!
//! `GET {base_url}/messages?with=<peer>&offset=<n>` with the session cookie.
//! The server returns a JSON array; an empty array (or `null`) means there is
//! nothing older.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::COOKIE;
use serde::Deserialize;

use crate::core::types::{Message, PeerId};

/// Name of the session cookie set by the server on login.
pub const SESSION_COOKIE: &str = "session_token";

/// A fetch that has not settled by then is reported as a network error, so
/// the paginator is never stuck waiting.
pub const DEFAULT_HISTORY_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from a history fetch.
/// None of them are fatal; the paginator releases its guard and waits for
/// the next scroll.
#[derive(Debug)]
pub enum HistoryFetchError {
    /// Connection refused, timeout, DNS.
    Network(String),
    /// Non-success HTTP status.
    Api { status: u16, message: String },
    /// Body was not the expected JSON array.
    Parse(String),
}

impl fmt::Display for HistoryFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryFetchError::Network(msg) => write!(f, "network error: {msg}"),
            HistoryFetchError::Api { status, message } => {
                write!(f, "history API error (HTTP {status}): {message}")
            }
            HistoryFetchError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for HistoryFetchError {}

/// Anything that can produce a page of older messages.
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn fetch_page(
        &self,
        peer: &PeerId,
        offset: usize,
    ) -> Result<Vec<Message>, HistoryFetchError>;
}

/// One element of the history response. `to` is usually omitted.
#[derive(Deserialize, Debug)]
struct HistoryEntry {
    from: PeerId,
    #[serde(default)]
    to: Option<PeerId>,
    content: String,
    #[serde(default)]
    sent_at: Option<String>,
}

/// Turn a raw response body into messages, filling `to` with the peer the
/// page was requested for.
pub fn parse_page(body: &str, peer: &PeerId) -> Result<Vec<Message>, HistoryFetchError> {
    let entries: Option<Vec<HistoryEntry>> =
        serde_json::from_str(body).map_err(|e| HistoryFetchError::Parse(e.to_string()))?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| Message {
            from: entry.from,
            to: entry.to.unwrap_or_else(|| peer.clone()),
            content: entry.content,
            sent_at: entry.sent_at,
        })
        .collect())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}")
}

pub struct HttpHistoryClient {
    base_url: String,
    session_token: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpHistoryClient {
    pub fn new(base_url: impl Into<String>, session_token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token,
            timeout: DEFAULT_HISTORY_TIMEOUT,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl HistorySource for HttpHistoryClient {
    async fn fetch_page(
        &self,
        peer: &PeerId,
        offset: usize,
    ) -> Result<Vec<Message>, HistoryFetchError> {
        let url = format!("{}/messages", self.base_url);
        debug!("GET {} with={} offset={}", url, peer, offset);

        let mut request = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .query(&[("with", peer.as_str()), ("offset", &offset.to_string())]);
        if let Some(token) = &self.session_token {
            request = request.header(COOKIE, session_cookie(token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| network_error(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HistoryFetchError::Api {
                status: status.as_u16(),
                message: message.trim().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| network_error(e, self.timeout))?;
        let page = parse_page(&body, peer)?;
        info!("Fetched {} history messages for {} at offset {}", page.len(), peer, offset);
        Ok(page)
    }
}

fn network_error(e: reqwest::Error, timeout: Duration) -> HistoryFetchError {
    if e.is_timeout() {
        HistoryFetchError::Network(format!("request timed out after {timeout:?}"))
    } else {
        HistoryFetchError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_fills_missing_to() {
        let peer = PeerId::new("w");
        let page = parse_page(r#"[{"from":"w","content":"hi"}]"#, &peer).unwrap();
        assert_eq!(page, vec![Message::new("w", "w", "hi")]);
    }

    #[test]
    fn test_parse_page_keeps_explicit_fields() {
        let peer = PeerId::new("w");
        let body = r#"[{"from":"me","to":"w","content":"yo","sent_at":"2024-05-01T10:00:00Z"}]"#;
        let page = parse_page(body, &peer).unwrap();
        assert_eq!(page[0].to, PeerId::new("w"));
        assert_eq!(page[0].sent_at.as_deref(), Some("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_parse_page_null_is_empty() {
        let page = parse_page("null", &PeerId::new("w")).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_parse_page_rejects_object() {
        let err = parse_page(r#"{"error":"nope"}"#, &PeerId::new("w")).unwrap_err();
        assert!(matches!(err, HistoryFetchError::Parse(_)));
    }

    #[test]
    fn test_error_display() {
        let e = HistoryFetchError::Api {
            status: 500,
            message: "Failed to fetch messages".into(),
        };
        assert_eq!(
            e.to_string(),
            "history API error (HTTP 500): Failed to fetch messages"
        );
    }
}
