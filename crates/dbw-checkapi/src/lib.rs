//! Remote status API adapter (reqwest).
//!
//! `GET {base}?domains=a.com,b.com` answers with a JSON object keyed by domain:
//! `{"a.com":{"blocked":false},"b.com":{"blocked":true}}`. Extra fields in the
//! per-domain objects are ignored.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use dbw_core::{checker::StatusApi, domain::DomainStatus, errors::Error, Result};

#[derive(Debug, Deserialize)]
struct StatusEntry {
    blocked: bool,
}

/// Parse a status API payload. Anything but an object of `{ "blocked": bool }`
/// entries is a `ResponseParse` error.
pub fn parse_status_response(body: &str) -> Result<Vec<DomainStatus>> {
    let entries: BTreeMap<String, StatusEntry> = serde_json::from_str(body).map_err(|e| {
        Error::ResponseParse(format!(
            "{e} (body: {})",
            body.chars().take(120).collect::<String>()
        ))
    })?;

    Ok(entries
        .into_iter()
        .map(|(domain, entry)| DomainStatus::new(domain, entry.blocked))
        .collect())
}

/// The request for one batch: a single `domains` parameter carrying the
/// comma-joined names, appended to whatever query `base` already has.
pub fn batch_url(base: &reqwest::Url, domains: &[String]) -> reqwest::Url {
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("domains", &domains.join(","));
    url
}

/// Map an HTTP answer to statuses. Any non-2xx status is a `RemoteCall`
/// failure regardless of the body.
pub fn read_response(status: reqwest::StatusCode, body: &str) -> Result<Vec<DomainStatus>> {
    if !status.is_success() {
        return Err(Error::RemoteCall(format!(
            "status API answered {status}: {}",
            body.chars().take(200).collect::<String>()
        )));
    }
    parse_status_response(body)
}

#[derive(Clone, Debug)]
pub struct HttpStatusApi {
    base_url: reqwest::Url,
    http: reqwest::Client,
}

impl HttpStatusApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid CHECK_API_URL {base_url:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dbw/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self { base_url, http })
    }
}

#[async_trait]
impl StatusApi for HttpStatusApi {
    async fn check(&self, domains: &[String]) -> Result<Vec<DomainStatus>> {
        let resp = self
            .http
            .get(batch_url(&self.base_url, domains))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::RemoteCall("request timed out".to_string())
                } else {
                    Error::RemoteCall(format!("request error: {e}"))
                }
            })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::RemoteCall(format!("unreadable response body: {e}")))?;

        let statuses = read_response(status, &body)?;
        tracing::debug!(
            requested = domains.len(),
            answered = statuses.len(),
            "status API batch answered"
        );
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blocked_flags() {
        let body = r#"{"b.com":{"blocked":true},"a.com":{"blocked":false}}"#;
        let statuses = parse_status_response(body).unwrap();
        assert_eq!(
            statuses,
            vec![
                DomainStatus::new("a.com", false),
                DomainStatus::new("b.com", true),
            ]
        );
    }

    #[test]
    fn ignores_extra_fields() {
        let body = r#"{"a.com":{"blocked":true,"checked_at":"2026-01-01","source":"kominfo"}}"#;
        let statuses = parse_status_response(body).unwrap();
        assert_eq!(statuses, vec![DomainStatus::new("a.com", true)]);
    }

    #[test]
    fn empty_object_is_an_empty_answer() {
        assert!(parse_status_response("{}").unwrap().is_empty());
    }

    #[test]
    fn malformed_payloads_are_parse_errors() {
        for body in [
            "",
            "<html>502 Bad Gateway</html>",
            "[]",
            r#"{"a.com":true}"#,
            r#"{"a.com":{"status":"ok"}}"#,
            r#"{"a.com":{"blocked":"yes"}}"#,
        ] {
            let err = parse_status_response(body).unwrap_err();
            assert!(matches!(err, Error::ResponseParse(_)), "body {body:?}");
        }
    }

    #[test]
    fn batch_url_carries_one_comma_joined_parameter() {
        let base = reqwest::Url::parse("https://check.skiddle.id/").unwrap();
        let url = batch_url(&base, &["a.com".to_string(), "b.com".to_string()]);
        assert_eq!(url.as_str(), "https://check.skiddle.id/?domains=a.com%2Cb.com");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("domains".to_string(), "a.com,b.com".to_string())]);
    }

    #[test]
    fn batch_url_keeps_existing_query() {
        let base = reqwest::Url::parse("http://127.0.0.1:8080/check?key=k").unwrap();
        let url = batch_url(&base, &["a.com".to_string()]);
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/check?key=k&domains=a.com");
    }

    #[test]
    fn non_success_status_is_a_remote_call_failure() {
        let body = r#"{"a.com":{"blocked":true}}"#;
        for status in [
            reqwest::StatusCode::BAD_GATEWAY,
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            reqwest::StatusCode::NOT_FOUND,
        ] {
            let err = read_response(status, body).unwrap_err();
            assert!(matches!(err, Error::RemoteCall(_)), "status {status}");
        }
        assert_eq!(
            read_response(reqwest::StatusCode::OK, body).unwrap(),
            vec![DomainStatus::new("a.com", true)]
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpStatusApi::new("not a url", Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    /// Accept one connection, answer it with `status_line` and `body`, and
    /// return the request head that was received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let task = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            let _ = sock.shutdown().await;
            String::from_utf8_lossy(&head).into_owned()
        });
        (url, task)
    }

    #[tokio::test]
    async fn batch_is_sent_as_a_single_get() {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"a.com":{"blocked":false},"b.com":{"blocked":true}}"#,
        )
        .await;
        let api = HttpStatusApi::new(&url, Duration::from_secs(5)).unwrap();

        let statuses = api
            .check(&["b.com".to_string(), "a.com".to_string()])
            .await
            .unwrap();
        assert_eq!(
            statuses,
            vec![
                DomainStatus::new("a.com", false),
                DomainStatus::new("b.com", true),
            ]
        );

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap_or_default();
        assert_eq!(request_line, "GET /?domains=b.com%2Ca.com HTTP/1.1");
    }

    #[tokio::test]
    async fn server_error_maps_to_remote_call() {
        let (url, server) = serve_once("502 Bad Gateway", "<html>upstream down</html>").await;
        let api = HttpStatusApi::new(&url, Duration::from_secs(5)).unwrap();

        let err = api.check(&["a.com".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::RemoteCall(ref m) if m.contains("502")), "{err}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_a_remote_call_failure() {
        // Bind and release a port so nothing is listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpStatusApi::new(&format!("http://{addr}/"), Duration::from_secs(2)).unwrap();
        let err = api.check(&["a.com".to_string()]).await.unwrap_err();
        assert!(matches!(err, Error::RemoteCall(_)));
    }
}
