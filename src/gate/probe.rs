//! HEAD reachability probe

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::fetch::browser_headers;

/// Probe failures
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid response status code: {0}")]
    Status(u16),
    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Confirms a validated URL answers and reports where it ends up
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<Url, ProbeError>;
}

/// Single HEAD request without following redirects
pub struct HeadProber {
    client: reqwest::Client,
}

impl HeadProber {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .default_headers(browser_headers())
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HeadProber {
    async fn probe(&self, url: &Url) -> Result<Url, ProbeError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|e| ProbeError::Connection(e.to_string()))?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok());

        final_url(url, response.status(), location, response.url())
    }
}

/// Where a HEAD response leaves the visitor.
///
/// Redirects resolve `Location` against the request URL (relative targets are
/// common); 2xx and location-less 3xx report the responder's URL.
pub fn final_url(
    request: &Url,
    status: StatusCode,
    location: Option<&str>,
    responder: &Url,
) -> Result<Url, ProbeError> {
    if status.is_redirection() {
        if let Some(target) = location.filter(|l| !l.trim().is_empty()) {
            return match request.join(target.trim()) {
                Ok(resolved) => Ok(resolved),
                Err(e) => {
                    tracing::warn!("Unusable redirect target '{}' from {}: {}", target, request, e);
                    Ok(responder.clone())
                }
            };
        }
        return Ok(responder.clone());
    }

    if status.as_u16() < 300 {
        return Ok(responder.clone());
    }

    Err(ProbeError::Status(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn relative_redirect_resolves_against_request() {
        let req = url("https://example.com/start");
        let out = final_url(&req, StatusCode::MOVED_PERMANENTLY, Some("/home"), &req).unwrap();
        assert_eq!(out.as_str(), "https://example.com/home");
    }

    #[test]
    fn absolute_redirect_is_reported_verbatim() {
        let req = url("http://example.com/");
        let out = final_url(
            &req,
            StatusCode::FOUND,
            Some("https://www.example.com/"),
            &req,
        )
        .unwrap();
        assert_eq!(out.as_str(), "https://www.example.com/");
    }

    #[test]
    fn success_reports_responder_url() {
        let req = url("https://example.com/");
        let responder = url("https://example.com/index");
        let out = final_url(&req, StatusCode::OK, None, &responder).unwrap();
        assert_eq!(out, responder);
    }

    #[test]
    fn redirect_without_location_reports_responder() {
        let req = url("https://example.com/");
        let out = final_url(&req, StatusCode::SEE_OTHER, None, &req).unwrap();
        assert_eq!(out, req);
    }

    #[test]
    fn client_and_server_errors_fail() {
        let req = url("https://example.com/");
        for status in [StatusCode::NOT_FOUND, StatusCode::FORBIDDEN, StatusCode::BAD_GATEWAY] {
            let err = final_url(&req, status, None, &req).unwrap_err();
            assert!(err.to_string().starts_with("Invalid response status code"));
        }
    }

    async fn serve_once(response: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        url(&format!("http://{}/", addr))
    }

    #[tokio::test]
    async fn head_probe_does_not_follow_redirects() {
        let target = serve_once(
            "HTTP/1.1 301 Moved Permanently\r\nLocation: /welcome\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let prober = HeadProber::new(Duration::from_secs(5), "test-agent").unwrap();
        let out = prober.probe(&target).await.unwrap();
        assert_eq!(out.path(), "/welcome");
        assert_eq!(out.host_str(), target.host_str());
    }

    #[tokio::test]
    async fn head_probe_reports_connection_failure() {
        let prober = HeadProber::new(Duration::from_secs(2), "test-agent").unwrap();
        let err = prober.probe(&url("http://127.0.0.1:9/")).await.unwrap_err();
        assert!(matches!(err, ProbeError::Connection(_)));
        assert!(err.to_string().starts_with("Connection failed:"));
    }
}
