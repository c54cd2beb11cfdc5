//! Plain HTTP strategy

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use super::{browser_headers, FetchError, FetchResult, FetchStrategy, FetchedPage};
use crate::config::FetchConfig;
use crate::gate::AddressGuard;

/// GET with browser-like headers, following redirects hop by hop
pub struct HttpStrategy {
    client: reqwest::Client,
    max_content_size: usize,
    max_redirects: usize,
    guard: Option<AddressGuard>,
}

impl HttpStrategy {
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(Policy::none())
            .user_agent(&config.user_agent)
            .default_headers(browser_headers())
            .build()?;

        Ok(Self {
            client,
            max_content_size: config.max_content_size,
            max_redirects: config.max_redirects,
            guard: None,
        })
    }

    /// Check every redirect target against `guard` before following it
    pub fn with_guard(mut self, guard: AddressGuard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// GET `url`, following redirects until a non-redirect response.
    async fn send_following(
        &self,
        url: &Url,
        timeout: Duration,
        start: Instant,
    ) -> Result<reqwest::Response, FetchError> {
        let mut current = url.clone();
        let mut hops = 0;

        loop {
            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(FetchError::Timeout(timeout));
            }
            let response = self
                .client
                .get(current.as_str())
                .timeout(remaining)
                .send()
                .await
                .map_err(|e| timed_out(e, timeout))?;

            let status = response.status();
            if !status.is_redirection() {
                return Ok(response);
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty());
            let Some(location) = location else {
                return Ok(response);
            };

            if hops >= self.max_redirects {
                return Err(FetchError::TooManyRedirects(url.to_string()));
            }
            let next = current.join(&location).map_err(|_| FetchError::Status {
                status: status.as_u16(),
                url: current.to_string(),
            })?;

            if let Some(guard) = &self.guard {
                guard.check_url(&next).await.map_err(|e| FetchError::Refused {
                    url: next.to_string(),
                    reason: e.to_string(),
                })?;
            }

            debug!("{} redirects to {}", current, next);
            hops += 1;
            current = next;
        }
    }
}

fn timed_out(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Http(e)
    }
}

/// Charset parameter of a `Content-Type` value, lowercased
fn declared_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
    })
}

/// Servers that declare nothing, or ISO-8859-1 by default, usually serve UTF-8.
fn assume_utf8(charset: Option<&str>) -> bool {
    matches!(
        charset,
        None | Some("iso-8859-1") | Some("latin1") | Some("latin-1")
    )
}

#[async_trait]
impl FetchStrategy for HttpStrategy {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_html(&self, url: &Url, timeout: Duration) -> FetchResult {
        let start = Instant::now();
        let response = self.send_following(url, timeout, start).await?;

        let status = response.status();
        let final_url = response.url().clone();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_content_size {
                return Err(FetchError::ContentTooLarge(len as usize));
            }
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(declared_charset);

        let html = if assume_utf8(charset.as_deref()) {
            let bytes = response.bytes().await.map_err(|e| timed_out(e, timeout))?;
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            response.text().await.map_err(|e| timed_out(e, timeout))?
        };

        if html.len() > self.max_content_size {
            return Err(FetchError::ContentTooLarge(html.len()));
        }

        Ok(FetchedPage {
            final_url,
            html,
            strategy: self.name(),
            fetch_duration: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(head: &'static str, body: &'static [u8]) -> Url {
        serve(head.to_string(), body.to_vec()).await
    }

    async fn serve(head: String, body: Vec<u8>) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let header = format!(
                    "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    head,
                    body.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body).await;
            }
        });
        Url::parse(&format!("http://{}/terms", addr)).unwrap()
    }

    async fn serve_redirect(location: &str) -> Url {
        serve(
            format!("HTTP/1.1 302 Found\r\nLocation: {}", location),
            Vec::new(),
        )
        .await
    }

    struct NoDns;

    #[async_trait]
    impl crate::gate::Resolver for NoDns {
        async fn resolve(
            &self,
            host: &str,
        ) -> Result<Vec<std::net::IpAddr>, crate::gate::ResolveError> {
            Err(crate::gate::ResolveError::NotFound {
                host: host.to_string(),
                reason: "NXDOMAIN".to_string(),
            })
        }
    }

    fn strategy() -> HttpStrategy {
        HttpStrategy::from_config(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn charset_parameter_parsing() {
        assert_eq!(declared_charset("text/html; charset=UTF-8").as_deref(), Some("utf-8"));
        assert_eq!(
            declared_charset("text/html;charset=\"ISO-8859-1\"").as_deref(),
            Some("iso-8859-1")
        );
        assert_eq!(declared_charset("text/html"), None);
        assert!(assume_utf8(None));
        assert!(assume_utf8(Some("iso-8859-1")));
        assert!(!assume_utf8(Some("windows-1252")));
    }

    #[tokio::test]
    async fn misdeclared_latin1_is_read_as_utf8() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=ISO-8859-1",
            "<p>Café terms</p>".as_bytes(),
        )
        .await;
        let page = strategy().fetch_html(&url, Duration::from_secs(5)).await.unwrap();
        assert!(page.html.contains("Café"));
        assert_eq!(page.strategy, "http");
    }

    #[tokio::test]
    async fn declared_charset_is_honoured() {
        // "Caf\xe9" in windows-1252
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=windows-1252",
            b"<p>Caf\xe9</p>",
        )
        .await;
        let page = strategy().fetch_html(&url, Duration::from_secs(5)).await.unwrap();
        assert!(page.html.contains("Café"));
    }

    #[tokio::test]
    async fn error_status_is_a_fetch_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Type: text/html", b"missing").await;
        let err = strategy().fetch_html(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn oversized_response_is_refused() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Type: text/html", b"0123456789abcdef").await;
        let config = FetchConfig {
            max_content_size: 8,
            ..FetchConfig::default()
        };
        let strategy = HttpStrategy::from_config(&config).unwrap();
        let err = strategy.fetch_html(&url, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, FetchError::ContentTooLarge(16)));
    }

    #[tokio::test]
    async fn redirects_are_followed_to_the_final_page() {
        let page = serve_once("HTTP/1.1 200 OK\r\nContent-Type: text/html", b"<p>Terms</p>").await;
        let start = serve_redirect(page.as_str()).await;

        let fetched = strategy().fetch_html(&start, Duration::from_secs(5)).await.unwrap();
        assert_eq!(fetched.final_url, page);
        assert!(fetched.html.contains("Terms"));
    }

    #[tokio::test]
    async fn redirect_into_private_space_is_refused() {
        let start = serve_redirect("http://10.0.0.1/terms").await;
        let strategy = strategy().with_guard(AddressGuard::new(std::sync::Arc::new(NoDns)));

        let err = strategy.fetch_html(&start, Duration::from_secs(5)).await.unwrap_err();
        match err {
            FetchError::Refused { url, reason } => {
                assert_eq!(url, "http://10.0.0.1/terms");
                assert_eq!(reason, "Reserved/Loopback/private/multicast URL: 10.0.0.1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn redirect_limit_is_enforced() {
        let start = serve_redirect("/elsewhere").await;
        let config = FetchConfig {
            max_redirects: 0,
            ..FetchConfig::default()
        };
        let strategy = HttpStrategy::from_config(&config).unwrap();
        let err = strategy.fetch_html(&start, Duration::from_secs(5)).await.unwrap_err();
        assert!(matches!(err, FetchError::TooManyRedirects(_)));
    }
}
