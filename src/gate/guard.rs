//! Address policy for every host the crate connects to
//!
//! The gate checks the host a user typed. Redirect targets and candidate
//! links discovered later go through the same guard before they are fetched.

use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;
use url::{Host, Url};

use super::hostname::check_hostname;
use super::resolve::{is_disallowed, ResolveError, Resolver};

/// Reasons a destination is refused
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Unsupported scheme: {0}")]
    Scheme(String),
    #[error("Invalid hostname: {0}")]
    InvalidHost(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("No IP addresses found for hostname: {0}")]
    NoAddresses(String),
    #[error("Reserved/Loopback/private/multicast URL: {0}")]
    Disallowed(String),
}

impl GuardError {
    /// The destination is reachable but lies in refused address space
    pub fn is_security(&self) -> bool {
        matches!(self, GuardError::Disallowed(_))
    }
}

/// Resolves destinations and refuses internal address space
#[derive(Clone)]
pub struct AddressGuard {
    resolver: Arc<dyn Resolver>,
}

impl AddressGuard {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    /// Resolve a domain name and refuse it if any address is disallowed.
    pub async fn check_host(&self, host: &str) -> Result<Vec<IpAddr>, GuardError> {
        let addresses = self.resolver.resolve(host).await?;
        if addresses.is_empty() {
            return Err(GuardError::NoAddresses(host.to_string()));
        }
        if let Some(ip) = addresses.iter().find(|ip| is_disallowed(**ip)) {
            tracing::debug!("{} resolves to disallowed address {}", host, ip);
            return Err(GuardError::Disallowed(host.to_string()));
        }
        Ok(addresses)
    }

    /// Check a full destination URL: web scheme, host syntax and addresses.
    ///
    /// IP literals are judged directly; domains are resolved.
    pub async fn check_url(&self, url: &Url) -> Result<(), GuardError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(GuardError::Scheme(url.scheme().to_string()));
        }

        match url.host() {
            Some(Host::Ipv4(ip)) => check_literal(IpAddr::V4(ip)),
            Some(Host::Ipv6(ip)) => check_literal(IpAddr::V6(ip)),
            Some(Host::Domain(domain)) => {
                if check_hostname(domain, false).is_err() {
                    return Err(GuardError::InvalidHost(domain.to_string()));
                }
                self.check_host(domain).await.map(|_| ())
            }
            None => Err(GuardError::InvalidHost(url.to_string())),
        }
    }
}

fn check_literal(ip: IpAddr) -> Result<(), GuardError> {
    if is_disallowed(ip) {
        Err(GuardError::Disallowed(ip.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MapResolver {
        hosts: HashMap<String, Vec<IpAddr>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Resolver for MapResolver {
        async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.hosts.get(host).cloned().ok_or_else(|| ResolveError::NotFound {
                host: host.to_string(),
                reason: "NXDOMAIN".to_string(),
            })
        }
    }

    fn guard_with(entries: &[(&str, &str)]) -> (AddressGuard, Arc<MapResolver>) {
        let mut resolver = MapResolver::default();
        for (host, ip) in entries {
            resolver
                .hosts
                .entry(host.to_string())
                .or_default()
                .push(ip.parse().unwrap());
        }
        let resolver = Arc::new(resolver);
        (AddressGuard::new(resolver.clone()), resolver)
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn private_ip_literal_is_refused_without_dns() {
        let (guard, resolver) = guard_with(&[]);
        for target in ["http://10.0.0.1/terms", "http://127.0.0.1:8080/", "http://[::1]/"] {
            let err = guard.check_url(&url(target)).await.unwrap_err();
            assert!(err.is_security(), "{target}: {err}");
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn domain_resolving_inward_is_refused() {
        let (guard, _) = guard_with(&[("intranet.example.com", "192.168.1.20")]);
        let err = guard
            .check_url(&url("https://intranet.example.com/privacy"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Reserved/Loopback/private/multicast URL: intranet.example.com"
        );
    }

    #[tokio::test]
    async fn public_destinations_pass() {
        let (guard, _) = guard_with(&[("example.com", "93.184.216.34")]);
        guard.check_url(&url("https://example.com/terms")).await.unwrap();
        guard.check_url(&url("http://93.184.216.34/")).await.unwrap();
    }

    #[tokio::test]
    async fn non_web_scheme_and_bad_host_are_refused() {
        let (guard, _) = guard_with(&[]);
        let err = guard.check_url(&url("file:///etc/passwd")).await.unwrap_err();
        assert!(matches!(err, GuardError::Scheme(s) if s == "file"));

        let err = guard.check_url(&url("https://bad_host.com/")).await.unwrap_err();
        assert!(matches!(err, GuardError::InvalidHost(_)));
    }

    #[tokio::test]
    async fn unknown_domain_is_a_resolution_error() {
        let (guard, _) = guard_with(&[]);
        let err = guard.check_url(&url("https://missing.org/")).await.unwrap_err();
        assert!(matches!(err, GuardError::Resolve(_)));
        assert!(!err.is_security());
    }
}
