//! URL validation and safety gate
//!
//! A user-supplied URL passes through a fixed sequence of checks before any
//! page is fetched. Each check is a hard gate: the first failure ends
//! validation with a message naming what went wrong.
//!
//! 1. Scheme (`https://` is assumed when missing; only http/https pass)
//! 2. IDNA transcoding of non-ASCII hostnames
//! 3. Hostname syntax
//! 4. Top-level domain against the IANA registry
//! 5. DNS resolution; any private, loopback, reserved or multicast address
//!    rejects the URL
//! 6. HEAD probe without following redirects; a redirect target passes
//!    the same address policy as the input host

mod guard;
mod hostname;
mod normalize;
mod probe;
mod resolve;
mod tld;

pub use guard::{AddressGuard, GuardError};
pub use hostname::{check_hostname, raw_host, scheme_of, tld_label, with_default_scheme, HostnameError};
pub use normalize::{normalize_input, normalize_url};
pub use probe::{final_url, HeadProber, ProbeError, Prober};
pub use resolve::{is_disallowed, ResolveError, Resolver, SystemResolver};
pub use tld::{StaticTlds, TldError, TldList, TldOrigin, TldRegistry, TldSource};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::GateConfig;

/// Why a URL was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRejection {
    /// Malformed or implausible input (scheme, hostname, TLD, IDNA)
    Input,
    /// Resolution, registry or probe failure
    Network,
    /// The host resolves into address space that must never be contacted
    SecurityPolicy,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateRejection::Input => "input",
            GateRejection::Network => "network",
            GateRejection::SecurityPolicy => "security policy",
        };
        f.write_str(s)
    }
}

/// Outcome of validating one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    /// Final URL when valid, otherwise the input as given
    pub url: String,
    pub message: String,
    /// Set exactly when `valid` is false
    pub rejection: Option<GateRejection>,
}

impl ValidationResult {
    pub fn accepted(url: &Url) -> Self {
        Self {
            valid: true,
            url: url.to_string(),
            message: "URL is valid".to_string(),
            rejection: None,
        }
    }

    pub fn rejected(raw: &str, kind: GateRejection, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            url: raw.to_string(),
            message: message.into(),
            rejection: Some(kind),
        }
    }

    pub fn is_security_rejection(&self) -> bool {
        self.rejection == Some(GateRejection::SecurityPolicy)
    }
}

struct Rejection {
    kind: GateRejection,
    message: String,
}

impl Rejection {
    fn input(message: impl Into<String>) -> Self {
        Self { kind: GateRejection::Input, message: message.into() }
    }

    fn network(message: impl Into<String>) -> Self {
        Self { kind: GateRejection::Network, message: message.into() }
    }

    fn security(message: impl Into<String>) -> Self {
        Self { kind: GateRejection::SecurityPolicy, message: message.into() }
    }
}

impl From<GuardError> for Rejection {
    fn from(e: GuardError) -> Self {
        match e {
            GuardError::Disallowed(_) => Rejection::security(e.to_string()),
            GuardError::Scheme(_) | GuardError::InvalidHost(_) => Rejection::input(e.to_string()),
            GuardError::Resolve(_) | GuardError::NoAddresses(_) => Rejection::network(e.to_string()),
        }
    }
}

/// Validates URLs against the gate sequence
#[derive(Clone)]
pub struct UrlValidator {
    tlds: Arc<dyn TldSource>,
    guard: AddressGuard,
    prober: Arc<dyn Prober>,
    reject_repeated_labels: bool,
}

impl UrlValidator {
    pub fn new(
        tlds: Arc<dyn TldSource>,
        resolver: Arc<dyn Resolver>,
        prober: Arc<dyn Prober>,
    ) -> Self {
        Self {
            tlds,
            guard: AddressGuard::new(resolver),
            prober,
            reject_repeated_labels: true,
        }
    }

    /// Build the production validator: IANA registry with disk cache, system
    /// resolver and HEAD prober.
    pub fn from_config(config: &GateConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let tlds = TldRegistry::new(
            config.tld_registry_url.clone(),
            config.tld_cache_path(),
            Duration::from_secs(config.tld_cache_max_age_secs),
            Duration::from_secs(config.tld_fetch_timeout_secs),
        )?;
        let resolver = SystemResolver::new(Duration::from_secs(config.dns_timeout_secs));
        let prober = HeadProber::new(Duration::from_secs(config.head_timeout_secs), user_agent)?;

        Ok(Self::new(Arc::new(tlds), Arc::new(resolver), Arc::new(prober))
            .with_repeated_label_check(config.reject_repeated_labels))
    }

    pub fn with_repeated_label_check(mut self, enabled: bool) -> Self {
        self.reject_repeated_labels = enabled;
        self
    }

    /// Address policy shared with everything fetched after validation
    pub fn guard(&self) -> AddressGuard {
        self.guard.clone()
    }

    /// Run every check in order and report the first failure.
    pub async fn validate(&self, raw: &str) -> ValidationResult {
        match self.check(raw).await {
            Ok(url) => {
                debug!("URL accepted: {} -> {}", raw, url);
                ValidationResult::accepted(&url)
            }
            Err(rejection) => {
                debug!("URL rejected ({}): {}: {}", rejection.kind, raw, rejection.message);
                ValidationResult::rejected(raw, rejection.kind, rejection.message)
            }
        }
    }

    async fn check(&self, raw: &str) -> Result<Url, Rejection> {
        let candidate = with_default_scheme(raw);

        match scheme_of(&candidate).as_deref() {
            Some("http") | Some("https") => {}
            _ => {
                return Err(Rejection::input(
                    "The given link doesn't have a valid scheme (http or https).",
                ))
            }
        }

        let host = raw_host(&candidate).unwrap_or_default();
        let host = if host.is_ascii() {
            host.to_ascii_lowercase()
        } else {
            idna::domain_to_ascii(host)
                .map_err(|_| Rejection::input(format!("Invalid Internationalized domain: {}", host)))?
        };

        if let Err(e) = check_hostname(&host, self.reject_repeated_labels) {
            debug!("Hostname '{}' failed syntax check: {}", host, e);
            return Err(Rejection::input("The hostname of the given url is invalid."));
        }

        let tlds = self
            .tlds
            .tld_list()
            .await
            .map_err(|e| Rejection::network(format!("Couldn't load TLDs: {}", e)))?;
        if !tlds.contains(tld_label(&host)) {
            return Err(Rejection::input("This url has an invalid hostname."));
        }

        let url = Url::parse(&candidate)
            .map_err(|e| Rejection::input(format!("The given url could not be parsed: {}", e)))?;

        // The checked host must be the one that will be contacted
        if url.host_str() != Some(host.as_str()) {
            debug!(
                "Host '{}' from the input differs from parsed host {:?}",
                host,
                url.host_str()
            );
            return Err(Rejection::input("The hostname of the given url is invalid."));
        }

        self.guard.check_host(&host).await?;

        let landed = self
            .prober
            .probe(&url)
            .await
            .map_err(|e| Rejection::network(e.to_string()))?;

        if landed.host() != url.host() || landed.scheme() != url.scheme() {
            debug!("{} redirects to {}, checking the new destination", url, landed);
            self.guard.check_url(&landed).await?;
        }
        Ok(landed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MapResolver {
        hosts: HashMap<String, Vec<IpAddr>>,
        calls: AtomicUsize,
    }

    impl MapResolver {
        fn with(mut self, host: &str, ips: &[&str]) -> Self {
            self.hosts
                .insert(host.to_string(), ips.iter().map(|ip| ip.parse().unwrap()).collect());
            self
        }
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

    struct EchoProber {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for EchoProber {
        async fn probe(&self, url: &Url) -> Result<Url, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(url.clone())
        }
    }

    struct FailingTlds;

    #[async_trait]
    impl TldSource for FailingTlds {
        async fn tld_list(&self) -> Result<Arc<TldList>, TldError> {
            Err(TldError::Unavailable("https://registry.invalid".to_string()))
        }
    }

    struct Harness {
        resolver: Arc<MapResolver>,
        prober: Arc<EchoProber>,
        validator: UrlValidator,
    }

    fn harness(resolver: MapResolver) -> Harness {
        let resolver = Arc::new(resolver);
        let prober = Arc::new(EchoProber { calls: AtomicUsize::new(0) });
        let tlds = StaticTlds::new(TldList::from_names(["COM", "ORG", "DE", "IO"]));
        let validator = UrlValidator::new(Arc::new(tlds), resolver.clone(), prober.clone());
        Harness { resolver, prober, validator }
    }

    #[tokio::test]
    async fn public_host_is_accepted() {
        let h = harness(MapResolver::default().with("example.com", &["93.184.216.34"]));
        let result = h.validator.validate("example.com").await;
        assert!(result.valid, "{}", result.message);
        assert_eq!(result.url, "https://example.com/");
        assert_eq!(result.rejection, None);
        assert_eq!(h.prober.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_web_scheme_is_rejected_without_network() {
        let h = harness(MapResolver::default());
        let result = h.validator.validate("ftp://example.com").await;
        assert!(!result.valid);
        assert_eq!(result.rejection, Some(GateRejection::Input));
        assert!(result.message.contains("valid scheme"));
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_hostname_and_unknown_tld_are_input_errors() {
        let h = harness(MapResolver::default());

        let result = h.validator.validate("https://bad_host.com").await;
        assert_eq!(result.message, "The hostname of the given url is invalid.");

        let result = h.validator.validate("https://aaaa.com").await;
        assert_eq!(result.rejection, Some(GateRejection::Input));

        let result = h.validator.validate("https://example.notatld").await;
        assert_eq!(result.message, "This url has an invalid hostname.");
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_label_check_can_be_disabled() {
        let h = harness(MapResolver::default().with("aaaa.com", &["93.184.216.34"]));
        let validator = h.validator.with_repeated_label_check(false);
        assert!(validator.validate("https://aaaa.com").await.valid);
    }

    #[tokio::test]
    async fn internationalized_hostname_is_transcoded() {
        let h = harness(MapResolver::default().with("xn--bcher-kva.de", &["93.184.216.34"]));
        let result = h.validator.validate("https://bücher.de/agb").await;
        assert!(result.valid, "{}", result.message);
        assert_eq!(result.url, "https://xn--bcher-kva.de/agb");
    }

    #[tokio::test]
    async fn any_private_address_is_a_security_rejection() {
        let h = harness(
            MapResolver::default().with("mixed.com", &["93.184.216.34", "10.0.0.5"]),
        );
        let result = h.validator.validate("https://mixed.com").await;
        assert!(!result.valid);
        assert!(result.is_security_rejection());
        assert_eq!(result.message, "Reserved/Loopback/private/multicast URL: mixed.com");
        assert_eq!(h.prober.calls.load(Ordering::SeqCst), 0);

        for ip in ["127.0.0.1", "192.168.0.10", "224.0.0.251", "::1"] {
            let h = harness(MapResolver::default().with("inner.io", &[ip]));
            let result = h.validator.validate("inner.io").await;
            assert!(result.is_security_rejection(), "{} should be refused", ip);
        }
    }

    #[tokio::test]
    async fn resolution_failures_are_network_errors() {
        let h = harness(MapResolver::default().with("empty.org", &[]));

        let result = h.validator.validate("https://missing.org").await;
        assert_eq!(result.rejection, Some(GateRejection::Network));
        assert!(result.message.starts_with("Hostname does not exist"));

        let result = h.validator.validate("https://empty.org").await;
        assert_eq!(result.message, "No IP addresses found for hostname: empty.org");
    }

    #[tokio::test]
    async fn missing_tld_data_fails_the_gate() {
        let validator = UrlValidator::new(
            Arc::new(FailingTlds),
            Arc::new(MapResolver::default()),
            Arc::new(EchoProber { calls: AtomicUsize::new(0) }),
        );
        let result = validator.validate("https://example.com").await;
        assert_eq!(result.rejection, Some(GateRejection::Network));
        assert!(result.message.starts_with("Couldn't load TLDs"));
    }

    /// Answers every probe with a redirect to a fixed target
    struct RedirectProber {
        target: Url,
    }

    #[async_trait]
    impl Prober for RedirectProber {
        async fn probe(&self, _url: &Url) -> Result<Url, ProbeError> {
            Ok(self.target.clone())
        }
    }

    fn redirecting(resolver: MapResolver, target: &str) -> UrlValidator {
        let tlds = StaticTlds::new(TldList::from_names(["COM", "ORG"]));
        let prober = RedirectProber { target: Url::parse(target).unwrap() };
        UrlValidator::new(Arc::new(tlds), Arc::new(resolver), Arc::new(prober))
    }

    #[tokio::test]
    async fn backslash_cannot_smuggle_a_different_host() {
        let h = harness(MapResolver::default().with("example.com", &["93.184.216.34"]));
        let result = h.validator.validate("https://127.0.0.1\\@example.com").await;
        assert!(!result.valid);
        assert_eq!(result.rejection, Some(GateRejection::Input));
        assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.prober.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn userinfo_does_not_change_the_checked_host() {
        let h = harness(MapResolver::default().with("example.com", &["93.184.216.34"]));
        let result = h.validator.validate("https://reader@example.com/terms").await;
        assert!(result.valid, "{}", result.message);
    }

    #[tokio::test]
    async fn redirect_into_private_space_is_a_security_rejection() {
        let validator = redirecting(
            MapResolver::default().with("example.com", &["93.184.216.34"]),
            "http://10.0.0.5:8080/admin",
        );
        let result = validator.validate("https://example.com").await;
        assert!(!result.valid);
        assert!(result.is_security_rejection());
        assert_eq!(result.message, "Reserved/Loopback/private/multicast URL: 10.0.0.5");
        assert_eq!(result.url, "https://example.com");
    }

    #[tokio::test]
    async fn redirect_to_a_host_resolving_inward_is_refused() {
        let validator = redirecting(
            MapResolver::default()
                .with("example.com", &["93.184.216.34"])
                .with("admin.example.org", &["172.16.0.2"]),
            "https://admin.example.org/",
        );
        let result = validator.validate("example.com").await;
        assert!(result.is_security_rejection(), "{}", result.message);
    }

    #[tokio::test]
    async fn redirect_to_a_public_host_is_accepted() {
        let validator = redirecting(
            MapResolver::default()
                .with("example.com", &["93.184.216.34"])
                .with("www.example.com", &["93.184.216.35"]),
            "https://www.example.com/",
        );
        let result = validator.validate("http://example.com").await;
        assert!(result.valid, "{}", result.message);
        assert_eq!(result.url, "https://www.example.com/");
    }

    #[tokio::test]
    async fn explicit_port_is_preserved() {
        let h = harness(MapResolver::default().with("example.com", &["93.184.216.34"]));
        let result = h.validator.validate("http://example.com:8080/terms").await;
        assert_eq!(result.url, "http://example.com:8080/terms");
    }
}
