//! Scheme handling and hostname syntax checks
//!
//! These run before any network access, so a malformed or non-web URL is
//! rejected without touching DNS or the TLD registry.

use thiserror::Error;

/// Hostname syntax failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostnameError {
    #[error("hostname is empty")]
    Empty,
    #[error("hostname exceeds 253 characters")]
    TooLong,
    #[error("label '{0}' exceeds 63 characters")]
    LabelTooLong(String),
    #[error("label '{0}' contains invalid characters")]
    InvalidLabel(String),
    #[error("label '{0}' is a single repeated character")]
    RepeatedLabel(String),
}

/// Prefix `https://` when the input carries no scheme of its own.
pub fn with_default_scheme(raw: &str) -> String {
    let trimmed = raw.trim();
    if scheme_of(trimmed).is_some() {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// The lowercased scheme of `url`, if it has a syntactically valid one
/// followed by `://`.
pub fn scheme_of(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once("://")?;
    let valid = scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then(|| scheme.to_ascii_lowercase())
}

/// Host portion of an absolute URL exactly as the user typed it.
///
/// Parsing with `url::Url` would already punycode the host, which hides
/// whether IDNA conversion was needed and whether it failed.
pub fn raw_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest
        .split(|c| matches!(c, '/' | '?' | '#'))
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();

    if let Some(bracketed) = host_port.strip_prefix('[') {
        // IPv6 literal, kept with its brackets stripped
        return bracketed.split(']').next();
    }

    match host_port.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => Some(host),
        _ => Some(host_port),
    }
}

/// Check hostname length and per-label syntax.
pub fn check_hostname(host: &str, reject_repeated_labels: bool) -> Result<(), HostnameError> {
    if host.is_empty() {
        return Err(HostnameError::Empty);
    }
    if host.len() > 253 {
        return Err(HostnameError::TooLong);
    }

    let labels: Vec<&str> = host.split('.').collect();

    for label in &labels {
        if label.len() > 63 {
            return Err(HostnameError::LabelTooLong(label.to_string()));
        }
    }

    for label in &labels {
        if !is_valid_label(label) {
            return Err(HostnameError::InvalidLabel(label.to_string()));
        }
    }

    if reject_repeated_labels {
        if let Some(label) = labels.iter().find(|l| is_repeated_char(l)) {
            return Err(HostnameError::RepeatedLabel(label.to_string()));
        }
    }

    Ok(())
}

/// `^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$`
fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= 63
        && first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
}

fn is_repeated_char(label: &str) -> bool {
    let mut chars = label.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    label.chars().count() >= 4 && chars.all(|c| c.eq_ignore_ascii_case(&first))
}

/// Rightmost label, the candidate top-level domain.
pub fn tld_label(host: &str) -> &str {
    host.rsplit('.').next().unwrap_or(host)
}
