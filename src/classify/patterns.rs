//! Risk pattern table

use regex::{Regex, RegexBuilder};

/// Built-in categories and expressions, in priority order
pub const DEFAULT_PATTERN_TABLE: &[(&str, &str)] = &[
    (
        "data_collection",
        r"(collect|store|process|gather|track).*(personal|data|information)",
    ),
    (
        "third_party_sharing",
        r"(share|disclose|transfer|provide|sell).*(third.?part|partner|affiliate|advertiser)",
    ),
    (
        "liability_disclaimer",
        r"\b(not|disclaim\w*|exclud\w*|limit\w*)\b.*\b(liab\w*|responsib\w*|warrant\w*|damages)",
    ),
    (
        "unilateral_changes",
        r"(change|modify|update|amend|revise)\w*.*(any\s+time|without\s+(prior\s+)?notice|sole\s+discretion)",
    ),
    (
        "broad_permissions",
        r"(perpetual|irrevocable|unlimited|worldwide|royalty.?free).*(right|licen[cs]e|permission|access)",
    ),
    (
        "content_licensing",
        r"(grant|licen[cs]e|assign)\w*.*(content|upload|submi|post|material)",
    ),
    (
        "account_termination",
        r"(terminat|suspend|disabl|delet)\w*.*(account|access|service)",
    ),
    (
        "arbitration_waiver",
        r"binding\s+arbitration|arbitrat\w*.*(waive|class\s+action|jury)|waive\w*.*(class\s+action|jury|arbitrat)",
    ),
    (
        "tracking_technologies",
        r"(cookie|beacon|pixel|fingerprint)\w*.*(track|advertis|analytic|profil)",
    ),
    (
        "data_retention",
        r"(retain|keep|preserve)\w*.*(indefinite|as\s+long\s+as|after\s+(you|your)|even\s+after)",
    ),
];

/// A named, case-insensitive clause pattern
#[derive(Debug, Clone)]
pub struct RiskPattern {
    category: String,
    regex: Regex,
}

impl RiskPattern {
    pub fn new(category: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            category: category.into(),
            regex,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn is_match(&self, sentence: &str) -> bool {
        self.regex.is_match(sentence)
    }
}

/// The built-in table, compiled
pub fn default_patterns() -> Vec<RiskPattern> {
    DEFAULT_PATTERN_TABLE
        .iter()
        .filter_map(|(category, pattern)| match RiskPattern::new(*category, pattern) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::error!("Built-in pattern '{}' failed to compile: {}", category, e);
                None
            }
        })
        .collect()
}
