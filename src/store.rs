//! Persistent analysis store
//!
//! Uses a sled embedded database. Records are keyed by the hex SHA-256 of the
//! normalized site URL and serialized with bincode; a secondary tree maps
//! each domain to the keys analyzed under it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::classify::AnalysisResult;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sled::Error),
    #[error("failed to encode record: {0}")]
    Encode(#[from] bincode::Error),
}

/// One stored analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAnalysis {
    /// Normalized URL the record is keyed by
    pub url: String,
    /// URL the gate resolved the input to
    pub final_url: String,
    pub url_hash: String,
    pub domain: String,
    /// SHA-256 of the classified text
    pub text_hash: String,
    pub text_length: usize,
    pub risk_categories: Vec<String>,
    pub safety_score: u8,
    pub safety_rating: String,
    pub recommendation: String,
    pub suspicious_clauses: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

/// Hex SHA-256 of a normalized URL, the record key
pub fn url_key(normalized_url: &str) -> String {
    hex::encode(Sha256::digest(normalized_url.as_bytes()))
}

pub fn text_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Host of `url` without a leading `www.`
fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

/// sled-backed analysis store
pub struct AnalysisStore {
    db: sled::Db,
    analyses: sled::Tree,
    by_domain: sled::Tree,
}

impl AnalysisStore {
    /// Open or create `<data_dir>/analyses.sled`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = data_dir.as_ref().join("analyses.sled");
        debug!("Opening analysis store at {:?}", db_path);
        let db = sled::open(&db_path)?;
        let analyses = db.open_tree("analyses")?;
        let by_domain = db.open_tree("by_domain")?;
        Ok(Self {
            db,
            analyses,
            by_domain,
        })
    }

    /// Record for a normalized URL, if one exists.
    ///
    /// Undecodable records are treated as absent.
    pub fn lookup(&self, normalized_url: &str) -> Result<Option<StoredAnalysis>, StoreError> {
        let key = url_key(normalized_url);
        let Some(data) = self.analyses.get(key.as_bytes())? else {
            return Ok(None);
        };
        match bincode::deserialize(&data) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Discarding unreadable record for {}: {}", normalized_url, e);
                Ok(None)
            }
        }
    }

    /// Insert or replace the record for `normalized_url`.
    pub fn upsert(
        &self,
        normalized_url: &str,
        final_url: &str,
        text: &str,
        result: &AnalysisResult,
    ) -> Result<StoredAnalysis, StoreError> {
        let key = url_key(normalized_url);
        let record = StoredAnalysis {
            url: normalized_url.to_string(),
            final_url: final_url.to_string(),
            url_hash: key.clone(),
            domain: domain_of(final_url),
            text_hash: text_hash(text),
            text_length: text.trim().chars().count(),
            risk_categories: result.categories(),
            safety_score: result.safety_score,
            safety_rating: result.safety_rating.clone(),
            recommendation: result.recommendation.clone(),
            suspicious_clauses: result.suspicious_clauses.clone(),
            analyzed_at: Utc::now(),
        };

        let data = bincode::serialize(&record)?;
        self.analyses.insert(key.as_bytes(), data)?;
        self.add_to_domain_index(&record.domain, &key);

        debug!("Stored analysis for {} ({})", normalized_url, record.safety_rating);
        Ok(record)
    }

    /// Append `key` to the domain's key list in one atomic update
    fn add_to_domain_index(&self, domain: &str, key: &str) {
        if domain.is_empty() {
            return;
        }
        let updated = self.by_domain.update_and_fetch(domain.as_bytes(), |old| {
            let mut keys: Vec<String> = old
                .and_then(|data| bincode::deserialize(data).ok())
                .unwrap_or_default();
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
            match bincode::serialize(&keys) {
                Ok(data) => Some(data),
                Err(_) => old.map(<[u8]>::to_vec),
            }
        });
        if let Err(e) = updated {
            warn!("Failed to update domain index for {}: {}", domain, e);
        }
    }

    /// Every record stored under `domain` (`www.` is ignored)
    pub fn for_domain(&self, domain: &str) -> Result<Vec<StoredAnalysis>, StoreError> {
        let domain = domain.trim_start_matches("www.").to_lowercase();
        let Some(data) = self.by_domain.get(domain.as_bytes())? else {
            return Ok(Vec::new());
        };
        let keys: Vec<String> = bincode::deserialize(&data)?;

        let mut records = Vec::new();
        for key in keys {
            if let Some(data) = self.analyses.get(key.as_bytes())? {
                match bincode::deserialize::<StoredAnalysis>(&data) {
                    Ok(record) => records.push(record),
                    Err(e) => warn!("Skipping unreadable record {}: {}", key, e),
                }
            }
        }
        records.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(records)
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
