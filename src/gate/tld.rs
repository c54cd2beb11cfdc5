//! Top-level domain reference list
//!
//! The list comes from the IANA registry and is cached on disk. Sources are
//! tried in order until one produces a list:
//! - a cache file younger than the freshness window
//! - the remote registry (refreshing the cache on success)
//! - a stale cache file

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Errors while loading the TLD list
#[derive(Debug, Error)]
pub enum TldError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{0} returned an empty list")]
    Empty(String),
    #[error("TLD cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLD cache is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Couldn't load TLDs from {0} and no cached copy exists")]
    Unavailable(String),
}

/// Set of known top-level domains, stored uppercase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TldList {
    names: HashSet<String>,
}

impl TldList {
    /// Build from any collection of names; case is normalized.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_ascii_uppercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Parse the registry's plaintext format: one name per line, `#` comments.
    pub fn parse_registry(text: &str) -> Self {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn contains(&self, label: &str) -> bool {
        self.names.contains(&label.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in sorted order, as written to the cache file
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().cloned().collect();
        names.sort();
        names
    }
}

/// Provides the TLD list to the URL gate
#[async_trait]
pub trait TldSource: Send + Sync {
    async fn tld_list(&self) -> Result<Arc<TldList>, TldError>;
}

/// Fixed in-memory list
#[derive(Debug, Clone)]
pub struct StaticTlds(Arc<TldList>);

impl StaticTlds {
    pub fn new(list: TldList) -> Self {
        Self(Arc::new(list))
    }
}

#[async_trait]
impl TldSource for StaticTlds {
    async fn tld_list(&self) -> Result<Arc<TldList>, TldError> {
        Ok(self.0.clone())
    }
}

/// Where a TLD list can come from, in fallback order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TldOrigin {
    FreshCache,
    Registry,
    StaleCache,
}

/// Registry-backed list with an on-disk cache, loaded once per process
pub struct TldRegistry {
    registry_url: String,
    cache_path: PathBuf,
    max_age: Duration,
    client: reqwest::Client,
    origins: Vec<TldOrigin>,
    loaded: RwLock<Option<Arc<TldList>>>,
}

impl TldRegistry {
    pub fn new(
        registry_url: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        max_age: Duration,
        fetch_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .user_agent(crate::config::DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            registry_url: registry_url.into(),
            cache_path: cache_path.into(),
            max_age,
            client,
            origins: vec![TldOrigin::FreshCache, TldOrigin::Registry, TldOrigin::StaleCache],
            loaded: RwLock::new(None),
        })
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Walk the origins in order; first list wins.
    async fn load(&self) -> Result<TldList, TldError> {
        for origin in &self.origins {
            match self.load_from(*origin).await {
                Ok(Some(list)) => {
                    info!("Loaded {} TLDs from {:?}", list.len(), origin);
                    return Ok(list);
                }
                Ok(None) => debug!("TLD origin {:?} has nothing to offer", origin),
                Err(e) => warn!("TLD origin {:?} failed: {}", origin, e),
            }
        }
        Err(TldError::Unavailable(self.registry_url.clone()))
    }

    async fn load_from(&self, origin: TldOrigin) -> Result<Option<TldList>, TldError> {
        match origin {
            TldOrigin::FreshCache => match self.cache_age().await? {
                Some(age) if age < self.max_age => self.read_cache().await,
                _ => Ok(None),
            },
            TldOrigin::Registry => {
                let list = self.fetch_registry().await?;
                if let Err(e) = self.write_cache(&list).await {
                    warn!("Could not write TLD cache {}: {}", self.cache_path.display(), e);
                }
                Ok(Some(list))
            }
            TldOrigin::StaleCache => self.read_cache().await,
        }
    }

    async fn fetch_registry(&self) -> Result<TldList, TldError> {
        let response = self
            .client
            .get(&self.registry_url)
            .send()
            .await
            .map_err(|source| TldError::Fetch {
                url: self.registry_url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TldError::Status {
                url: self.registry_url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| TldError::Fetch {
            url: self.registry_url.clone(),
            source,
        })?;

        let list = TldList::parse_registry(&body);
        if list.is_empty() {
            return Err(TldError::Empty(self.registry_url.clone()));
        }
        Ok(list)
    }

    async fn cache_age(&self) -> Result<Option<Duration>, TldError> {
        match tokio::fs::metadata(&self.cache_path).await {
            Ok(meta) => {
                let modified = meta.modified()?;
                Ok(Some(
                    SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or_default(),
                ))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_cache(&self) -> Result<Option<TldList>, TldError> {
        let data = match tokio::fs::read(&self.cache_path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let names: Vec<String> = serde_json::from_slice(&data)?;
        let list = TldList::from_names(names);
        Ok((!list.is_empty()).then_some(list))
    }

    /// Write atomically through a temp file so concurrent readers never see
    /// a partial list.
    async fn write_cache(&self, list: &TldList) -> Result<(), TldError> {
        if let Some(parent) = self.cache_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let encoded = serde_json::to_vec(&list.sorted_names())?;

        let temp_path = self.cache_path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(&encoded).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_path, &self.cache_path).await?;
        Ok(())
    }
}

#[async_trait]
impl TldSource for TldRegistry {
    async fn tld_list(&self) -> Result<Arc<TldList>, TldError> {
        if let Some(list) = self.loaded.read().await.as_ref() {
            return Ok(list.clone());
        }

        let mut slot = self.loaded.write().await;
        if let Some(list) = slot.as_ref() {
            return Ok(list.clone());
        }
        let list = Arc::new(self.load().await?);
        *slot = Some(list.clone());
        Ok(list)
    }
}
