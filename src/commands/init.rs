use anyhow::{Context, Result};
use clausewatch::config::{Config, DEFAULT_CONFIG_FILE};
use std::path::Path;
use tracing::info;

pub async fn init_config(path: &Path, force: bool) -> Result<()> {
    let config = Config::default();
    let config_path = path.join(DEFAULT_CONFIG_FILE);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let body = config.to_toml().context("Failed to render default configuration")?;
    let content = format!(
        "# clausewatch configuration\n\
         # Every key is optional; omitted keys take the values shown here.\n\n{}",
        body
    );

    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    tokio::fs::write(&config_path, content)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    info!("Wrote default configuration to {}", config_path.display());
    println!("Created {}", config_path.display());
    println!("TLD cache: {}", config.gate.tld_cache_path().display());
    println!("Analysis store: {}", config.store.data_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn written_config_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), false).await.unwrap();

        let loaded = Config::load(&tmp.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(loaded.locator.max_candidates, 8);
        assert_eq!(loaded.allowlist.domains.len(), 35);
    }

    #[tokio::test]
    async fn existing_file_needs_force() {
        let tmp = tempfile::tempdir().unwrap();
        init_config(tmp.path(), false).await.unwrap();
        assert!(init_config(tmp.path(), false).await.is_err());
        assert!(init_config(tmp.path(), true).await.is_ok());
    }
}
