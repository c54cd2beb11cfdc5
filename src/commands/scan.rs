use anyhow::{Context, Result};
use clausewatch::classify::RiskClassifier;
use clausewatch::Config;
use std::path::Path;
use tokio::io::AsyncReadExt;

use super::report::print_analysis;

async fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .context("Failed to read text from stdin")?;
        return Ok(text);
    }
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn scan_text(config: &Config, input: &Path, json: bool) -> Result<()> {
    let classifier = RiskClassifier::from_config(&config.classifier)?;
    let text = read_input(input).await?;
    let result = classifier.analyze(&text);
    print_analysis(&result, json)
}
