use anyhow::Result;
use clausewatch::{Config, SitePipeline};
use tracing::info;

use super::report::print_report;

pub async fn check_sites(config: &Config, urls: &[String], json: bool) -> Result<()> {
    let pipeline = SitePipeline::from_config(config)?;

    let mut failures = 0;
    for url in urls {
        info!("Analyzing website: {}", url);
        let report = pipeline.analyze_site(url).await;
        if report.is_failure() {
            failures += 1;
        }
        print_report(&report, json)?;
    }
    pipeline.flush();

    if failures > 0 {
        anyhow::bail!("{} of {} site(s) could not be analyzed", failures, urls.len());
    }
    Ok(())
}
