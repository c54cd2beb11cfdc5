use anyhow::{Context, Result};
use clausewatch::gate::{normalize_input, with_default_scheme};
use clausewatch::store::AnalysisStore;
use clausewatch::Config;
use url::Url;

use super::report::print_record;

pub fn show_history(config: &Config, url: &str, json: bool) -> Result<()> {
    let store = AnalysisStore::open(&config.store.data_dir).with_context(|| {
        format!(
            "Failed to open analysis store at {}",
            config.store.data_dir.display()
        )
    })?;

    if let Some(record) = store.lookup(&normalize_input(url))? {
        return print_record(&record, json);
    }

    // No record for this exact URL: show what is known about its domain
    let host = Url::parse(&with_default_scheme(url))
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));
    let records = match host {
        Some(host) => store.for_domain(&host)?,
        None => Vec::new(),
    };

    if records.is_empty() {
        println!("No stored analysis for {}", url);
        return Ok(());
    }
    for record in &records {
        print_record(record, json)?;
    }
    Ok(())
}
